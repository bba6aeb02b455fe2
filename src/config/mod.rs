use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub integrations: IntegrationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of this service. Used for the form's submit target and as the
    /// redirect base when a request carries neither `Referer` nor `Origin`.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub security_key: Option<String>,
    pub endpoint_url: String,
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// The configured key, treating an empty string as absent.
    pub fn security_key(&self) -> Option<&str> {
        self.security_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            security_key: None,
            endpoint_url: "https://secure.nmi.com/api/transact.php".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutConfig {
    pub product_name: String,
    pub purchase_type: String,
    pub redirect_type: String,
    pub success_path: String,
    pub failure_path: String,
    pub error_poll_interval_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            product_name: "Genius Recovery Kit".to_string(),
            purchase_type: "recovery_kit".to_string(),
            redirect_type: "kit".to_string(),
            success_path: "/payment-success".to_string(),
            failure_path: "/payment-failed".to_string(),
            error_poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IntegrationConfig {
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    /// Optional staff mailbox that receives a copy of every receipt.
    pub staff_address: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let checkout = CheckoutConfig::default();
        let gateway = GatewayConfig::default();

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://kit_checkout.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("gateway.endpoint_url", gateway.endpoint_url)?
            .set_default("gateway.timeout_secs", gateway.timeout_secs)?
            .set_default("checkout.product_name", checkout.product_name)?
            .set_default("checkout.purchase_type", checkout.purchase_type)?
            .set_default("checkout.redirect_type", checkout.redirect_type)?
            .set_default("checkout.success_path", checkout.success_path)?
            .set_default("checkout.failure_path", checkout.failure_path)?
            .set_default("checkout.error_poll_interval_ms", checkout.error_poll_interval_ms)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Environment variables, e.g. KIT_CHECKOUT__GATEWAY__SECURITY_KEY
            .add_source(Environment::with_prefix("KIT_CHECKOUT").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://kit_checkout.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            gateway: GatewayConfig::default(),
            checkout: CheckoutConfig::default(),
            integrations: IntegrationConfig { email: None },
        }
    }
}
