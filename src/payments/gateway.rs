use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

use crate::{
    config::GatewayConfig,
    error::{AppError, Result},
};

const SECURITY_KEY_FIELD: &str = "security_key";

/// Upstream card processor. Takes the browser's form-encoded fields and
/// returns the raw reply text.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn submit(&self, fields: &str) -> Result<String>;
}

pub struct HttpGateway {
    client: Client,
    endpoint_url: String,
    security_key: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let security_key = config
            .security_key()
            .ok_or_else(|| AppError::Configuration("gateway.security_key is not set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
            security_key,
        })
    }
}

/// The submitted fields, byte for byte, followed by the server-held key. A
/// browser-supplied `security_key` pair is dropped so the key is never
/// overridden by the client.
pub fn with_security_key(fields: &str, security_key: &str) -> String {
    let key_pair = format!("{}={}", SECURITY_KEY_FIELD, urlencoding::encode(security_key));
    let mut payload: Vec<&str> = fields
        .trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(SECURITY_KEY_FIELD))
        .collect();
    payload.push(&key_pair);
    payload.join("&")
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn submit(&self, fields: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(with_security_key(fields, &self.security_key))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::External("Gateway request timed out".to_string())
                } else {
                    AppError::External(format!("Gateway request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::External(format!("Gateway response unreadable: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("Gateway answered HTTP {}", status);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_forwarded_verbatim_with_key() {
        let fields = "type=sale&ccnumber=4111111111111111&email=a%40b.com";
        assert_eq!(
            with_security_key(fields, "s3cr3t"),
            "type=sale&ccnumber=4111111111111111&email=a%40b.com&security_key=s3cr3t"
        );
    }

    #[test]
    fn test_client_cannot_override_key() {
        let fields = "security_key=evil&amount=100";
        assert_eq!(with_security_key(fields, "real key"), "amount=100&security_key=real%20key");
    }

    #[test]
    fn test_empty_submission() {
        assert_eq!(with_security_key("", "k"), "security_key=k");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = HttpGateway::new(&GatewayConfig::default()).err();
        assert!(matches!(err, Some(AppError::Configuration(_))));
    }
}
