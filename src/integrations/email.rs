use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::EmailConfig,
    domain::PurchaseRecord,
    error::{AppError, Result},
    integrations::{BaseIntegration, Integration, IntegrationEvent},
};

/// Fixed payload handed to the mailer for each completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseNotification {
    pub to: String,
    pub donor_name: String,
    pub amount: String,
    pub currency: String,
    pub transaction_id: Option<String>,
}

impl PurchaseNotification {
    pub fn from_record(record: &PurchaseRecord) -> Self {
        Self {
            to: record.donor_email.clone(),
            donor_name: record.donor_name.clone(),
            amount: record.display_amount(),
            currency: record.currency.clone(),
            transaction_id: record.transaction_id.clone(),
        }
    }

    pub fn subject(&self) -> String {
        "Your Genius Recovery Kit order".to_string()
    }

    pub fn body(&self) -> String {
        let reference = self
            .transaction_id
            .as_deref()
            .map(|id| format!("Transaction reference: {}\n", id))
            .unwrap_or_default();

        format!(
            "Hi {},\n\n\
             Thank you for your purchase. We received your payment of {} {}.\n\
             {}\n\
             Your kit will ship shortly.\n",
            self.donor_name, self.amount, self.currency, reference
        )
    }
}

pub struct EmailIntegration {
    base: BaseIntegration,
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailIntegration {
    pub fn new(config: Option<EmailConfig>) -> Result<Option<Self>> {
        let Some(cfg) = config.filter(|cfg| cfg.enabled) else {
            return Ok(None);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
            .map_err(|e| AppError::Integration(format!("SMTP relay {}: {}", cfg.smtp_host, e)))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(
                cfg.smtp_username.clone(),
                cfg.smtp_password.clone(),
            ))
            .build();

        Ok(Some(Self {
            base: BaseIntegration::new("Email", cfg.enabled),
            config: cfg,
            transport,
        }))
    }

    fn mailbox(address: &str) -> Result<Mailbox> {
        address
            .parse()
            .map_err(|e| AppError::Integration(format!("Invalid address {}: {}", address, e)))
    }

    fn build_message(&self, to: &str, notification: &PurchaseNotification) -> Result<Message> {
        Message::builder()
            .from(Self::mailbox(&self.config.from_address)?)
            .to(Self::mailbox(to)?)
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body())
            .map_err(|e| AppError::Integration(format!("Failed to build email: {}", e)))
    }

    async fn send(&self, to: &str, notification: &PurchaseNotification) -> Result<()> {
        let message = self.build_message(to, notification)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Integration(format!("SMTP send failed: {}", e)))?;
        tracing::info!("Sent purchase receipt to {}", to);
        Ok(())
    }
}

#[async_trait]
impl Integration for EmailIntegration {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    async fn health_check(&self) -> Result<()> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::Integration("SMTP server refused connection".to_string())),
            Err(e) => Err(AppError::Integration(format!("SMTP unreachable: {}", e))),
        }
    }

    async fn handle_event(&self, event: &IntegrationEvent) -> Result<()> {
        match event {
            IntegrationEvent::PurchaseCompleted(record) => {
                let notification = PurchaseNotification::from_record(record);
                self.send(&notification.to, &notification).await?;

                if let Some(staff) = self.config.staff_address.as_deref() {
                    self.send(staff, &notification).await?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PurchaseStatus, RecordMetadata};
    use uuid::Uuid;

    #[test]
    fn test_notification_payload() {
        let now = chrono::Utc::now();
        let record = PurchaseRecord {
            id: Uuid::new_v4(),
            transaction_id: Some("T1".to_string()),
            donor_email: "a@b.com".to_string(),
            donor_name: "Ada Lovelace".to_string(),
            amount_cents: 10050,
            currency: "USD".to_string(),
            status: PurchaseStatus::Completed,
            metadata: RecordMetadata {
                purchase_type: "recovery_kit".to_string(),
                source: "relay".to_string(),
                gateway_response_code: Some("1".to_string()),
                order_id: None,
                created_at: now,
            },
            created_at: now,
        };

        let notification = PurchaseNotification::from_record(&record);
        assert_eq!(notification.to, "a@b.com");
        assert_eq!(notification.amount, "100.50");
        assert!(notification.body().contains("Hi Ada Lovelace"));
        assert!(notification.body().contains("Transaction reference: T1"));
    }

    #[test]
    fn test_disabled_config_registers_nothing() {
        let config = EmailConfig {
            enabled: false,
            smtp_host: "smtp.example.org".to_string(),
            smtp_port: 587,
            smtp_username: "user".to_string(),
            smtp_password: "pass".to_string(),
            from_address: "kits@example.org".to_string(),
            staff_address: None,
        };
        assert!(EmailIntegration::new(Some(config)).unwrap().is_none());
        assert!(EmailIntegration::new(None).unwrap().is_none());
    }
}
