use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::domain::PurchaseRecord;
use crate::error::Result;

pub mod email;

#[derive(Debug, Clone)]
pub enum IntegrationEvent {
    PurchaseCompleted(PurchaseRecord),
}

#[async_trait]
pub trait Integration: Send + Sync {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn health_check(&self) -> Result<()>;
    async fn handle_event(&self, event: &IntegrationEvent) -> Result<()>;
}

pub struct IntegrationManager {
    integrations: RwLock<Vec<Arc<dyn Integration>>>,
}

impl Default for IntegrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrationManager {
    pub fn new() -> Self {
        Self {
            integrations: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, integration: Arc<dyn Integration>) {
        if integration.is_enabled() {
            tracing::info!("Registered integration: {}", integration.name());
            self.integrations.write().await.push(integration);
        }
    }

    pub async fn handle_event(&self, event: IntegrationEvent) {
        let integrations = self.integrations.read().await;

        for integration in integrations.iter() {
            if !integration.is_enabled() {
                continue;
            }

            match integration.handle_event(&event).await {
                Ok(_) => {
                    tracing::debug!(
                        "Integration {} handled event successfully",
                        integration.name()
                    );
                }
                Err(e) => {
                    // Not retried; one failing integration must not stop the others
                    tracing::error!(
                        "Integration {} failed to handle event: {:?}",
                        integration.name(),
                        e
                    );
                }
            }
        }
    }

    /// Fire-and-forget dispatch on a background task.
    pub fn notify(self: &Arc<Self>, event: IntegrationEvent) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager.handle_event(event).await;
        });
    }

    pub async fn health_check_all(&self) -> Vec<(String, Result<()>)> {
        let integrations = self.integrations.read().await;
        let mut results = Vec::new();

        for integration in integrations.iter() {
            let name = integration.name().to_string();
            let result = integration.health_check().await;
            results.push((name, result));
        }

        results
    }
}

// Base implementation for common integration functionality
pub struct BaseIntegration {
    pub name: String,
    pub enabled: bool,
}

impl BaseIntegration {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PurchaseStatus, RecordMetadata};
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingIntegration {
        base: BaseIntegration,
        handled: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Integration for CountingIntegration {
        fn name(&self) -> &str {
            &self.base.name
        }

        fn is_enabled(&self) -> bool {
            self.base.enabled
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }

        async fn handle_event(&self, _event: &IntegrationEvent) -> Result<()> {
            self.handled.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Integration("smtp down".to_string()));
            }
            Ok(())
        }
    }

    fn counting(name: &str, enabled: bool, fail: bool) -> Arc<CountingIntegration> {
        Arc::new(CountingIntegration {
            base: BaseIntegration::new(name, enabled),
            handled: AtomicUsize::new(0),
            fail,
        })
    }

    fn event() -> IntegrationEvent {
        let now = chrono::Utc::now();
        IntegrationEvent::PurchaseCompleted(PurchaseRecord {
            id: Uuid::new_v4(),
            transaction_id: Some("T1".to_string()),
            donor_email: "a@b.com".to_string(),
            donor_name: "A B".to_string(),
            amount_cents: 10000,
            currency: "USD".to_string(),
            status: PurchaseStatus::Completed,
            metadata: RecordMetadata {
                purchase_type: "recovery_kit".to_string(),
                source: "callback".to_string(),
                gateway_response_code: Some("1".to_string()),
                order_id: None,
                created_at: now,
            },
            created_at: now,
        })
    }

    #[tokio::test]
    async fn test_failing_integration_does_not_block_others() {
        let manager = IntegrationManager::new();
        let failing = counting("failing", true, true);
        let healthy = counting("healthy", true, false);
        let disabled = counting("disabled", false, false);

        manager.register(failing.clone()).await;
        manager.register(healthy.clone()).await;
        manager.register(disabled.clone()).await;

        manager.handle_event(event()).await;

        assert_eq!(failing.handled.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.handled.load(Ordering::SeqCst), 1);
        assert_eq!(disabled.handled.load(Ordering::SeqCst), 0);
        assert_eq!(manager.health_check_all().await.len(), 2);
    }
}
