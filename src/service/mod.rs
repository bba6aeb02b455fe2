pub mod recorder;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::integrations::IntegrationManager;

pub use recorder::{PurchaseRecorder, RecordOutcome, RecordRequest};

pub struct ServiceContext {
    pub recorder: Arc<PurchaseRecorder>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        purchase_repo: Arc<dyn PurchaseRepository>,
        integration_manager: Arc<IntegrationManager>,
        db_pool: SqlitePool,
    ) -> Self {
        let recorder = Arc::new(PurchaseRecorder::new(purchase_repo, integration_manager));

        Self {
            recorder,
            db_pool,
        }
    }
}
