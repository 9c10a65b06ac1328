use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::notify::BillNotifier;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn BillNotifier>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: AppConfig, notifier: Arc<dyn BillNotifier>) -> Self {
        Self { db_pool, config: Arc::new(config), notifier }
    }
}
