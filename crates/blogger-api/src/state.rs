use std::sync::Arc;

use blogger_db::Database;

use crate::config::AppConfig;
use crate::tokens::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: AppConfig,
}

impl AppStateInner {
    pub fn new(db: Database, config: AppConfig) -> AppState {
        Arc::new(Self { db, config })
    }

    pub fn tokens(&self) -> TokenService<'_> {
        TokenService::new(&self.db, &self.config)
    }
}
