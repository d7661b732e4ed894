use std::sync::Arc;

use crate::{
    auth::{jwt::TokenService, password, repo::UserRepo},
    categories::repo::CategoryRepo,
    clock::{Clock, SystemClock},
    config::AppConfig,
    db::{self, PgStore},
    memory::MemoryStore,
    transactions::repo::TransactionRepo,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserRepo>,
    pub categories: Arc<dyn CategoryRepo>,
    pub transactions: Arc<dyn TransactionRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        password::warm_up()?;
        let pool = db::connect(&config).await?;
        let store = Arc::new(PgStore::new(pool));
        Ok(Self::from_parts(config, Arc::new(SystemClock), store))
    }

    /// Wires every repository to the same backing store.
    pub fn from_parts<S>(config: Arc<AppConfig>, clock: Arc<dyn Clock>, store: Arc<S>) -> Self
    where
        S: UserRepo + CategoryRepo + TransactionRepo + 'static,
    {
        let tokens = Arc::new(TokenService::new(&config.jwt, clock.clone()));
        Self {
            config,
            clock,
            tokens,
            users: store.clone(),
            categories: store.clone(),
            transactions: store,
        }
    }

    /// Fresh in-memory state with the test configuration and the system clock.
    pub fn in_memory() -> Self {
        Self::in_memory_with(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn in_memory_with(store: Arc<MemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(Arc::new(AppConfig::for_tests()), clock, store)
    }
}
