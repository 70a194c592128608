use std::sync::Arc;

use chrono::Duration;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, Clock, DefaultPasteService, PasteService, SeaOrmAuthService, SystemClock,
    TokenService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub auth_service: Arc<dyn AuthService>,

    pub paste_service: Arc<dyn PasteService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Builds the state around a caller-supplied clock; tests pass a
    /// `ManualClock` to simulate the passage of time.
    pub async fn with_clock(config: Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenService::new(
            config.auth.jwt_secret.as_bytes(),
            Duration::days(config.auth.token_ttl_days),
            clock.clone(),
        ));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            &config.auth,
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let paste_service = Arc::new(DefaultPasteService::new(
            Arc::new(store.clone()),
            clock,
        )) as Arc<dyn PasteService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            paste_service,
        })
    }
}
