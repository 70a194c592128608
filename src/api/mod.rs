use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, PasteService, TokenService};
use crate::state::SharedState;

pub mod auth;
mod error;
mod observability;
mod pastes;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.shared.tokens
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn paste_service(&self) -> &Arc<dyn PasteService> {
        &self.shared.paste_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config().server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/paste", post(pastes::create_paste))
        .route(
            "/paste/{id}",
            get(pastes::get_paste)
                .put(pastes::update_paste)
                .delete(pastes::delete_paste),
        )
        .route("/paste/{id}/raw", get(pastes::get_raw_paste))
        .route("/paste/{id}/fork", post(pastes::fork_paste))
        .route("/pastes/recent", get(pastes::recent_pastes))
        .route("/user/{username}", get(users::get_profile))
        .route("/dashboard", get(users::get_dashboard))
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics));

    Router::new()
        .nest("/api", api_router)
        .route("/{id}/raw", get(pastes::get_raw_paste))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state)
}
