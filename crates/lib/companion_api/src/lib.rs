//! # companion_api
//!
//! HTTP API library for Companion: health, login and chat routes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use companion_core::auth::CredentialTable;
use companion_core::config::ConfigError;
use companion_core::llm;
use companion_core::persona;
use companion_core::session::{InMemorySessionStore, SessionStore};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ApiConfig;
use crate::handlers::{auth, chat, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Static credential table.
    pub credentials: Arc<CredentialTable>,
    /// Token → conversation store.
    pub sessions: Arc<dyn SessionStore>,
    /// False when the server runs without a provider key.
    pub provider_configured: bool,
}

impl AppState {
    pub fn new(
        credentials: CredentialTable,
        sessions: Arc<dyn SessionStore>,
        provider_configured: bool,
    ) -> Self {
        Self {
            credentials: Arc::new(credentials),
            sessions,
            provider_configured,
        }
    }

    /// Build the full state from configuration.
    ///
    /// A missing provider key is not an error (degraded mode). When an idle
    /// TTL is configured the session sweep is spawned, so this must run
    /// inside a tokio runtime.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ConfigError> {
        let credentials = match config.users.as_deref() {
            Some(users) => CredentialTable::parse(users)?,
            None => CredentialTable::default(),
        };
        let persona = persona::load(config.persona_file.as_deref())?;
        let provider = llm::build_provider(&config.llm)?;
        let provider_configured = provider.is_configured();

        let mut store = InMemorySessionStore::new(provider, &persona, &config.llm.model);
        if let Some(ttl) = config.session_idle_ttl {
            store = store.with_idle_ttl(ttl);
        }
        let store = Arc::new(store);
        if store.spawn_cleanup_task().is_some() {
            info!(ttl_secs = config.session_idle_ttl.map(|t| t.as_secs()), "session idle expiry enabled");
        }

        info!(
            users = credentials.len(),
            model = %config.llm.model,
            provider_configured,
            "application state ready"
        );

        Ok(Self::new(credentials, store, provider_configured))
    }
}

/// Routes relative to a mount point, without state.
fn api_routes() -> Router<AppState> {
    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler));

    // Protected routes (require bearer token)
    let protected = Router::new()
        .route(routes::POST_CHAT, post(chat::chat_handler))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth));

    public.merge(protected)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = api_routes();

    Router::new()
        .merge(api.clone())
        .nest(routes::API_PREFIX, api)
        .layer(cors)
        .with_state(state)
}
