use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::SessionKeys;
use crate::config::AppConfig;
use crate::gateway::MissionGateway;
use crate::handlers;
use crate::identity::{OAuthTokenIssuer, SessionIdentity, TokenCache, TokenIssuer};
use crate::middleware::session_middleware;

/// Everything the request handlers share
pub struct AppState {
    pub gateway: MissionGateway,
    pub sessions: SessionKeys,
    pub cache: TokenCache,
    pub issuer: Arc<dyn TokenIssuer>,
    pub enable_cors: bool,
}

impl AppState {
    /// Wire the production identity provider client from configuration
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let issuer: Arc<dyn TokenIssuer> = Arc::new(OAuthTokenIssuer::new(&config.identity)?);
        Self::with_issuer(config, issuer)
    }

    /// Same wiring with a caller-supplied token issuer
    pub fn with_issuer(config: &AppConfig, issuer: Arc<dyn TokenIssuer>) -> anyhow::Result<Self> {
        let sessions = SessionKeys::new(&config.session);
        let cache = TokenCache::with_ttl(chrono::Duration::seconds(sessions.ttl_seconds()));
        let identity = Arc::new(SessionIdentity::new(cache.clone(), issuer.clone()));
        let gateway = MissionGateway::new(&config.upstream, identity)?;

        Ok(Self {
            gateway,
            sessions,
            cache,
            issuer,
            enable_cors: config.server.enable_cors,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(handlers::home::index))
        .route("/health", get(handlers::home::health))
        // Sign-in round trip
        .merge(auth_routes())
        // Missions (redirect to login when no session or token)
        .merge(mission_routes())
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let router = if state.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn auth_routes() -> Router<Arc<AppState>> {
    use handlers::auth;

    Router::new()
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
}

fn mission_routes() -> Router<Arc<AppState>> {
    use handlers::missions;

    Router::new()
        .route("/missions", get(missions::list))
        .route("/missions/:missionid", get(missions::show))
}
