// gateway/mod.rs - Mission data gateway
//
// Resolves a resource-scoped token for the caller (or says where to send them
// to get one), then reads missions from the upstream list with that token.
// One upstream request per call, bounded by a timeout, never retried.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

use crate::config::{ConfigError, UpstreamConfig};
use crate::identity::{AccessToken, IdentityAccessor, RequestContext, TokenState};
use crate::models::Mission;

pub mod error;
pub mod mapper;
pub mod query;

pub use error::GatewayError;
pub use mapper::{map_record, parse_id, MappingError, RemoteMissionRecord};
pub use query::UpstreamQuery;

pub const LOGIN_PATH: &str = "/login";

/// Instruction to send the caller elsewhere instead of answering directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDirective {
    location: String,
}

impl RedirectDirective {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// `/login?redir=<path>`
    pub fn login(redir: &str) -> Self {
        Self::to(format!("{}?redir={}", LOGIN_PATH, urlencoding::encode(redir)))
    }

    /// `/login?redir=<path>&resourceId=<resource>`, asking for consent to one resource
    pub fn login_for_resource(redir: &str, resource_id: &str) -> Self {
        Self::to(format!(
            "{}?redir={}&resourceId={}",
            LOGIN_PATH,
            urlencoding::encode(redir),
            urlencoding::encode(resource_id)
        ))
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for RedirectDirective {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, self.location)]).into_response()
    }
}

/// Explicit cancellation for an in-flight fetch
#[derive(Clone, Debug)]
pub struct CancellationHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so this only returns once cancelled
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Per-call overrides for a fetch
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Falls back to the configured upstream timeout
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationHandle>,
}

#[derive(Clone)]
pub struct MissionGateway {
    client: reqwest::Client,
    endpoint: Url,
    resource_id: String,
    timeout: Duration,
    identity: Arc<dyn IdentityAccessor>,
}

impl MissionGateway {
    pub fn new(config: &UpstreamConfig, identity: Arc<dyn IdentityAccessor>) -> Result<Self, ConfigError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or(ConfigError::Missing("SPO_REST_API_ENDPOINT"))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            resource_id: config.resource_id.clone(),
            timeout: config.timeout(),
            identity,
        })
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn require_authenticated_or_redirect(&self, ctx: &RequestContext) -> Option<RedirectDirective> {
        if self.identity.is_authenticated(ctx) {
            None
        } else {
            tracing::debug!("unauthenticated request for {}, redirecting to login", ctx.path);
            Some(RedirectDirective::login(&ctx.path))
        }
    }

    pub async fn resolve_access_token(
        &self,
        ctx: &RequestContext,
        resource_id: &str,
    ) -> Result<AccessToken, RedirectDirective> {
        if let Some(redirect) = self.require_authenticated_or_redirect(ctx) {
            return Err(redirect);
        }

        match self.identity.get_access_token(ctx, resource_id).await {
            TokenState::Valid(token) => Ok(token),
            state => {
                tracing::debug!("token for {} is {:?}, requesting consent", resource_id, state);
                Err(RedirectDirective::login_for_resource(&ctx.path, resource_id))
            }
        }
    }

    /// `resolve_access_token` for the configured upstream resource
    pub async fn resolve_configured_token(&self, ctx: &RequestContext) -> Result<AccessToken, RedirectDirective> {
        self.resolve_access_token(ctx, &self.resource_id).await
    }

    pub async fn list_missions(&self, token: &AccessToken) -> Result<Vec<Mission>, GatewayError> {
        self.list_missions_with(token, &FetchOptions::default()).await
    }

    pub async fn list_missions_with(
        &self,
        token: &AccessToken,
        options: &FetchOptions,
    ) -> Result<Vec<Mission>, GatewayError> {
        let body = self
            .fetch(UpstreamQuery::collection(&self.endpoint), token, options)
            .await?;
        Ok(mapper::decode_collection(&body)?)
    }

    pub async fn get_mission(&self, token: &AccessToken, mission_id: u64) -> Result<Mission, GatewayError> {
        self.get_mission_with(token, mission_id, &FetchOptions::default())
            .await
    }

    pub async fn get_mission_with(
        &self,
        token: &AccessToken,
        mission_id: u64,
        options: &FetchOptions,
    ) -> Result<Mission, GatewayError> {
        let body = self
            .fetch(UpstreamQuery::single(&self.endpoint, mission_id), token, options)
            .await?;
        Ok(mapper::decode_single(&body)?)
    }

    async fn fetch(
        &self,
        query: UpstreamQuery<'_>,
        token: &AccessToken,
        options: &FetchOptions,
    ) -> Result<String, GatewayError> {
        let url = query.to_url();
        tracing::debug!("upstream query: {}", url);

        let timeout = options.timeout.unwrap_or(self.timeout);
        let request = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .header(ACCEPT, "application/json");

        let exchange = async move {
            let response = request.send().await.map_err(|e| {
                tracing::error!("error submitting request to upstream: {}", e);
                GatewayError::Transport(e)
            })?;

            let status = response.status();
            if !status.is_success() {
                let err = GatewayError::upstream_status(status);
                tracing::warn!("error received from upstream: {}", err);
                return Err(err);
            }

            Ok::<String, GatewayError>(response.text().await?)
        };
        let bounded = tokio::time::timeout(timeout, exchange);

        let outcome = match &options.cancellation {
            Some(handle) => tokio::select! {
                biased;
                _ = handle.cancelled() => return Err(GatewayError::Cancelled),
                outcome = bounded => outcome,
            },
            None => bounded.await,
        };

        outcome.map_err(|_| {
            tracing::warn!("upstream request timed out after {:?}", timeout);
            GatewayError::Timeout(timeout)
        })?
    }
}
