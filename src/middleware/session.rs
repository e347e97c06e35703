use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{Session, SessionKeys, LOGIN_STATE_MINUTES};
use crate::identity::RequestContext;

/// Session cookie middleware: a valid cookie puts the `Session` into request
/// extensions. A missing, bad or signed-out cookie leaves the request anonymous.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = read_cookie(request.headers(), &state.sessions.cookie_name) {
        match state.sessions.verify(&token) {
            Ok(session) => {
                if state.cache.is_revoked(session.id).await {
                    tracing::debug!("ignoring cookie of signed-out session {}", session.id);
                } else {
                    request.extensions_mut().insert(session);
                }
            }
            Err(e) => tracing::debug!("ignoring session cookie: {}", e),
        }
    }

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let session = parts.extensions.get::<Session>().cloned();

        Ok(RequestContext::new(path, session))
    }
}

/// Extract a cookie value by name from the Cookie header(s)
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(keys: &SessionKeys, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        keys.cookie_name,
        token,
        keys.ttl_seconds()
    );
    if keys.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(keys: &SessionKeys) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", keys.cookie_name)
}

/// Path the login challenge cookie is scoped to
const CALLBACK_PATH: &str = "/auth/callback";

/// Name of the cookie binding a login `state` to the browser that asked for it
pub fn challenge_cookie_name(keys: &SessionKeys) -> String {
    format!("{}_challenge", keys.cookie_name)
}

/// `Set-Cookie` value carrying the login nonce until the callback
pub fn challenge_cookie(keys: &SessionKeys, nonce: &Uuid) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; HttpOnly; SameSite=Lax; Max-Age={}",
        challenge_cookie_name(keys),
        nonce,
        CALLBACK_PATH,
        LOGIN_STATE_MINUTES * 60
    );
    if keys.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the login challenge cookie
pub fn clear_challenge_cookie(keys: &SessionKeys) -> String {
    format!(
        "{}=; Path={}; HttpOnly; SameSite=Lax; Max-Age=0",
        challenge_cookie_name(keys),
        CALLBACK_PATH
    )
}
