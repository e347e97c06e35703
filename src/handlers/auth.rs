use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{LoginState, Session};
use crate::error::ApiError;
use crate::gateway::RedirectDirective;
use crate::identity::{CachedToken, RequestContext};
use crate::middleware::{
    challenge_cookie, challenge_cookie_name, clear_challenge_cookie, clear_session_cookie, read_cookie,
    session_cookie,
};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redir: Option<String>,
    #[serde(rename = "resourceId")]
    pub resource_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn cookie_header(value: String) -> Result<HeaderValue, ApiError> {
    value
        .parse::<HeaderValue>()
        .map_err(|_| ApiError::internal_server_error("Could not establish session"))
}

/// Only same-site paths are honoured as post-login destinations
fn local_redirect(redir: Option<&str>) -> String {
    match redir {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// GET /login?redir=<path>&resourceId=<resource>
///
/// Sends the browser to the identity provider. `redir` and the resource ride
/// along in a signed `state` token and come back through `/auth/callback`.
/// The state's nonce is also set as a short-lived challenge cookie, so the
/// callback only completes in the browser that started the sign-in.
/// Without `resourceId` the configured missions resource is requested.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, ApiError> {
    let redir = local_redirect(query.redir.as_deref());
    let resource_id = query
        .resource_id
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| state.gateway.resource_id().to_string());

    let login_state = LoginState::new(redir, Some(resource_id.clone()));
    let signed = state.sessions.issue_state(&login_state)?;

    let url = state.issuer.authorize_url(&resource_id, &signed);
    tracing::info!("sign-in requested for resource {}", resource_id);

    let mut response = RedirectDirective::to(url.to_string()).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie_header(challenge_cookie(&state.sessions, &login_state.nonce))?,
    );
    Ok(response)
}

/// GET /auth/callback?code=<code>&state=<state>
///
/// Redeems the authorization code, caches the resource token under the
/// caller's session (creating one if needed), sets the session cookie and
/// returns the browser to where it started.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    if let Some(error) = query.error {
        tracing::warn!(
            "identity provider returned {}: {}",
            error,
            query.error_description.as_deref().unwrap_or("")
        );
        return Err(ApiError::unauthorized("Sign-in was not completed"));
    }

    let signed_state = query
        .state
        .ok_or_else(|| ApiError::bad_request("Missing state parameter"))?;
    let code = query
        .code
        .ok_or_else(|| ApiError::bad_request("Missing code parameter"))?;

    let login_state = state.sessions.verify_state(&signed_state)?;

    let challenge = read_cookie(&headers, &challenge_cookie_name(&state.sessions));
    if challenge.as_deref() != Some(login_state.nonce.to_string().as_str()) {
        tracing::warn!("login state presented without its challenge cookie");
        return Err(ApiError::bad_request("Sign-in request expired or was tampered with"));
    }

    let resource_id = login_state
        .resource_id
        .clone()
        .unwrap_or_else(|| state.gateway.resource_id().to_string());

    let issued = state.issuer.redeem_code(&code, &resource_id).await?;

    // Consent for a further resource keeps the existing session
    let session = match (ctx.session, issued.principal()) {
        (existing, Ok(principal)) => Session {
            id: existing.map(|s| s.id).unwrap_or_else(Uuid::new_v4),
            user_id: principal.user_id,
            user_name: principal.user_name,
        },
        (Some(existing), Err(e)) => {
            tracing::debug!("no principal in token response, keeping session: {}", e);
            existing
        }
        (None, Err(e)) => return Err(e.into()),
    };

    state
        .cache
        .store(
            session.id,
            &resource_id,
            CachedToken::from_issued(&issued, chrono::Utc::now()),
        )
        .await;

    let cookie = session_cookie(&state.sessions, &state.sessions.issue(&session)?);
    tracing::info!("user {} signed in for {}", session.user_id, resource_id);

    let mut response = RedirectDirective::to(login_state.redir).into_response();
    let response_headers = response.headers_mut();
    response_headers.append(header::SET_COOKIE, cookie_header(cookie)?);
    response_headers.append(
        header::SET_COOKIE,
        cookie_header(clear_challenge_cookie(&state.sessions))?,
    );
    Ok(response)
}

/// GET /logout - Forget cached tokens, revoke the session and clear its cookie
pub async fn logout(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Result<Response, ApiError> {
    if let Some(session) = &ctx.session {
        state.cache.revoke(session.id).await;
        tracing::info!("user {} signed out", session.user_id);
    }

    let mut response = RedirectDirective::to("/").into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie_header(clear_session_cookie(&state.sessions))?,
    );
    Ok(response)
}
