use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;
use crate::gateway::{parse_id, GatewayError, RedirectDirective};
use crate::identity::RequestContext;
use crate::middleware::ApiResponse;
use crate::models::MissionViewModel;

/// GET /missions - All missions, oldest launch first
///
/// Redirects to `/login` when the caller has no session, or to
/// `/login?...&resourceId=...` when the list's token is missing or lapsed.
pub async fn list(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Result<Response, ApiError> {
    let token = match state.gateway.resolve_configured_token(&ctx).await {
        Ok(token) => token,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let missions = state.gateway.list_missions(&token).await?;
    tracing::debug!("listing {} missions", missions.len());

    let view = MissionViewModel::new(ctx.session.as_ref()).with_missions(missions);
    Ok(ApiResponse::success(view).into_response())
}

/// GET /missions/:missionid - One mission
///
/// A non-numeric id sends the caller back to the list. An upstream 404 for
/// the record is reported as a missing mission.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(missionid): Path<String>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let mission_id = match parse_id(&missionid) {
        Ok(id) => id,
        Err(_) => {
            tracing::debug!("mission id '{}' is not numeric, back to list", missionid);
            return Ok(RedirectDirective::to("/missions").into_response());
        }
    };

    let token = match state.gateway.resolve_configured_token(&ctx).await {
        Ok(token) => token,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let mission = state
        .gateway
        .get_mission(&token, mission_id)
        .await
        .map_err(|e| match e {
            GatewayError::UpstreamStatus { status: 404, .. } => ApiError::not_found("Mission not found"),
            other => other.into(),
        })?;

    let view = MissionViewModel::new(ctx.session.as_ref()).with_mission(mission);
    Ok(ApiResponse::success(view).into_response())
}
