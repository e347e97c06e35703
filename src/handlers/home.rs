use axum::response::IntoResponse;
use serde_json::json;

use crate::identity::RequestContext;
use crate::middleware::ApiResponse;
use crate::models::HomeViewModel;

/// GET / - Landing page model
///
/// Public. Reports who (if anyone) is signed in.
///
/// ```json
/// {
///   "success": true,
///   "data": { "isAuthenticated": true, "userId": "8d1c0f44", "userName": "Neil Armstrong" }
/// }
/// ```
pub async fn index(ctx: RequestContext) -> impl IntoResponse {
    ApiResponse::success(HomeViewModel::new(ctx.session.as_ref()))
}

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
