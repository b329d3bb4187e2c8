use crate::{
    domain::entities::{DashboardSummary, PortalSummary},
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser},
};
use axum::{extract::State, Json};

pub async fn health() -> &'static str {
    "OK"
}

/// Customer landing page data.
pub async fn portal(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
) -> ApiResult<Json<PortalSummary>> {
    let summary = state
        .ticket_service
        .portal_summary(&auth_user.actor())
        .await?;
    Ok(Json(summary))
}

/// Staff landing page data.
pub async fn dashboard(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
) -> ApiResult<Json<DashboardSummary>> {
    let summary = state
        .ticket_service
        .dashboard_summary(&auth_user.actor())
        .await?;
    Ok(Json(summary))
}
