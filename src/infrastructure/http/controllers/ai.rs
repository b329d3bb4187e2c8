use crate::{
    domain::entities::{AiCheckRequest, AiReplyResponse, MessageCheck},
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser},
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Draft a reply for the ticket. The request body is ignored.
pub async fn generate_reply(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<AiReplyResponse>> {
    let response = state
        .ai_service
        .generate_reply(&auth_user.actor(), &ticket_id)
        .await?;
    Ok(Json(response))
}

pub async fn check_reply(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(ticket_id): Path<String>,
    Json(request): Json<AiCheckRequest>,
) -> ApiResult<Json<MessageCheck>> {
    let check = state
        .ai_service
        .check_reply(&auth_user.actor(), &ticket_id, &request.draft)
        .await?;
    Ok(Json(check))
}
