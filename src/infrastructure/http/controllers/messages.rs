use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_messages(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state
        .message_service
        .list_messages(&auth_user.actor(), &ticket_id)
        .await?;
    Ok(Json(messages))
}

pub async fn create_message(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(ticket_id): Path<String>,
    Json(request): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = state
        .message_service
        .create_message(&auth_user.actor(), &ticket_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Vec<Attachment>>> {
    let attachments = state
        .message_service
        .list_attachments(&auth_user.actor(), &message_id)
        .await?;
    Ok(Json(attachments))
}

pub async fn add_attachment(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(message_id): Path<String>,
    Json(request): Json<CreateAttachmentRequest>,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    let attachment = state
        .message_service
        .add_attachment(&auth_user.actor(), &message_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}
