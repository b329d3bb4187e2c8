use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiError, ApiResult, AppState, AuthenticatedUser},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

/// Query string of `GET /api/tickets`. List values are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct TicketListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// `me`, `unassigned` or a user id.
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub customer_email: Option<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

fn split_csv(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_csv<T>(value: Option<&str>, field: &str) -> ApiResult<Vec<T>>
where
    T: FromStr<Err = String>,
{
    split_csv(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| ApiError::BadRequest(format!("Invalid {}: {}", field, e)))
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TicketListParams {
    pub fn to_filter(&self, auth_user: &AuthenticatedUser) -> ApiResult<TicketFilter> {
        let assignee = match self.assigned_to.as_deref().map(str::trim) {
            None | Some("") => AssigneeFilter::Any,
            Some("me") => AssigneeFilter::User(auth_user.user.id.clone()),
            Some("unassigned") => AssigneeFilter::Unassigned,
            Some(id) => AssigneeFilter::User(id.to_string()),
        };

        Ok(TicketFilter {
            status: parse_csv(self.status.as_deref(), "status")?,
            priority: parse_csv(self.priority.as_deref(), "priority")?,
            assignee,
            created_by: non_blank(self.created_by.clone()),
            customer_email: non_blank(self.customer_email.clone()),
            search: non_blank(self.search.clone()),
            tags: split_csv(self.tags.as_deref()).map(str::to_string).collect(),
        })
    }

    pub fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }
}

pub async fn list_tickets(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Query(params): Query<TicketListParams>,
) -> ApiResult<Json<TicketListResponse>> {
    let filter = params.to_filter(&auth_user)?;
    let response = state
        .ticket_service
        .list_tickets(&auth_user.actor(), &filter, params.page())
        .await?;
    Ok(Json(response))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Json(request): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = state
        .ticket_service
        .create_ticket(&auth_user.actor(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Ticket>> {
    let ticket = state
        .ticket_service
        .get_ticket(&auth_user.actor(), &id)
        .await?;
    Ok(Json(ticket))
}

pub async fn update_ticket(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTicketRequest>,
) -> ApiResult<Json<Ticket>> {
    let ticket = state
        .ticket_service
        .update_ticket(&auth_user.actor(), &id, request)
        .await?;
    Ok(Json(ticket))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .ticket_service
        .delete_ticket(&auth_user.actor(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_ticket(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<AssignTicketRequest>,
) -> ApiResult<Json<Ticket>> {
    let ticket = state
        .ticket_service
        .assign_ticket(&auth_user.actor(), &id, request.assigned_to)
        .await?;
    Ok(Json(ticket))
}

pub async fn bulk_update(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Json(request): Json<BulkUpdateRequest>,
) -> ApiResult<Json<BulkUpdateResponse>> {
    let response = state
        .ticket_service
        .bulk_update(&auth_user.actor(), request)
        .await?;
    Ok(Json(response))
}
