use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_me(
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
) -> Json<User> {
    Json(auth_user.user)
}

pub async fn list_users(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Query(params): Query<UserListParams>,
) -> ApiResult<Json<UserListResponse>> {
    let page = Page::new(params.offset, params.limit);
    let response = state
        .user_service
        .list_users(&auth_user.actor(), page)
        .await?;
    Ok(Json(response))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .user_service
        .update_role(&auth_user.actor(), &id, request.role)
        .await?;
    Ok(Json(user))
}
