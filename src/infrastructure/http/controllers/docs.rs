use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser},
};
use axum::{
    extract::{Path, State},
    Json,
};

pub async fn search(
    State(state): State<AppState>,
    axum::Extension(_auth_user): axum::Extension<AuthenticatedUser>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let results = state.document_service.search(&request).await?;
    Ok(Json(SearchResponse { results }))
}

pub async fn list_category(
    State(state): State<AppState>,
    axum::Extension(_auth_user): axum::Extension<AuthenticatedUser>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<DocSummary>>> {
    let docs = state.document_service.list_category(&category).await?;
    Ok(Json(docs))
}

pub async fn get_doc(
    State(state): State<AppState>,
    axum::Extension(_auth_user): axum::Extension<AuthenticatedUser>,
    Path((category, slug)): Path<(String, String)>,
) -> ApiResult<Json<HelpDoc>> {
    let doc = state.document_service.get_doc(&category, &slug).await?;
    Ok(Json(doc))
}

pub async fn reindex(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
) -> ApiResult<Json<ReindexResponse>> {
    let response = state.document_service.reindex(&auth_user.actor()).await?;
    Ok(Json(response))
}
