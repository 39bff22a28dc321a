// src/handlers/community.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, PostListParams},
    services::post,
    state::AppState,
    utils::{identity::Requester, json::AppJson},
};

/// Create a new post for the requesting user.
pub async fn create_post(
    State(state): State<AppState>,
    requester: Requester,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = post::create_post(state.posts.as_ref(), requester.id, payload).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "post": post }))))
}

/// List posts (Recent first).
/// Supports cursor-based pagination.
pub async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let posts = post::feed(state.posts.as_ref(), params).await?;

    Ok(Json(serde_json::json!({ "posts": posts })))
}

pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let posts = post::user_posts(state.posts.as_ref(), user_id).await?;

    Ok(Json(serde_json::json!({ "posts": posts })))
}
