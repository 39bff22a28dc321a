// src/services/post.rs

use validator::Validate;

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, MAX_HASHTAGS_CHARS, NewPost, Post, PostListParams},
    store::PostStore,
};

const DEFAULT_FEED_LIMIT: i64 = 20;
const MAX_FEED_LIMIT: i64 = 100;

/// Creates a post owned by `user_id`. Blank content is rejected.
pub async fn create_post(
    store: &dyn PostStore,
    user_id: i64,
    request: CreatePostRequest,
) -> Result<Post, AppError> {
    request.validate()?;

    let content = request
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Content is required".to_string()))?;

    let hashtags = request.hashtags.map(|tags| tags.joined());
    if hashtags
        .as_ref()
        .is_some_and(|tags| tags.chars().count() > MAX_HASHTAGS_CHARS)
    {
        return Err(AppError::BadRequest(format!(
            "Hashtags must be at most {} characters",
            MAX_HASHTAGS_CHARS
        )));
    }

    let post = store
        .insert_post(NewPost {
            user_id,
            content,
            hashtags,
        })
        .await?;

    tracing::info!("User {} created post {}", user_id, post.id);

    Ok(post)
}

/// One page of the feed, newest first.
pub async fn feed(store: &dyn PostStore, params: PostListParams) -> Result<Vec<Post>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);

    store.list_posts(params.cursor, limit).await
}

pub async fn user_posts(store: &dyn PostStore, user_id: i64) -> Result<Vec<Post>, AppError> {
    store.list_posts_by_user(user_id).await
}
