// src/models/post.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Column width of `posts.hashtags`.
pub const MAX_HASHTAGS_CHARS: usize = 1024;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,

    /// Comma-separated, as submitted.
    pub hashtags: Option<String>,

    pub likes: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Hashtags arrive either as a list or already joined.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Hashtags {
    List(Vec<String>),
    Joined(String),
}

impl Hashtags {
    pub fn joined(&self) -> String {
        match self {
            Hashtags::List(tags) => tags.join(","),
            Hashtags::Joined(tags) => tags.clone(),
        }
    }
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(max = 10000, message = "Content must be at most 10000 characters"))]
    pub content: Option<String>,

    pub hashtags: Option<Hashtags>,
}

/// Insert payload for a post row.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub content: String,
    pub hashtags: Option<String>,
}

/// Query parameters for the feed.
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    /// Cursor for pagination: the created_at timestamp of the last post in the previous page.
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}
