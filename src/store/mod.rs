//! Storage seam. Handlers and services talk to `QuizStore`; quiz creation
//! goes through a `QuizTransaction` so that a quiz and its questions become
//! visible together or not at all. Community posts live behind `PostStore`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        post::{NewPost, Post},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
        result::{NewResult, QuizResult},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Opens a write transaction for quiz creation.
    async fn begin(&self) -> Result<Box<dyn QuizTransaction>, AppError>;

    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError>;

    /// Questions of a quiz ordered by position.
    async fn find_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;

    /// Newest first.
    async fn list_quizzes_by_owner(&self, owner_id: i64) -> Result<Vec<Quiz>, AppError>;

    /// Sets `is_published`; returns `None` when the quiz does not exist.
    async fn mark_published(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError>;

    async fn insert_result(&self, result: NewResult) -> Result<QuizResult, AppError>;

    /// Newest first.
    async fn list_results_by_user(&self, user_id: i64) -> Result<Vec<QuizResult>, AppError>;
}

/// Writes staged here are invisible to readers until `commit`.
/// Dropping without committing discards them.
#[async_trait]
pub trait QuizTransaction: Send {
    async fn insert_quiz(&mut self, quiz: &NewQuiz) -> Result<Quiz, AppError>;

    async fn insert_question(&mut self, question: &NewQuestion) -> Result<Question, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError>;

    /// Newest first, at most `limit` posts created strictly before `before`.
    async fn list_posts(
        &self,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Post>, AppError>;

    /// Newest first.
    async fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, AppError>;
}
