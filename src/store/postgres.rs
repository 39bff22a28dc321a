// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction, types::Json};

use super::{PostStore, QuizStore, QuizTransaction};
use crate::{
    error::AppError,
    models::{
        post::{NewPost, Post},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
        result::{NewResult, QuizResult},
    },
};

const QUIZ_COLUMNS: &str = "id, title, type, created_by, is_published, created_at";
const QUESTION_COLUMNS: &str =
    "id, quiz_id, position, question_text, options, correct_answer, type";
const RESULT_COLUMNS: &str = "id, quiz_id, user_id, score, answers, created_at";
const POST_COLUMNS: &str = "id, user_id, content, hashtags, likes, created_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn QuizTransaction>, AppError> {
        let tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to open transaction: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
        Ok(Box::new(PgQuizTransaction { tx }))
    }

    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1",
            QUIZ_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn find_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY position ASC, id ASC",
            QUESTION_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn list_quizzes_by_owner(&self, owner_id: i64) -> Result<Vec<Quiz>, AppError> {
        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE created_by = $1 ORDER BY created_at DESC, id DESC",
            QUIZ_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    async fn mark_published(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "UPDATE quizzes SET is_published = TRUE WHERE id = $1 RETURNING {}",
            QUIZ_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn insert_result(&self, result: NewResult) -> Result<QuizResult, AppError> {
        let row = sqlx::query_as::<_, QuizResult>(&format!(
            "INSERT INTO results (quiz_id, user_id, score, answers) VALUES ($1, $2, $3, $4) RETURNING {}",
            RESULT_COLUMNS
        ))
        .bind(result.quiz_id)
        .bind(result.user_id)
        .bind(result.score)
        .bind(Json(&result.answers))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert result: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(row)
    }

    async fn list_results_by_user(&self, user_id: i64) -> Result<Vec<QuizResult>, AppError> {
        let results = sqlx::query_as::<_, QuizResult>(&format!(
            "SELECT {} FROM results WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            RESULT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (user_id, content, hashtags) VALUES ($1, $2, $3) RETURNING {}",
            POST_COLUMNS
        ))
        .bind(post.user_id)
        .bind(&post.content)
        .bind(&post.hashtags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(row)
    }

    async fn list_posts(
        &self,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts \
             WHERE ($1::TIMESTAMPTZ IS NULL OR created_at < $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2",
            POST_COLUMNS
        ))
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}

/// An open Postgres transaction. Dropping it rolls back.
pub struct PgQuizTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl QuizTransaction for PgQuizTransaction {
    async fn insert_quiz(&mut self, quiz: &NewQuiz) -> Result<Quiz, AppError> {
        let row = sqlx::query_as::<_, Quiz>(&format!(
            "INSERT INTO quizzes (title, type, created_by, is_published) VALUES ($1, $2, $3, FALSE) RETURNING {}",
            QUIZ_COLUMNS
        ))
        .bind(&quiz.title)
        .bind(quiz.question_type.as_str())
        .bind(quiz.owner_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_question(&mut self, question: &NewQuestion) -> Result<Question, AppError> {
        let row = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (quiz_id, position, question_text, options, correct_answer, type) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(question.quiz_id)
        .bind(question.position)
        .bind(&question.question_text)
        .bind(question.options.as_ref().map(Json))
        .bind(&question.correct_answer)
        .bind(question.question_type.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgQuizTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        let PgQuizTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
