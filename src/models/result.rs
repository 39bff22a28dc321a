// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use super::quiz::Quiz;
use crate::utils::value::lenient_id;

/// Represents the 'results' table in the database.
/// One row per submission; retakes add rows instead of updating.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,

    /// Percentage in [0, 100], two decimal places.
    pub score: f64,

    pub answers: Json<Vec<AnswerRecord>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Per-question outcome stored with a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: i64,
    /// The answer exactly as submitted.
    pub answer: serde_json::Value,
    pub is_correct: bool,
}

/// Insert payload for a result row.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub quiz_id: i64,
    pub user_id: i64,
    pub score: f64,
    pub answers: Vec<AnswerRecord>,
}

/// A single submitted answer. The answer may be any JSON value.
///
/// `questionId` may be a number or a numeric string; when it is missing or
/// unreadable the answer is skipped during grading like any unknown id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    #[serde(default, deserialize_with = "lenient_id")]
    pub question_id: Option<i64>,
    #[serde(default)]
    pub answer: serde_json::Value,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Option<Vec<SubmittedAnswer>>,
}

/// A result joined with a summary of its quiz, for history listings.
#[derive(Debug, Serialize)]
pub struct ResultWithQuiz {
    pub result: QuizResult,
    pub quiz: Option<Quiz>,
}

/// Response for a graded submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub result: QuizResult,
    pub correct_count: usize,
    pub total_questions: usize,
}
