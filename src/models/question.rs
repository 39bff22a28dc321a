// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use super::quiz::QuestionType;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// Ordinal inside the quiz, in the order the provider returned them.
    pub position: i32,

    pub question_text: String,

    /// List of options (e.g., ["Option A", "Option B"]).
    /// Only present for multiple-choice questions; stored as a JSON array.
    pub options: Option<Json<Vec<String>>>,

    pub correct_answer: Option<String>,

    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

/// DTO for sending a question to a non-owner (excludes the answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub position: i32,
    pub question_text: String,
    pub options: Option<Json<Vec<String>>>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            quiz_id: q.quiz_id,
            position: q.position,
            question_text: q.question_text,
            options: q.options,
            question_type: q.question_type,
        }
    }
}

/// Insert payload for a question row.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub quiz_id: i64,
    pub position: i32,
    pub question_text: String,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub question_type: QuestionType,
}
