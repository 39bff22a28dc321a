// src/models/quiz.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::question::{PublicQuestion, Question};

/// Title used when neither the caller nor the provider supplied one.
pub const FALLBACK_QUIZ_TITLE: &str = "Generated Quiz";

/// Question type discriminator, stored as 'multiple-choice' or 'text'.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    Text,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::Text => "text",
        }
    }

    /// Lenient parse for provider-supplied labels ("multiple_choice", "MCQ",
    /// "short answer", ...). Returns `None` for anything unrecognised.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match key.as_str() {
            "multiple-choice" | "multiplechoice" | "mcq" | "choice" | "single-choice" => {
                Some(QuestionType::MultipleChoice)
            }
            "text" | "short-answer" | "open" | "open-ended" | "free-text" => Some(QuestionType::Text),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for QuestionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "text" => Ok(QuestionType::Text),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,

    /// Mapped from the 'type' column since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Owning user, column 'created_by'.
    #[sqlx(rename = "created_by")]
    pub owner_id: i64,

    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a quiz header row.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub question_type: QuestionType,
    pub owner_id: i64,
}

/// A freshly committed quiz with its questions.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedQuiz {
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

/// Quiz as shown to a reader: the owner sees answers, everyone else does not.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuizQuestions {
    Full(Vec<Question>),
    Public(Vec<PublicQuestion>),
}

#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub quiz: Quiz,
    pub questions: QuizQuestions,
}

/// DTO for the quiz generation request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[serde(rename = "type", default)]
    pub question_type: QuestionType,

    /// Source text the quiz is generated from.
    #[validate(required(message = "prompt is required to generate a quiz"), length(min = 1, max = 100000))]
    pub prompt: Option<String>,

    #[validate(range(min = 1, max = 50))]
    pub num_questions: Option<usize>,
}
