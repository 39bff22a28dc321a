// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    generation::GenerationOptions,
    models::{quiz::GenerateQuizRequest, result::SubmitAnswersRequest},
    services::{grading, quiz},
    state::AppState,
    utils::{identity::Requester, json::AppJson},
};

/// Generates a quiz from source text with the configured provider.
///
/// * The requester becomes the owner.
/// * Returns 201 with the quiz and its questions.
/// * 502 when the provider fails, 422 when its output held no questions.
pub async fn generate_quiz(
    State(state): State<AppState>,
    requester: Requester,
    AppJson(req): AppJson<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let options = GenerationOptions {
        temperature: state.config.gemini.temperature,
        max_output_tokens: state.config.gemini.max_output_tokens,
    };

    let created = quiz::generate_quiz(
        state.store.as_ref(),
        state.generator.as_ref(),
        &options,
        requester.id,
        req,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Lists quizzes created by a user, newest first.
pub async fn get_user_quizzes(
    State(state): State<AppState>,
    _requester: Requester,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = quiz::list_user_quizzes(state.store.as_ref(), user_id).await?;

    Ok(Json(serde_json::json!({ "quizzes": quizzes })))
}

/// Returns a quiz with its questions; answers are hidden from non-owners.
pub async fn get_quiz(
    State(state): State<AppState>,
    requester: Requester,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = quiz::get_quiz(state.store.as_ref(), quiz_id, requester.id).await?;

    Ok(Json(detail))
}

/// Publishes a quiz. Owner only.
pub async fn publish_quiz(
    State(state): State<AppState>,
    requester: Requester,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = quiz::publish_quiz(state.store.as_ref(), quiz_id, requester.id).await?;

    Ok(Json(serde_json::json!({ "quiz": quiz })))
}

/// Grades a submission and stores the result.
///
/// Every call creates a new result row; retakes are not merged.
pub async fn submit_answers(
    State(state): State<AppState>,
    requester: Requester,
    Path(quiz_id): Path<i64>,
    AppJson(req): AppJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome =
        grading::grade_and_store(state.store.as_ref(), quiz_id, requester.id, req.answers).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
