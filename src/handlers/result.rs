// src/handlers/result.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, services::grading, state::AppState, utils::identity::Requester};

/// Retrieves a user's results with a summary of each quiz.
pub async fn get_user_results(
    State(state): State<AppState>,
    _requester: Requester,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = grading::list_user_results(state.store.as_ref(), user_id).await?;

    Ok(Json(serde_json::json!({ "results": results })))
}
