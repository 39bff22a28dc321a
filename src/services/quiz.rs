// src/services/quiz.rs

use validator::Validate;

use crate::{
    error::AppError,
    generation::{
        GenerationClient, GenerationOptions, GenerationParams, NormalizedQuiz, build_prompt,
        normalize, prompt::DEFAULT_NUM_QUESTIONS,
    },
    models::{
        question::NewQuestion,
        quiz::{
            CreatedQuiz, FALLBACK_QUIZ_TITLE, GenerateQuizRequest, NewQuiz, QuestionType, Quiz,
            QuizDetail, QuizQuestions,
        },
    },
    store::{QuizStore, QuizTransaction},
};

/// Column width of `quizzes.title`.
const MAX_TITLE_CHARS: usize = 255;

/// Generates a quiz from source text and persists it.
///
/// * Validates the request.
/// * Calls the provider once; a provider failure aborts before any write.
/// * Normalizes the output and drops entries without question text.
/// * Persists quiz and questions atomically via [`create_quiz`].
pub async fn generate_quiz(
    store: &dyn QuizStore,
    generator: &dyn GenerationClient,
    options: &GenerationOptions,
    owner_id: i64,
    request: GenerateQuizRequest,
) -> Result<CreatedQuiz, AppError> {
    request.validate()?;

    let source_text = request
        .prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("prompt is required to generate a quiz".to_string()))?;

    let params = GenerationParams {
        question_type: request.question_type,
        num_questions: request.num_questions.unwrap_or(DEFAULT_NUM_QUESTIONS),
    };

    let prompt = build_prompt(source_text, &params);
    let raw = generator.complete(&prompt, options).await?;
    let mut normalized = normalize(&raw, &params)?;

    if let Some(reason) = &normalized.failure {
        tracing::warn!("Normalization failed for owner {}: {}", owner_id, reason);
    }

    let returned = normalized.questions.len();
    normalized
        .questions
        .retain(|q| !q.question_text.trim().is_empty());
    if normalized.questions.len() < returned {
        tracing::warn!(
            "Dropped {} generated questions without text",
            returned - normalized.questions.len()
        );
    }

    create_quiz(
        store,
        owner_id,
        request.title.as_deref(),
        request.question_type,
        &normalized,
    )
    .await
}

/// Creates a quiz and all of its questions in one transaction.
///
/// Nothing is written when the payload has no questions or any question lacks
/// text. A storage failure after the transaction opens rolls everything back.
pub async fn create_quiz(
    store: &dyn QuizStore,
    owner_id: i64,
    requested_title: Option<&str>,
    question_type: QuestionType,
    payload: &NormalizedQuiz,
) -> Result<CreatedQuiz, AppError> {
    if payload.questions.is_empty() {
        return Err(AppError::Validation(
            "AI did not return valid questions".to_string(),
        ));
    }
    if let Some(index) = payload
        .questions
        .iter()
        .position(|q| q.question_text.trim().is_empty())
    {
        return Err(AppError::Validation(format!(
            "Question {} has no text",
            index + 1
        )));
    }

    let new_quiz = NewQuiz {
        title: resolve_title(requested_title, &payload.title),
        question_type,
        owner_id,
    };

    let mut tx = store.begin().await?;

    match insert_quiz_rows(tx.as_mut(), &new_quiz, payload).await {
        Ok(created) => {
            tx.commit().await.map_err(|e| {
                tracing::error!("Failed to commit quiz for owner {}: {:?}", owner_id, e);
                e
            })?;
            tracing::info!(
                "Created quiz {} with {} questions for owner {}",
                created.quiz.id,
                created.questions.len(),
                owner_id
            );
            Ok(created)
        }
        Err(e) => {
            tracing::error!("Quiz creation failed, rolling back: {:?}", e);
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {:?}", rollback_err);
            }
            Err(e)
        }
    }
}

async fn insert_quiz_rows(
    tx: &mut dyn QuizTransaction,
    new_quiz: &NewQuiz,
    payload: &NormalizedQuiz,
) -> Result<CreatedQuiz, AppError> {
    let quiz = tx.insert_quiz(new_quiz).await?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    for (index, q) in payload.questions.iter().enumerate() {
        let position = i32::try_from(index)
            .map_err(|_| AppError::Validation("Too many questions".to_string()))?;
        let question = tx
            .insert_question(&NewQuestion {
                quiz_id: quiz.id,
                position,
                question_text: q.question_text.trim().to_string(),
                options: q.options.clone(),
                correct_answer: q.correct_answer.clone(),
                question_type: q.question_type,
            })
            .await?;
        questions.push(question);
    }

    Ok(CreatedQuiz { quiz, questions })
}

/// Requested title, else the provider's title, else the fallback label.
fn resolve_title(requested: Option<&str>, provider: &str) -> String {
    let title = requested
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| Some(provider.trim()).filter(|t| !t.is_empty()))
        .unwrap_or(FALLBACK_QUIZ_TITLE);

    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// Marks a quiz as published. Only the owner may do so; repeating the call
/// is harmless.
pub async fn publish_quiz(
    store: &dyn QuizStore,
    quiz_id: i64,
    requester_id: i64,
) -> Result<Quiz, AppError> {
    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.owner_id != requester_id {
        tracing::warn!(
            "User {} attempted to publish quiz {} owned by {}",
            requester_id,
            quiz_id,
            quiz.owner_id
        );
        return Err(AppError::Forbidden(
            "Not authorized to publish this quiz".to_string(),
        ));
    }

    if quiz.is_published {
        return Ok(quiz);
    }

    store
        .mark_published(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

pub async fn list_user_quizzes(store: &dyn QuizStore, owner_id: i64) -> Result<Vec<Quiz>, AppError> {
    store.list_quizzes_by_owner(owner_id).await
}

/// Loads a quiz with its questions. Correct answers are only included for
/// the owner.
pub async fn get_quiz(
    store: &dyn QuizStore,
    quiz_id: i64,
    requester_id: i64,
) -> Result<QuizDetail, AppError> {
    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let questions = store.find_questions(quiz_id).await?;

    let questions = if quiz.owner_id == requester_id {
        QuizQuestions::Full(questions)
    } else {
        QuizQuestions::Public(questions.into_iter().map(Into::into).collect())
    };

    Ok(QuizDetail { quiz, questions })
}
