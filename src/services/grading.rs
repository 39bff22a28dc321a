// src/services/grading.rs

use std::collections::HashMap;

use serde_json::Value;

use crate::{
    error::AppError,
    models::{
        question::Question,
        quiz::{QuestionType, Quiz},
        result::{AnswerRecord, NewResult, ResultWithQuiz, SubmissionOutcome, SubmittedAnswer},
    },
    store::QuizStore,
    utils::value::display_value,
};

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    /// Percentage of graded answers that were correct, two decimals.
    pub score: f64,
    pub correct_count: usize,
    /// Answers that referenced a known question.
    pub graded_count: usize,
    /// One record per graded answer, in submission order.
    pub details: Vec<AnswerRecord>,
}

/// Grades submitted answers against the given questions.
///
/// Answers to unknown or missing question ids are skipped entirely: they neither count
/// toward the denominator nor appear in `details`.
pub fn grade(questions: &[Question], answers: &[SubmittedAnswer]) -> Grade {
    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let details: Vec<AnswerRecord> = answers
        .iter()
        .filter_map(|submitted| {
            let question_id = submitted.question_id?;
            let question = by_id.get(&question_id)?;
            Some(AnswerRecord {
                question_id,
                answer: submitted.answer.clone(),
                is_correct: is_correct(question, &submitted.answer),
            })
        })
        .collect();

    let graded_count = details.len();
    let correct_count = details.iter().filter(|d| d.is_correct).count();

    Grade {
        score: percentage(correct_count, graded_count),
        correct_count,
        graded_count,
        details,
    }
}

/// Multiple-choice answers must match an option verbatim (case-sensitive,
/// surrounding whitespace ignored). Text answers compare case-insensitively
/// and must be strings.
fn is_correct(question: &Question, answer: &Value) -> bool {
    let Some(expected) = question.correct_answer.as_deref() else {
        return false;
    };

    match question.question_type {
        QuestionType::MultipleChoice => display_value(answer).trim() == expected.trim(),
        QuestionType::Text => match answer {
            Value::String(given) => given.trim().to_lowercase() == expected.trim().to_lowercase(),
            _ => false,
        },
    }
}

fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = correct as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Grades a submission for a quiz and stores exactly one result row.
pub async fn grade_and_store(
    store: &dyn QuizStore,
    quiz_id: i64,
    user_id: i64,
    answers: Option<Vec<SubmittedAnswer>>,
) -> Result<SubmissionOutcome, AppError> {
    let answers =
        answers.ok_or_else(|| AppError::BadRequest("answers array is required".to_string()))?;

    store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let questions = store.find_questions(quiz_id).await?;
    let grade = grade(&questions, &answers);

    if grade.graded_count < answers.len() {
        tracing::debug!(
            "Ignored {} answers to unknown questions of quiz {}",
            answers.len() - grade.graded_count,
            quiz_id
        );
    }

    let result = store
        .insert_result(NewResult {
            quiz_id,
            user_id,
            score: grade.score,
            answers: grade.details,
        })
        .await?;

    tracing::info!(
        "User {} scored {} on quiz {} ({}/{})",
        user_id,
        result.score,
        quiz_id,
        grade.correct_count,
        grade.graded_count
    );

    Ok(SubmissionOutcome {
        result,
        correct_count: grade.correct_count,
        total_questions: grade.graded_count,
    })
}

/// A user's results, newest first, each with its quiz when still available.
/// Storage failures abort the listing.
pub async fn list_user_results(
    store: &dyn QuizStore,
    user_id: i64,
) -> Result<Vec<ResultWithQuiz>, AppError> {
    let results = store.list_results_by_user(user_id).await?;

    let mut quizzes: HashMap<i64, Option<Quiz>> = HashMap::new();
    let mut enriched = Vec::with_capacity(results.len());

    for result in results {
        let quiz = match quizzes.get(&result.quiz_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = store.find_quiz(result.quiz_id).await?;
                quizzes.insert(result.quiz_id, fetched.clone());
                fetched
            }
        };
        enriched.push(ResultWithQuiz { result, quiz });
    }

    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::types::Json;

    fn question(id: i64, question_type: QuestionType, correct: &str) -> Question {
        Question {
            id,
            quiz_id: 1,
            position: (id - 1) as i32,
            question_text: format!("Question {}", id),
            options: match question_type {
                QuestionType::MultipleChoice => Some(Json(vec!["Paris".to_string(), "Rome".to_string()])),
                QuestionType::Text => None,
            },
            correct_answer: Some(correct.to_string()),
            question_type,
        }
    }

    fn answer(question_id: i64, answer: Value) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: Some(question_id),
            answer,
        }
    }

    #[test]
    fn multiple_choice_is_case_sensitive() {
        let questions = vec![question(1, QuestionType::MultipleChoice, "Paris")];
        let grade = grade(&questions, &[answer(1, json!(" paris "))]);

        assert_eq!(grade.score, 0.0);
        assert_eq!(
            grade.details,
            vec![AnswerRecord {
                question_id: 1,
                answer: json!(" paris "),
                is_correct: false
            }]
        );
    }

    #[test]
    fn multiple_choice_ignores_surrounding_whitespace() {
        let questions = vec![question(1, QuestionType::MultipleChoice, "Paris ")];
        let grade = grade(&questions, &[answer(1, json!("  Paris"))]);
        assert_eq!(grade.score, 100.0);
    }

    #[test]
    fn multiple_choice_coerces_non_string_answers() {
        let questions = vec![question(1, QuestionType::MultipleChoice, "4")];
        let grade = grade(&questions, &[answer(1, json!(4))]);
        assert!(grade.details[0].is_correct);
    }

    #[test]
    fn text_is_case_insensitive() {
        let questions = vec![question(2, QuestionType::Text, "Photosynthesis")];
        let grade = grade(&questions, &[answer(2, json!("photosynthesis"))]);
        assert!(grade.details[0].is_correct);
        assert_eq!(grade.score, 100.0);
    }

    #[test]
    fn text_requires_string_answers() {
        let questions = vec![question(2, QuestionType::Text, "42")];
        let grade = grade(&questions, &[answer(2, json!(42))]);
        assert!(!grade.details[0].is_correct);
    }

    #[test]
    fn missing_correct_answer_is_incorrect() {
        let mut q = question(1, QuestionType::MultipleChoice, "x");
        q.correct_answer = None;
        let grade = grade(&[q], &[answer(1, Value::Null)]);
        assert!(!grade.details[0].is_correct);
    }

    #[test]
    fn unknown_questions_are_skipped() {
        let questions = vec![question(1, QuestionType::MultipleChoice, "Paris")];
        let grade = grade(&questions, &[answer(99, json!("x"))]);

        assert_eq!(grade.score, 0.0);
        assert_eq!(grade.graded_count, 0);
        assert!(grade.details.is_empty());
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, "Paris"),
            question(2, QuestionType::Text, "Rome"),
            question(3, QuestionType::Text, "Oslo"),
        ];
        let answers = [
            answer(1, json!("Paris")),
            answer(2, json!("rome")),
            answer(3, json!("Bergen")),
        ];
        let grade = grade(&questions, &answers);

        assert_eq!(grade.correct_count, 2);
        assert_eq!(grade.score, 66.67);
    }

    #[test]
    fn details_follow_submission_order() {
        let questions = vec![
            question(1, QuestionType::Text, "a"),
            question(2, QuestionType::Text, "b"),
        ];
        let answers = [answer(2, json!("b")), answer(7, json!("?")), answer(1, json!("a"))];
        let grade = grade(&questions, &answers);

        let ids: Vec<i64> = grade.details.iter().map(|d| d.question_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn string_and_missing_question_ids() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, "Paris"),
            question(2, QuestionType::Text, "Rome"),
        ];
        let answers: Vec<SubmittedAnswer> = serde_json::from_value(json!([
            { "questionId": "1", "answer": "Paris" },
            { "answer": "Rome" },
            { "questionId": { "id": 2 }, "answer": "Rome" },
            { "questionId": 2, "answer": "Oslo" }
        ]))
        .unwrap();

        let grade = grade(&questions, &answers);
        assert_eq!(grade.graded_count, 2);
        assert_eq!(grade.correct_count, 1);
        assert_eq!(grade.details[0].question_id, 1);
        assert_eq!(grade.score, 50.0);
    }

    #[test]
    fn grading_is_deterministic() {
        let questions = vec![question(1, QuestionType::MultipleChoice, "Paris")];
        let answers = [answer(1, json!("Paris")), answer(1, json!("Rome"))];
        assert_eq!(grade(&questions, &answers), grade(&questions, &answers));
    }
}
