// tests/pipeline_tests.rs

mod common;

use common::{ScriptedClient, fenced_reply, quiz_payload};
use serde_json::json;
use studylink::{
    error::AppError,
    generation::{GenerationOptions, NormalizedQuestion, NormalizedQuiz, RawCompletion},
    models::{
        quiz::{FALLBACK_QUIZ_TITLE, GenerateQuizRequest, QuestionType},
        result::SubmittedAnswer,
    },
    services::{grading, quiz},
    store::{MemoryStore, QuizStore},
};

const OWNER: i64 = 1;
const OTHER_USER: i64 = 2;

fn request(prompt: &str) -> GenerateQuizRequest {
    GenerateQuizRequest {
        title: None,
        question_type: QuestionType::MultipleChoice,
        prompt: Some(prompt.to_string()),
        num_questions: None,
    }
}

fn normalized(texts: &[&str]) -> NormalizedQuiz {
    NormalizedQuiz {
        title: "Provided".to_string(),
        questions: texts
            .iter()
            .map(|t| NormalizedQuestion {
                question_text: t.to_string(),
                options: None,
                correct_answer: Some("A".to_string()),
                question_type: QuestionType::Text,
            })
            .collect(),
        failure: None,
    }
}

#[tokio::test]
async fn generate_persists_quiz_and_questions() {
    let store = MemoryStore::new();
    let client = ScriptedClient::replying(fenced_reply(3));

    let created = quiz::generate_quiz(
        &store,
        client.as_ref(),
        &GenerationOptions::default(),
        OWNER,
        request("The capital of France is Paris."),
    )
    .await
    .expect("generation should succeed");

    assert_eq!(created.quiz.title, "Capitals");
    assert_eq!(created.quiz.owner_id, OWNER);
    assert!(!created.quiz.is_published);
    assert_eq!(created.questions.len(), 3);

    let positions: Vec<i32> = created.questions.iter().map(|q| q.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert!(created.questions.iter().all(|q| q.quiz_id == created.quiz.id));

    assert_eq!(store.quiz_count(), 1);
    assert_eq!(store.question_count(), 3);

    let prompt = client.last_prompt().unwrap();
    assert!(prompt.contains("The capital of France is Paris."));
    assert!(prompt.contains("exactly 10 questions"));
}

#[tokio::test]
async fn requested_title_wins_and_count_is_capped() {
    let store = MemoryStore::new();
    let client = ScriptedClient::replying(RawCompletion::Structured(quiz_payload(5)));

    let mut req = request("Source");
    req.title = Some("My Geography Quiz".to_string());
    req.num_questions = Some(2);

    let created = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, req)
        .await
        .unwrap();

    assert_eq!(created.quiz.title, "My Geography Quiz");
    assert_eq!(created.questions.len(), 2);
    assert_eq!(store.question_count(), 2);
}

#[tokio::test]
async fn unparseable_output_is_rejected_without_writes() {
    let store = MemoryStore::new();
    let client = ScriptedClient::replying("Sorry, I can't produce a quiz for that text.");

    let err = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, request("Source"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.quiz_count(), 0);
    assert_eq!(store.question_count(), 0);
}

#[tokio::test]
async fn empty_provider_response_is_generation_error() {
    let store = MemoryStore::new();
    let client = ScriptedClient::replying("");

    let err = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, request("Source"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Generation(_)));
    assert_eq!(store.quiz_count(), 0);
}

#[tokio::test]
async fn provider_failure_aborts_before_any_write() {
    let store = MemoryStore::new();
    let client = ScriptedClient::failing("connection reset");

    let err = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, request("Source"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Generation(_)));
    assert_eq!(client.calls(), 1);
    assert_eq!(store.quiz_count(), 0);
}

#[tokio::test]
async fn missing_prompt_is_input_error_and_provider_is_not_called() {
    let store = MemoryStore::new();
    let client = ScriptedClient::replying(fenced_reply(1));

    let mut req = request("   ");
    let err = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, req)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    req = request("x");
    req.prompt = None;
    let err = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, req)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn failure_on_nth_question_rolls_back_everything() {
    let store = MemoryStore::failing_at_question(2);

    let err = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["a", "b", "c", "d"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InternalServerError(_)));
    assert_eq!(store.quiz_count(), 0);
    assert_eq!(store.question_count(), 0);
    assert!(store.list_quizzes_by_owner(OWNER).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_payload_is_validation_error() {
    let store = MemoryStore::new();

    let err = quiz::create_quiz(&store, OWNER, Some("Title"), QuestionType::Text, &normalized(&[]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.quiz_count(), 0);
}

#[tokio::test]
async fn blank_question_is_validation_error_for_create() {
    let store = MemoryStore::new();

    let err = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["ok", "  "]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.quiz_count(), 0);
}

#[tokio::test]
async fn generate_drops_entries_without_text() {
    let store = MemoryStore::new();
    let client = ScriptedClient::replying(RawCompletion::Structured(json!({
        "questions": [
            { "questionText": "Kept", "options": "A|B", "correctAnswer": "A" },
            { "correctAnswer": "orphan" }
        ]
    })));

    let created = quiz::generate_quiz(&store, client.as_ref(), &GenerationOptions::default(), OWNER, request("Source"))
        .await
        .unwrap();

    assert_eq!(created.quiz.title, FALLBACK_QUIZ_TITLE);
    assert_eq!(created.questions.len(), 1);
    assert_eq!(created.questions[0].question_text, "Kept");
    assert_eq!(
        created.questions[0].options.as_ref().map(|o| o.0.clone()),
        Some(vec!["A".to_string(), "B".to_string()])
    );
}

#[tokio::test]
async fn publish_is_owner_only_and_idempotent() {
    let store = MemoryStore::new();
    let created = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["q1", "q2"]))
        .await
        .unwrap();
    let quiz_id = created.quiz.id;

    let err = quiz::publish_quiz(&store, quiz_id, OTHER_USER).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(!store.find_quiz(quiz_id).await.unwrap().unwrap().is_published);

    let published = quiz::publish_quiz(&store, quiz_id, OWNER).await.unwrap();
    assert!(published.is_published);
    let again = quiz::publish_quiz(&store, quiz_id, OWNER).await.unwrap();
    assert_eq!(published, again);

    assert_eq!(store.find_questions(quiz_id).await.unwrap(), created.questions);

    let err = quiz::publish_quiz(&store, 4242, OWNER).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn non_owner_does_not_see_answers() {
    let store = MemoryStore::new();
    let created = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["q1"]))
        .await
        .unwrap();

    let as_owner = serde_json::to_value(quiz::get_quiz(&store, created.quiz.id, OWNER).await.unwrap()).unwrap();
    assert_eq!(as_owner["questions"][0]["correctAnswer"], "A");

    let as_other =
        serde_json::to_value(quiz::get_quiz(&store, created.quiz.id, OTHER_USER).await.unwrap()).unwrap();
    assert!(as_other["questions"][0].get("correctAnswer").is_none());
    assert_eq!(as_other["questions"][0]["questionText"], "q1");
}

#[tokio::test]
async fn each_submission_creates_a_new_result() {
    let store = MemoryStore::new();
    let created = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["q1", "q2"]))
        .await
        .unwrap();
    let ids: Vec<i64> = created.questions.iter().map(|q| q.id).collect();

    let answers = vec![
        SubmittedAnswer { question_id: Some(ids[0]), answer: json!(" a ") },
        SubmittedAnswer { question_id: Some(ids[1]), answer: json!("b") },
        SubmittedAnswer { question_id: Some(9999), answer: json!("ignored") },
    ];

    let first = grading::grade_and_store(&store, created.quiz.id, OTHER_USER, Some(answers.clone()))
        .await
        .unwrap();
    let second = grading::grade_and_store(&store, created.quiz.id, OTHER_USER, Some(answers))
        .await
        .unwrap();

    assert_eq!(first.result.score, 50.0);
    assert_eq!(first.correct_count, 1);
    assert_eq!(first.total_questions, 2);
    assert_eq!(first.result.answers.0.len(), 2);
    assert_ne!(first.result.id, second.result.id);
    assert_eq!(store.result_count(), 2);

    let history = grading::list_user_results(&store, OTHER_USER).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].quiz.as_ref().map(|q| q.id), Some(created.quiz.id));
}

#[tokio::test]
async fn submission_errors_are_typed() {
    let store = MemoryStore::new();

    let err = grading::grade_and_store(&store, 1, OWNER, Some(vec![])).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let created = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["q1"]))
        .await
        .unwrap();
    let err = grading::grade_and_store(&store, created.quiz.id, OWNER, None).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let empty = grading::grade_and_store(&store, created.quiz.id, OWNER, Some(vec![]))
        .await
        .unwrap();
    assert_eq!(empty.result.score, 0.0);
    assert_eq!(store.result_count(), 1);
}

#[tokio::test]
async fn result_history_surfaces_storage_failures() {
    let store = MemoryStore::new();
    let created = quiz::create_quiz(&store, OWNER, None, QuestionType::Text, &normalized(&["q1"]))
        .await
        .unwrap();
    grading::grade_and_store(&store, created.quiz.id, OTHER_USER, Some(vec![]))
        .await
        .unwrap();

    store.fail_quiz_lookups(true);
    let err = grading::list_user_results(&store, OTHER_USER).await.unwrap_err();
    assert!(matches!(err, AppError::InternalServerError(_)));

    store.fail_quiz_lookups(false);
    let history = grading::list_user_results(&store, OTHER_USER).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].quiz.is_some());
}
