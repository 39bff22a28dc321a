// src/store/memory.rs

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

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

#[derive(Debug, Default)]
struct Tables {
    quizzes: Vec<Quiz>,
    questions: Vec<Question>,
    results: Vec<QuizResult>,
    posts: Vec<Post>,
    quiz_seq: i64,
    question_seq: i64,
    result_seq: i64,
    post_seq: i64,
}

impl Tables {
    fn quiz_exists(&self, quiz_id: i64) -> bool {
        self.quizzes.iter().any(|q| q.id == quiz_id)
    }
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

/// In-process store with the same visibility rules as the database:
/// transactional writes are staged and only published on commit. Sequences
/// advance even for rolled back rows.
///
/// Backs the test suites; `failing_at_question` simulates a storage failure
/// midway through quiz creation and `fail_quiz_lookups` one on reads.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_at_position: Option<i32>,
    fail_lookups: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose transactions fail when inserting the question at
    /// `position` (0-based).
    pub fn failing_at_question(position: i32) -> Self {
        Self {
            fail_at_position: Some(position),
            ..Self::default()
        }
    }

    /// Makes every `find_quiz` on this store and its clones fail while set.
    pub fn fail_quiz_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn quiz_count(&self) -> usize {
        self.tables.lock().map(|t| t.quizzes.len()).unwrap_or(0)
    }

    pub fn question_count(&self) -> usize {
        self.tables.lock().map(|t| t.questions.len()).unwrap_or(0)
    }

    pub fn result_count(&self) -> usize {
        self.tables.lock().map(|t| t.results.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        lock_tables(&self.tables)
    }
}

fn lock_tables(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>, AppError> {
    tables
        .lock()
        .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn QuizTransaction>, AppError> {
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            fail_at_position: self.fail_at_position,
            quizzes: Vec::new(),
            questions: Vec::new(),
        }))
    }

    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(format!(
                "injected failure loading quiz {}",
                quiz_id
            )));
        }
        let tables = self.lock()?;
        Ok(tables.quizzes.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn find_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let tables = self.lock()?;
        let mut questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.position, q.id));
        Ok(questions)
    }

    async fn list_quizzes_by_owner(&self, owner_id: i64) -> Result<Vec<Quiz>, AppError> {
        let tables = self.lock()?;
        let mut quizzes: Vec<Quiz> = tables
            .quizzes
            .iter()
            .filter(|q| q.owner_id == owner_id)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quizzes)
    }

    async fn mark_published(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables
            .quizzes
            .iter_mut()
            .find(|q| q.id == quiz_id)
            .map(|quiz| {
                quiz.is_published = true;
                quiz.clone()
            }))
    }

    async fn insert_result(&self, result: NewResult) -> Result<QuizResult, AppError> {
        let mut tables = self.lock()?;
        if !tables.quiz_exists(result.quiz_id) {
            return Err(AppError::InternalServerError(format!(
                "results.quiz_id references missing quiz {}",
                result.quiz_id
            )));
        }
        if !(0.0..=100.0).contains(&result.score) {
            return Err(AppError::InternalServerError(format!(
                "results.score {} violates check constraint",
                result.score
            )));
        }

        let row = QuizResult {
            id: next_id(&mut tables.result_seq),
            quiz_id: result.quiz_id,
            user_id: result.user_id,
            score: result.score,
            answers: Json(result.answers),
            created_at: Utc::now(),
        };
        tables.results.push(row.clone());
        Ok(row)
    }

    async fn list_results_by_user(&self, user_id: i64) -> Result<Vec<QuizResult>, AppError> {
        let tables = self.lock()?;
        let mut results: Vec<QuizResult> = tables
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(results)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let mut tables = self.lock()?;
        let row = Post {
            id: next_id(&mut tables.post_seq),
            user_id: post.user_id,
            content: post.content,
            hashtags: post.hashtags,
            likes: 0,
            created_at: Utc::now(),
        };
        tables.posts.push(row.clone());
        Ok(row)
    }

    async fn list_posts(
        &self,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Post>, AppError> {
        let tables = self.lock()?;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| before.is_none_or(|cursor| p.created_at < cursor))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(posts)
    }

    async fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, AppError> {
        let tables = self.lock()?;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }
}

/// Staged writes of one memory transaction.
pub struct MemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    fail_at_position: Option<i32>,
    quizzes: Vec<Quiz>,
    questions: Vec<Question>,
}

#[async_trait]
impl QuizTransaction for MemoryTransaction {
    async fn insert_quiz(&mut self, quiz: &NewQuiz) -> Result<Quiz, AppError> {
        let id = next_id(&mut lock_tables(&self.tables)?.quiz_seq);
        let row = Quiz {
            id,
            title: quiz.title.clone(),
            question_type: quiz.question_type,
            owner_id: quiz.owner_id,
            is_published: false,
            created_at: Utc::now(),
        };
        self.quizzes.push(row.clone());
        Ok(row)
    }

    async fn insert_question(&mut self, question: &NewQuestion) -> Result<Question, AppError> {
        if self.fail_at_position == Some(question.position) {
            return Err(AppError::InternalServerError(format!(
                "injected failure inserting question at position {}",
                question.position
            )));
        }

        let staged_parent = self.quizzes.iter().any(|q| q.id == question.quiz_id);
        let mut tables = lock_tables(&self.tables)?;
        if !staged_parent && !tables.quiz_exists(question.quiz_id) {
            return Err(AppError::InternalServerError(format!(
                "questions.quiz_id references missing quiz {}",
                question.quiz_id
            )));
        }
        if self
            .questions
            .iter()
            .any(|q| q.quiz_id == question.quiz_id && q.position == question.position)
        {
            return Err(AppError::InternalServerError(format!(
                "duplicate position {} for quiz {}",
                question.position, question.quiz_id
            )));
        }

        let row = Question {
            id: next_id(&mut tables.question_seq),
            quiz_id: question.quiz_id,
            position: question.position,
            question_text: question.question_text.clone(),
            options: question.options.clone().map(Json),
            correct_answer: question.correct_answer.clone(),
            question_type: question.question_type,
        };
        self.questions.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction {
            tables,
            quizzes,
            questions,
            ..
        } = *self;
        let mut tables = lock_tables(&tables)?;
        tables.quizzes.extend(quizzes);
        tables.questions.extend(questions);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}
