// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::{Value, json};
use studylink::{
    config::{Config, GeminiConfig},
    error::AppError,
    generation::{GenerationClient, GenerationOptions, RawCompletion},
    routes,
    state::AppState,
    store::MemoryStore,
};

/// Generation client that replays a fixed reply and records its calls.
pub struct ScriptedClient {
    reply: Result<RawCompletion, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedClient {
    pub fn replying(reply: impl Into<RawCompletion>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn complete(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<RawCompletion, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().map_err(AppError::Generation)
    }
}

/// A well-formed provider payload with `count` multiple-choice questions.
pub fn quiz_payload(count: usize) -> Value {
    let questions: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "questionText": format!("What is the capital of country {}?", i),
                "options": ["Paris", "Rome", "Oslo"],
                "correctAnswer": "Paris",
                "type": "multiple-choice"
            })
        })
        .collect();

    json!({ "title": "Capitals", "questions": questions })
}

/// The same payload as a chatty, fenced text reply.
pub fn fenced_reply(count: usize) -> String {
    format!(
        "Here is the quiz you asked for:\n```json\n{}\n```\nGood luck!",
        serde_json::to_string_pretty(&quiz_payload(count)).unwrap()
    )
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        rust_log: "error".to_string(),
        port: 0,
        gemini: GeminiConfig::default(),
    }
}

/// Spawns the app on a random port and returns its base URL.
pub async fn spawn_app(store: MemoryStore, generator: Arc<ScriptedClient>) -> String {
    let store = Arc::new(store);
    let state = AppState {
        store: store.clone(),
        posts: store,
        generator,
        config: test_config(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}
