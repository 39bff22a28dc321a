use std::sync::Arc;

use crate::{
    config::Config,
    generation::GenerationClient,
    store::{PostStore, QuizStore},
};

/// Shared handler state. The stores and the generation client are chosen once
/// at startup and injected here.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub posts: Arc<dyn PostStore>,
    pub generator: Arc<dyn GenerationClient>,
    pub config: Config,
}
