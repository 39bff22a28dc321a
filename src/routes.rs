// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{community, health, quiz, result},
    state::AppState,
    utils::identity::USER_ID_HEADER,
};

/// Assembles the main application router.
///
/// * Nests the quiz, result and post routers under `/api`.
/// * Applies global middleware (Trace, CORS).
/// * Injects the shared state (stores, generation client, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
        ]);

    let quiz_routes = Router::new()
        .route("/generate", post(quiz::generate_quiz))
        .route("/user/{user_id}", get(quiz::get_user_quizzes))
        .route("/{quiz_id}", get(quiz::get_quiz))
        .route("/publish/{quiz_id}", post(quiz::publish_quiz))
        .route("/submit/{quiz_id}", post(quiz::submit_answers));

    let result_routes = Router::new().route("/user/{user_id}", get(result::get_user_results));

    let post_routes = Router::new()
        .route("/create", post(community::create_post))
        .route("/feed", get(community::get_feed))
        .route("/user/{user_id}", get(community::get_user_posts));

    Router::new()
        .route("/", get(health::health_check))
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/results", result_routes)
        .nest("/api/posts", post_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
