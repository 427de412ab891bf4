//! HTTP API.
//!
//! # Endpoints
//!
//! - `GET /` - liveness probe
//! - `GET /api/` - secondary liveness probe
//! - `POST /api/scrape` - extract an article from a news URL
//! - `POST /api/chat` - explain a word in the context of the article
//! - `POST /api/quiz` - build a multiple-choice quiz from learned words
//!
//! Every handled request answers `200 OK`. Failures are reported in the
//! body as `{"error": "..."}` so the browser client has a single code path.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::models::{
    ApiReply, Article, ChatAnswer, ChatRequest, MessageBody, Quiz, QuizRequest, ScrapeRequest,
    StatusBody,
};
use crate::quiz::QuizAssembler;
use crate::scrapers::ArticleExtractor;
use crate::tutor::ExplanationService;

/// Shared, read-only state handed to every handler.
#[derive(Debug)]
pub struct AppState<S, E> {
    /// Language-model capabilities.
    pub tutor: S,
    /// Article fetching.
    pub extractor: E,
    /// Attempt budget for `POST /api/quiz`.
    pub quiz_attempts: usize,
}

impl<T: Serialize> IntoResponse for ApiReply<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// CORS for an explicit origin allow-list. Methods and headers are mirrored
/// from the preflight so credentials can be allowed.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Creates the HTTP router with all endpoints, CORS and request tracing.
pub fn create_router<S, E>(state: AppState<S, E>, allowed_origins: &[String]) -> Router
where
    S: ExplanationService + 'static,
    E: ArticleExtractor + 'static,
{
    Router::new()
        .route("/", get(handle_root))
        .route("/api/", get(handle_api_root))
        .route("/api/scrape", post(handle_scrape::<S, E>))
        .route("/api/chat", post(handle_chat::<S, E>))
        .route("/api/quiz", post(handle_quiz::<S, E>))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(Arc::new(state))
}

async fn handle_root() -> Json<StatusBody> {
    Json(StatusBody {
        status: "Backend server is running!".to_string(),
    })
}

async fn handle_api_root() -> Json<MessageBody> {
    Json(MessageBody {
        message: "API server is working!".to_string(),
    })
}

/// Handler for `POST /api/scrape`.
async fn handle_scrape<S, E>(
    State(state): State<Arc<AppState<S, E>>>,
    Json(request): Json<ScrapeRequest>,
) -> ApiReply<Article>
where
    S: ExplanationService,
    E: ArticleExtractor,
{
    info!(url = %request.url, "Scrape requested");
    match state.extractor.extract(&request.url).await {
        Ok(Some(article)) => ApiReply::Ok(article),
        Ok(None) => ApiReply::error("Failed to scrape article"),
        Err(e) => {
            error!(url = %request.url, error = %e, "Scrape failed");
            ApiReply::error(format!("Failed to scrape article: {e}"))
        }
    }
}

/// Handler for `POST /api/chat`.
async fn handle_chat<S, E>(
    State(state): State<Arc<AppState<S, E>>>,
    Json(request): Json<ChatRequest>,
) -> ApiReply<ChatAnswer>
where
    S: ExplanationService,
    E: ArticleExtractor,
{
    info!(word = %request.word, "Explanation requested");
    match state.tutor.explain(&request.word, &request.context).await {
        Ok(answer) => ApiReply::Ok(ChatAnswer { answer }),
        Err(e) => {
            error!(word = %request.word, error = %e, "Explanation failed");
            ApiReply::error(format!("OpenAI API Error: {e}"))
        }
    }
}

/// Handler for `POST /api/quiz`.
async fn handle_quiz<S, E>(
    State(state): State<Arc<AppState<S, E>>>,
    Json(request): Json<QuizRequest>,
) -> ApiReply<Quiz>
where
    S: ExplanationService,
    E: ArticleExtractor,
{
    info!(entries = request.entries.len(), "Quiz requested");
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let assembler = QuizAssembler::new(&state.tutor, state.quiz_attempts);
    match assembler.assemble(&request.entries, &mut rng).await {
        Ok(quiz) => ApiReply::Ok(quiz),
        Err(e) => ApiReply::error(e),
    }
}
