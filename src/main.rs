//! # News Vocab Tutor
//!
//! Backend for a reading assistant: it pulls an article out of a Maeil
//! Business Newspaper page, explains unfamiliar words with an LLM, and turns
//! the words a reader has looked up into multiple-choice review quizzes.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... news_vocab_tutor --config ./tutor.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Scraping** ([`scrapers`]): fetch a page and apply the site layout
//! 2. **Explaining** ([`tutor`]): prompts sent through the chat client in [`api`]
//! 3. **Quizzing** ([`quiz`]): bounded retry loop that validates model output
//! 4. **Serving** ([`server`]): axum routes returning JSON

use std::error::Error;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod quiz;
mod scrapers;
mod server;
mod tutor;
mod utils;

use api::OpenAiClient;
use cli::Cli;
use config::Config;
use scrapers::HttpArticleExtractor;
use scrapers::maekyung::MaekyungLayout;
use server::{AppState, create_router};
use tutor::ModelTutor;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal in production.
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let args = Cli::parse();

    // --- Tracing init ---
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "news_vocab_tutor starting up");
    debug!(dotenv_loaded, config = ?args.config, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let client = OpenAiClient::new(&config.llm)?;
    if !client.is_configured() {
        warn!("OPENAI_API_KEY is not set; chat and quiz requests will return errors");
    }
    debug!(?client, "LLM client ready");

    let state = AppState {
        tutor: ModelTutor::new(client, &config.llm),
        extractor: HttpArticleExtractor::new(MaekyungLayout, &config.scraper)?,
        quiz_attempts: config.quiz.max_attempts,
    };
    let app = create_router(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        %addr,
        origins = ?config.server.allowed_origins,
        llm_timeout = ?config.llm.timeout(),
        scrape_timeout = ?config.scraper.timeout(),
        "Listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
