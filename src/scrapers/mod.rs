//! Article extraction.
//!
//! Fetching and parsing are split so that a change in a site's markup only
//! touches its layout module:
//!
//! 1. **Fetching** ([`HttpArticleExtractor`]): validates the URL, downloads
//!    the page with a browser-like `User-Agent` and a timeout
//! 2. **Parsing** ([`LayoutAdapter`]): applies one site's selectors to the
//!    parsed document
//!
//! # Supported Layouts
//!
//! | Site | Module | Notes |
//! |------|--------|-------|
//! | Maeil Business Newspaper | [`maekyung`] | `mk.co.kr` article pages |
//!
//! A page that loads but does not match the layout yields `Ok(None)`, which
//! usually means the site changed its markup. Network trouble yields
//! `Err(ScrapeError)`.

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::Html;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::Article;

pub mod maekyung;

/// Site-specific knowledge of where the title and body live.
pub trait LayoutAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Pull the article out of a parsed page, or `None` if the expected
    /// elements are missing.
    fn extract(&self, document: &Html) -> Option<Article>;
}

/// Turns a URL into an article.
pub trait ArticleExtractor: Send + Sync {
    fn extract(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Option<Article>, ScrapeError>> + Send;
}

/// Fetches pages over HTTP and hands them to a [`LayoutAdapter`].
#[derive(Debug, Clone)]
pub struct HttpArticleExtractor<L> {
    client: reqwest::Client,
    layout: L,
}

impl<L: LayoutAdapter> HttpArticleExtractor<L> {
    pub fn new(layout: L, config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&config.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(e) => warn!(error = %e, "Configured User-Agent is not a valid header; using reqwest's"),
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, layout })
    }
}

/// Parse `raw` and accept only http(s) URLs.
pub fn parse_article_url(raw: &str) -> Result<Url, ScrapeError> {
    let url = Url::parse(raw.trim()).map_err(|source| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ScrapeError::UnsupportedScheme(other.to_string())),
    }
}

impl<L: LayoutAdapter> ArticleExtractor for HttpArticleExtractor<L> {
    #[instrument(level = "info", skip(self), fields(layout = self.layout.name()))]
    async fn extract(&self, url: &str) -> Result<Option<Article>, ScrapeError> {
        let url = parse_article_url(url)?;

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        info!(%status, "HTTP request status");
        let body = response.error_for_status()?.text().await?;
        debug!(bytes = body.len(), "Downloaded article page");

        let document = Html::parse_document(&body);
        let article = self.layout.extract(&document);
        match &article {
            Some(a) => info!(
                title = %a.title,
                content_chars = a.content.chars().count(),
                "Parsed article"
            ),
            None => warn!(
                %url,
                "Title or body not found; the site layout may have changed"
            ),
        }
        Ok(article)
    }
}
