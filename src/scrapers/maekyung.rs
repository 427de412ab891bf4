//! Maeil Business Newspaper (매일경제) article layout.
//!
//! Article pages on `www.mk.co.kr/news/...` carry the headline in
//! `h2.news_ttl` and the body in
//! `div.news_cnt_detail_wrap[itemprop="articleBody"]`. Image captions,
//! related-news boxes and "read more" links sit inside the body and are
//! skipped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::LayoutAdapter;
use crate::models::Article;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.news_ttl").expect("valid selector"));

static BODY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div.news_cnt_detail_wrap[itemprop="articleBody"]"#).expect("valid selector")
});

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.figure, div.related_news, span.read_more").expect("valid selector")
});

/// Layout adapter for `mk.co.kr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaekyungLayout;

impl LayoutAdapter for MaekyungLayout {
    fn name(&self) -> &'static str {
        "maekyung"
    }

    fn extract(&self, document: &Html) -> Option<Article> {
        let title = document.select(&TITLE).next()?;
        let body = document.select(&BODY).next()?;

        Some(Article {
            title: title_text(title),
            content: body_text(body),
        })
    }
}

/// Every text node trimmed and concatenated.
fn title_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Body text nodes outside the noise blocks, trimmed, one per line.
fn body_text(body: ElementRef<'_>) -> String {
    let noise: HashSet<_> = body.select(&NOISE).map(|e| e.id()).collect();

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            if node.ancestors().any(|a| noise.contains(&a.id())) {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
