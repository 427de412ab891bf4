//! Request and response bodies plus the core quiz data types.
//!
//! - [`LearnedEntry`]: a word the reader asked about, with the explanation they got
//! - [`Quiz`]: a four-option multiple-choice question
//! - [`Article`]: title and body text extracted from a news page
//!
//! The HTTP surface always answers `200 OK`; failures are carried in an
//! [`ErrorBody`] through the untagged [`ApiReply`].

use serde::{Deserialize, Serialize};

/// A word the user has already learned, with the long explanation the
/// chat endpoint produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LearnedEntry {
    /// The word itself.
    pub word: String,
    /// The long-form explanation previously produced for the word.
    pub definition: String,
}

/// A graded multiple-choice question.
///
/// `answer` is always one of `options`, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    /// The word being asked about.
    pub question: String,
    /// Four candidate definitions in random order.
    pub options: Vec<String>,
    /// The correct definition.
    pub answer: String,
}

/// A scraped news article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The headline.
    pub title: String,
    /// Body text, one paragraph per line.
    pub content: String,
}

/// Body of `POST /api/scrape`.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub word: String,
    pub context: String,
}

/// Successful reply of `POST /api/chat`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
}

/// Body of `POST /api/quiz`.
#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub entries: Vec<LearnedEntry>,
}

/// Reply of `GET /`.
#[derive(Debug, Deserialize, Serialize)]
pub struct StatusBody {
    pub status: String,
}

/// Reply of `GET /api/`.
#[derive(Debug, Deserialize, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// Error payload shared by every endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Either a successful payload or an [`ErrorBody`], serialized without a tag
/// so clients see `{...}` or `{"error": ...}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiReply<T> {
    Ok(T),
    Err(ErrorBody),
}

impl<T> ApiReply<T> {
    /// Build the error variant from anything printable.
    pub fn error(message: impl ToString) -> Self {
        ApiReply::Err(ErrorBody {
            error: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_request_deserialization() {
        let json = r#"{
            "entries": [
                {"word": "인플레이션", "definition": "물가가 계속 오르는 현상이에요."},
                {"word": "금리", "definition": "빌린 돈에 붙는 이자의 비율이에요."}
            ]
        }"#;

        let request: QuizRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.entries.len(), 2);
        assert_eq!(request.entries[1].word, "금리");
    }

    #[test]
    fn test_quiz_serialization_field_names() {
        let quiz = Quiz {
            question: "inflation".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: "c".to_string(),
        };

        let value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(value["question"], "inflation");
        assert_eq!(value["options"].as_array().unwrap().len(), 4);
        assert_eq!(value["answer"], "c");
    }

    #[test]
    fn test_api_reply_ok_is_untagged() {
        let reply = ApiReply::Ok(Article {
            title: "Title".to_string(),
            content: "Body".to_string(),
        });

        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"title":"Title","content":"Body"}"#);
    }

    #[test]
    fn test_api_reply_error_shape() {
        let reply: ApiReply<Article> = ApiReply::error("Failed to scrape article");
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"error":"Failed to scrape article"}"#);
    }

    #[test]
    fn test_chat_request_requires_context() {
        let result = serde_json::from_str::<ChatRequest>(r#"{"word": "금리"}"#);
        assert!(result.is_err());
    }
}
