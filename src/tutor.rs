//! The explanation service: everything the backend asks a language model.
//!
//! [`ExplanationService`] is the seam the router and the quiz assembler
//! depend on; [`ModelTutor`] implements it over any [`ChatBackend`] with one
//! model per capability. Prompts are Korean because the articles are.

use std::future::Future;

use tracing::{debug, instrument};

use crate::api::{ChatBackend, Completion};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::utils::{clip_chars, truncate_for_log};

/// How much article text accompanies a word explanation request.
pub const CONTEXT_CHAR_LIMIT: usize = 1000;

const EXPLAIN_SYSTEM: &str =
    "너는 어려운 단어를 초등학생도 이해할 수 있게 설명해주는 친절한 AI 선생님이야.";

const SUMMARIZE_SYSTEM: &str = "너는 긴 문장에서 핵심 정의만 추출하여 한 문장으로 요약하는 AI야.";

const DISTRACTOR_SYSTEM: &str = "너는 한국어 어휘 퀴즈의 오답 선택지를 JSON 형식으로 만드는 AI야.";

/// Capabilities backed by a language model.
///
/// Every method is a single attempt. Failures come back as [`LlmError`];
/// deciding whether to retry belongs to the caller.
pub trait ExplanationService: Send + Sync {
    /// Explain `word` as it is used in `context` (article text).
    fn explain(
        &self,
        word: &str,
        context: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Reduce a long explanation of `word` to a one-sentence dictionary
    /// definition, as plain text.
    fn summarize(
        &self,
        word: &str,
        long_text: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Ask for three plausible but wrong definitions of `word`.
    ///
    /// Returns the model's raw text, expected to be a JSON object of the form
    /// `{"distractors": ["…", "…", "…"]}`. Validating it is up to the caller.
    fn generate_distractors(
        &self,
        word: &str,
        canonical_definition: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// [`ExplanationService`] over a chat-completions backend.
#[derive(Debug, Clone)]
pub struct ModelTutor<B> {
    backend: B,
    explain_model: String,
    summarize_model: String,
    distractor_model: String,
}

impl<B: ChatBackend> ModelTutor<B> {
    pub fn new(backend: B, config: &LlmConfig) -> Self {
        Self {
            backend,
            explain_model: config.explain_model.clone(),
            summarize_model: config.summarize_model.clone(),
            distractor_model: config.distractor_model.clone(),
        }
    }
}

fn explain_prompt(word: &str, context: &str) -> String {
    format!(
        "'{word}'라는 단어가 무슨 뜻이야? 이 단어는 아래 뉴스 기사 내용에서 사용되었어.\n---\n{}\n---",
        clip_chars(context, CONTEXT_CHAR_LIMIT)
    )
}

fn summarize_prompt(word: &str, long_text: &str) -> String {
    format!(
        "다음은 '{word}'라는 단어에 대한 설명이야. 이 설명에서 가장 핵심적인 정의만 한 문장으로 간결하게 요약해줘.\n\
         다른 부가 설명이나 예시는 모두 제외하고, 오직 사전적인 정의만 남겨줘.\n\n\
         원본 설명: \"{long_text}\""
    )
}

fn distractor_prompt(word: &str, canonical_definition: &str) -> String {
    format!(
        "'{word}'라는 한국어 단어에 대한 퀴즈의 오답 선택지 3개를 만들어줘.\n\
         정답은 이미 \"{canonical_definition}\"으로 정해져 있어.\n\
         이 정답과 비슷하지만 명백히 틀린, 그럴듯한 오답용 뜻 3개를 리스트 형태로 만들어줘.\n\
         결과는 반드시 아래와 같은 JSON 형식으로만 응답하고, 다른 설명은 절대 추가하지 마.\n\n\
         {{\"distractors\": [\"오답 뜻 1\", \"오답 뜻 2\", \"오답 뜻 3\"]}}"
    )
}

impl<B: ChatBackend> ExplanationService for ModelTutor<B> {
    #[instrument(level = "info", skip(self, context), fields(context_chars = context.chars().count()))]
    async fn explain(&self, word: &str, context: &str) -> Result<String, LlmError> {
        let request = Completion::new(
            self.explain_model.as_str(),
            EXPLAIN_SYSTEM,
            explain_prompt(word, context),
        );
        self.backend.complete(request).await
    }

    #[instrument(level = "info", skip(self, long_text))]
    async fn summarize(&self, word: &str, long_text: &str) -> Result<String, LlmError> {
        let request = Completion::new(
            self.summarize_model.as_str(),
            SUMMARIZE_SYSTEM,
            summarize_prompt(word, long_text),
        );
        let summary = self.backend.complete(request).await?;
        debug!(summary = %truncate_for_log(&summary, 200), "Summarized definition");
        Ok(summary)
    }

    #[instrument(level = "info", skip(self, canonical_definition))]
    async fn generate_distractors(
        &self,
        word: &str,
        canonical_definition: &str,
    ) -> Result<String, LlmError> {
        let request = Completion::new(
            self.distractor_model.as_str(),
            DISTRACTOR_SYSTEM,
            distractor_prompt(word, canonical_definition),
        )
        .json_object();
        let raw = self.backend.complete(request).await?;
        debug!(raw = %truncate_for_log(&raw, 300), "Distractor reply");
        Ok(raw)
    }
}
