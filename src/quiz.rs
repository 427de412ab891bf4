//! Quiz assembly: turn learned words into a four-option vocabulary quiz.
//!
//! One attempt picks a random entry, asks the model for a one-sentence
//! definition, asks for three wrong definitions, validates both and shuffles
//! the options. A rejected attempt is discarded completely and the next one
//! starts from a fresh random pick; nothing carries over between attempts.
//!
//! # Attempt Budget
//!
//! At most [`DEFAULT_MAX_ATTEMPTS`] attempts (configurable) run strictly one
//! after another. Each makes exactly two model calls, so a fully failed
//! request costs `2 * max_attempts` calls and then returns
//! [`QuizError::Exhausted`].

use std::fmt;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{LlmError, QuizError};
use crate::models::{LearnedEntry, Quiz};
use crate::tutor::ExplanationService;
use crate::utils::{looks_truncated, strip_code_fences, truncate_for_log};

/// Attempts made before giving up on a quiz request.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Wrong options per quiz.
pub const DISTRACTOR_COUNT: usize = 3;

/// Why an attempt produced no quiz.
#[derive(Debug)]
pub enum Rejection {
    /// A model call failed.
    Transport(LlmError),
    /// The distractor reply was not JSON.
    Malformed(serde_json::Error),
    /// The JSON had no `distractors` array.
    MissingDistractors,
    /// `distractors` contained something other than a string.
    NonStringDistractor,
    /// `distractors` had the wrong number of entries.
    WrongCount(usize),
    /// The summarized definition was empty.
    EmptyDefinition,
    /// One of the distractors was empty.
    EmptyDistractor,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "model call failed: {e}"),
            Self::Malformed(e) => write!(f, "distractor reply is not JSON: {e}"),
            Self::MissingDistractors => write!(f, "no distractors array in reply"),
            Self::NonStringDistractor => write!(f, "distractor is not a string"),
            Self::WrongCount(n) => write!(f, "expected {DISTRACTOR_COUNT} distractors, got {n}"),
            Self::EmptyDefinition => write!(f, "summarized definition is empty"),
            Self::EmptyDistractor => write!(f, "a distractor is empty"),
        }
    }
}

impl From<LlmError> for Rejection {
    fn from(e: LlmError) -> Self {
        Self::Transport(e)
    }
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Ready(Quiz),
    Rejected(Rejection),
}

/// What one attempt derived before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCandidate {
    pub answer_word: String,
    pub long_definition: String,
    pub canonical_definition: Option<String>,
    pub distractors: Vec<String>,
}

impl QuizCandidate {
    fn new(entry: &LearnedEntry) -> Self {
        Self {
            answer_word: entry.word.clone(),
            long_definition: entry.definition.clone(),
            canonical_definition: None,
            distractors: Vec::new(),
        }
    }

    /// Check the candidate and build a shuffled quiz from it.
    fn assemble<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Quiz, Rejection> {
        let answer = self
            .canonical_definition
            .filter(|d| !d.is_empty())
            .ok_or(Rejection::EmptyDefinition)?;
        if self.distractors.len() != DISTRACTOR_COUNT {
            return Err(Rejection::WrongCount(self.distractors.len()));
        }
        if self.distractors.iter().any(String::is_empty) {
            return Err(Rejection::EmptyDistractor);
        }

        let mut options = self.distractors;
        options.push(answer.clone());
        options.shuffle(rng);

        Ok(Quiz {
            question: self.answer_word,
            options,
            answer,
        })
    }
}

/// Read the `distractors` string array out of a model reply.
///
/// Entries are trimmed. Only the shape is checked here; count and emptiness
/// are checked when the candidate is assembled.
pub fn parse_distractors(raw: &str) -> Result<Vec<String>, Rejection> {
    let value: Value = serde_json::from_str(strip_code_fences(raw)).map_err(|e| {
        if looks_truncated(&e) {
            warn!(error = %e, "Distractor reply looks truncated");
        }
        Rejection::Malformed(e)
    })?;

    let items = value
        .get("distractors")
        .and_then(Value::as_array)
        .ok_or(Rejection::MissingDistractors)?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(|s| s.trim().to_string())
                .ok_or(Rejection::NonStringDistractor)
        })
        .collect()
}

/// Builds quizzes through an [`ExplanationService`].
#[derive(Debug, Clone)]
pub struct QuizAssembler<'a, S> {
    service: &'a S,
    max_attempts: usize,
}

impl<'a, S: ExplanationService> QuizAssembler<'a, S> {
    pub fn new(service: &'a S, max_attempts: usize) -> Self {
        Self {
            service,
            max_attempts,
        }
    }

    /// Produce a quiz from `entries`, or explain why none could be made.
    #[instrument(level = "info", skip_all, fields(entries = entries.len(), max_attempts = self.max_attempts))]
    pub async fn assemble<R: Rng + Send + ?Sized>(
        &self,
        entries: &[LearnedEntry],
        rng: &mut R,
    ) -> Result<Quiz, QuizError> {
        if entries.is_empty() {
            warn!("Quiz requested without any learned entries");
            return Err(QuizError::EmptyInput);
        }

        for attempt in 1..=self.max_attempts {
            let Some(entry) = entries.choose(rng) else {
                return Err(QuizError::EmptyInput);
            };
            match self.attempt(entry, rng).await {
                AttemptOutcome::Ready(quiz) => {
                    info!(attempt, word = %quiz.question, "Quiz assembled");
                    return Ok(quiz);
                }
                AttemptOutcome::Rejected(reason) => {
                    warn!(attempt, word = %entry.word, %reason, "Quiz attempt rejected");
                }
            }
        }

        warn!(attempts = self.max_attempts, "Quiz generation exhausted all attempts");
        Err(QuizError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// One full pass: summarize, generate distractors, validate, shuffle.
    async fn attempt<R: Rng + Send + ?Sized>(
        &self,
        entry: &LearnedEntry,
        rng: &mut R,
    ) -> AttemptOutcome {
        match self.derive(entry).await {
            Ok(candidate) => match candidate.assemble(rng) {
                Ok(quiz) => AttemptOutcome::Ready(quiz),
                Err(reason) => AttemptOutcome::Rejected(reason),
            },
            Err(reason) => AttemptOutcome::Rejected(reason),
        }
    }

    async fn derive(&self, entry: &LearnedEntry) -> Result<QuizCandidate, Rejection> {
        let mut candidate = QuizCandidate::new(entry);

        let summary = self
            .service
            .summarize(&candidate.answer_word, &candidate.long_definition)
            .await?;
        let canonical = summary.trim().to_string();
        debug!(definition = %truncate_for_log(&canonical, 200), "Canonical definition");

        let raw = self
            .service
            .generate_distractors(&candidate.answer_word, &canonical)
            .await?;
        candidate.canonical_definition = Some(canonical);
        candidate.distractors = parse_distractors(&raw)?;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INFLATION_DEFINITION: &str = "A general rise in the price level of goods.";

    /// Replays scripted replies in order and counts calls.
    #[derive(Default)]
    struct ScriptedTutor {
        summaries: Mutex<VecDeque<Result<String, LlmError>>>,
        distractors: Mutex<VecDeque<Result<String, LlmError>>>,
        summarize_calls: AtomicUsize,
        distractor_calls: AtomicUsize,
        seen_words: Mutex<Vec<String>>,
    }

    impl ScriptedTutor {
        fn with_summaries(self, replies: Vec<Result<String, LlmError>>) -> Self {
            *self.summaries.lock().unwrap() = replies.into();
            self
        }

        fn with_distractors(self, replies: Vec<Result<String, LlmError>>) -> Self {
            *self.distractors.lock().unwrap() = replies.into();
            self
        }

        fn calls(&self) -> usize {
            self.summarize_calls.load(Ordering::SeqCst) + self.distractor_calls.load(Ordering::SeqCst)
        }
    }

    impl ExplanationService for ScriptedTutor {
        async fn explain(&self, _word: &str, _context: &str) -> Result<String, LlmError> {
            unreachable!("quiz assembly never explains")
        }

        async fn summarize(&self, word: &str, _long_text: &str) -> Result<String, LlmError> {
            self.summarize_calls.fetch_add(1, Ordering::SeqCst);
            self.seen_words.lock().unwrap().push(word.to_string());
            self.summaries
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(INFLATION_DEFINITION.to_string()))
        }

        async fn generate_distractors(
            &self,
            _word: &str,
            _canonical_definition: &str,
        ) -> Result<String, LlmError> {
            self.distractor_calls.fetch_add(1, Ordering::SeqCst);
            self.distractors
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(three_distractors()))
        }
    }

    fn three_distractors() -> String {
        r#"{"distractors": ["A fall in prices.", "A rise in wages only.", "A tax on imports."]}"#
            .to_string()
    }

    fn two_distractors() -> String {
        r#"{"distractors": ["A fall in prices.", "A tax on imports."]}"#.to_string()
    }

    fn inflation_entries() -> Vec<LearnedEntry> {
        vec![LearnedEntry {
            word: "inflation".to_string(),
            definition: "a long explanatory paragraph about rising prices...".to_string(),
        }]
    }

    fn assert_well_formed(quiz: &Quiz) {
        assert_eq!(quiz.options.len(), 4);
        assert!(quiz.options.iter().all(|o| !o.is_empty()));
        assert!(quiz.options.contains(&quiz.answer));
    }

    #[tokio::test]
    async fn test_inflation_scenario() {
        let tutor = ScriptedTutor::default()
            .with_summaries(vec![Ok(format!("  {INFLATION_DEFINITION}\n"))])
            .with_distractors(vec![Ok(three_distractors())]);
        let mut rng = StdRng::seed_from_u64(7);

        let quiz = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&inflation_entries(), &mut rng)
            .await
            .unwrap();

        assert_eq!(quiz.question, "inflation");
        assert_eq!(quiz.answer, INFLATION_DEFINITION);
        assert_well_formed(&quiz);
        assert_eq!(tutor.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_entries_make_no_calls() {
        let tutor = ScriptedTutor::default();
        let mut rng = StdRng::seed_from_u64(1);

        let result = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&[], &mut rng)
            .await;

        assert_eq!(result, Err(QuizError::EmptyInput));
        assert_eq!(tutor.calls(), 0);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt_with_fresh_data() {
        let tutor = ScriptedTutor::default()
            .with_summaries(vec![
                Ok("first definition".to_string()),
                Ok("second definition".to_string()),
                Ok("third definition".to_string()),
            ])
            .with_distractors(vec![
                Ok(two_distractors()),
                Ok(two_distractors()),
                Ok(three_distractors()),
            ]);
        let mut rng = StdRng::seed_from_u64(42);

        let quiz = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&inflation_entries(), &mut rng)
            .await
            .unwrap();

        assert_eq!(quiz.answer, "third definition");
        assert_well_formed(&quiz);
        assert!(quiz.options.contains(&"A rise in wages only.".to_string()));
        assert!(!quiz.options.contains(&"first definition".to_string()));
        assert_eq!(tutor.summarize_calls.load(Ordering::SeqCst), 3);
        assert_eq!(tutor.distractor_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_stops_after_three_attempts() {
        let tutor = ScriptedTutor::default().with_distractors(vec![
            Ok(two_distractors()),
            Ok("not json at all".to_string()),
            Ok(r#"{"wrong_field": ["a", "b", "c"]}"#.to_string()),
            Ok(three_distractors()),
        ]);
        let mut rng = StdRng::seed_from_u64(3);

        let result = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&inflation_entries(), &mut rng)
            .await;

        assert_eq!(result, Err(QuizError::Exhausted { attempts: 3 }));
        assert_eq!(tutor.calls(), 6);
        // The fourth scripted reply was never requested.
        assert_eq!(tutor.distractors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_consume_attempts() {
        let tutor = ScriptedTutor::default()
            .with_summaries(vec![
                Err(LlmError::EmptyChoices),
                Ok(INFLATION_DEFINITION.to_string()),
            ])
            .with_distractors(vec![Err(LlmError::NotConfigured("OPENAI_API_KEY"))]);
        let mut rng = StdRng::seed_from_u64(5);

        let result = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&inflation_entries(), &mut rng)
            .await;

        // Attempt 1 fails at summarize, attempt 2 at distractors, attempt 3 succeeds.
        let quiz = result.unwrap();
        assert_eq!(quiz.answer, INFLATION_DEFINITION);
        assert_eq!(tutor.summarize_calls.load(Ordering::SeqCst), 3);
        assert_eq!(tutor.distractor_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_definition_is_rejected() {
        let tutor = ScriptedTutor::default().with_summaries(vec![
            Ok("   ".to_string()),
            Ok(String::new()),
            Ok("\n".to_string()),
        ]);
        let mut rng = StdRng::seed_from_u64(9);

        let result = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&inflation_entries(), &mut rng)
            .await;

        assert_eq!(result, Err(QuizError::Exhausted { attempts: 3 }));
        assert_eq!(tutor.calls(), 6);
    }

    #[tokio::test]
    async fn test_empty_distractor_is_rejected() {
        let tutor = ScriptedTutor::default().with_distractors(vec![
            Ok(r#"{"distractors": ["a", "", "c"]}"#.to_string()),
            Ok(three_distractors()),
        ]);
        let mut rng = StdRng::seed_from_u64(11);

        let quiz = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS)
            .assemble(&inflation_entries(), &mut rng)
            .await
            .unwrap();

        assert!(!quiz.options.contains(&String::new()));
        assert_eq!(tutor.distractor_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_word_is_reselected_each_attempt() {
        let entries: Vec<LearnedEntry> = ["금리", "환율", "물가", "채권", "주가"]
            .iter()
            .map(|w| LearnedEntry {
                word: w.to_string(),
                definition: format!("{w}에 대한 긴 설명"),
            })
            .collect();
        let tutor = ScriptedTutor::default();
        let assembler = QuizAssembler::new(&tutor, DEFAULT_MAX_ATTEMPTS);

        // Across several failing requests, selection must not be pinned to one word.
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..10 {
            *tutor.distractors.lock().unwrap() = (0..3).map(|_| Ok(two_distractors())).collect();
            let _ = assembler.assemble(&entries, &mut rng).await;
        }

        let seen = tutor.seen_words.lock().unwrap();
        assert_eq!(seen.len(), 30);
        let distinct: std::collections::HashSet<_> = seen.iter().collect();
        assert!(distinct.len() > 1);
        assert!(seen.iter().all(|w| entries.iter().any(|e| &e.word == w)));
    }

    #[test]
    fn test_answer_position_is_uniform() {
        let trials = 4000;
        let mut counts = [0usize; 4];
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);

        for _ in 0..trials {
            let candidate = QuizCandidate {
                answer_word: "inflation".to_string(),
                long_definition: String::new(),
                canonical_definition: Some("correct".to_string()),
                distractors: vec!["w1".into(), "w2".into(), "w3".into()],
            };
            let quiz = candidate.assemble(&mut rng).unwrap();
            let position = quiz.options.iter().position(|o| o == "correct").unwrap();
            counts[position] += 1;
        }

        // Expected 1000 per slot; allow a generous band.
        for count in counts {
            assert!((850..=1150).contains(&count), "skewed positions: {counts:?}");
        }
    }

    #[test]
    fn test_parse_distractors_shapes() {
        assert_eq!(parse_distractors(&three_distractors()).unwrap().len(), 3);
        assert_eq!(
            parse_distractors("```json\n{\"distractors\": [\"a\", \"b\", \"c\"]}\n```").unwrap(),
            vec!["a", "b", "c"]
        );
        assert!(matches!(parse_distractors("nope"), Err(Rejection::Malformed(_))));
        assert!(matches!(
            parse_distractors(r#"{"distractors": "a, b, c"}"#),
            Err(Rejection::MissingDistractors)
        ));
        assert!(matches!(
            parse_distractors(r#"{"distractors": ["a", 2, "c"]}"#),
            Err(Rejection::NonStringDistractor)
        ));
        assert!(matches!(parse_distractors("[]"), Err(Rejection::MissingDistractors)));
    }

    #[test]
    fn test_candidate_rejects_wrong_count() {
        let candidate = QuizCandidate {
            answer_word: "w".to_string(),
            long_definition: String::new(),
            canonical_definition: Some("d".to_string()),
            distractors: vec!["a".into(), "b".into(), "c".into(), "e".into()],
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(candidate.assemble(&mut rng), Err(Rejection::WrongCount(4))));
    }
}
