//! Capability traits the session loop is built on.
//!
//! A dialogue model for small talk, a source of randomness, and a console.
//! The dialogue trait is implemented by `ecotutor-providers`; the console by
//! the CLI.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dialogue model trait
// ---------------------------------------------------------------------------

/// Trait for pretrained conversational models that produce small talk.
#[async_trait]
pub trait DialogueModel: Send + Sync {
    /// Human-readable backend name (e.g. "ollama").
    fn name(&self) -> &str;

    /// Make sure `model` is available before the session starts, fetching it
    /// if the backend supports that.
    async fn warm_up(&self, _model: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Produce one reply to `request.prompt`.
    async fn reply(&self, request: &ReplyRequest) -> anyhow::Result<ReplyResponse>;
}

/// Request for a single conversational reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    /// Model identifier (e.g. "qwen2.5:0.5b").
    pub model: String,
    /// Conversation so far, ending where the model should continue.
    pub prompt: String,
    /// Marker appended to the prompt to close the speaker's turn.
    pub end_of_turn: String,
    /// Decoding settings.
    #[serde(default)]
    pub sampling: SamplingParams,
}

/// Stochastic decoding settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sample from the `top_k` most likely tokens.
    pub top_k: u32,
    /// Nucleus sampling mass.
    pub top_p: f64,
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            top_k: 50,
            top_p: 0.95,
            max_new_tokens: 50,
        }
    }
}

/// A generated reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResponse {
    /// Newly generated text only, cleaned with [`clean_reply`].
    pub text: String,
    /// Model that actually generated the reply.
    pub model: String,
    /// Number of tokens generated, when the backend reports it.
    #[serde(default)]
    pub generated_tokens: Option<u32>,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Default small-talk prompt.
pub const DEFAULT_SMALL_TALK_PROMPT: &str = "Student: Hi\nTeacher:";

/// Default small-talk model, as named in the Ollama library.
pub const DEFAULT_DIALOGUE_MODEL: &str = "qwen2.5:0.5b";

/// Default end-of-turn marker. Qwen2.5 keeps the GPT-2 style end-of-text
/// token as its document separator.
pub const DEFAULT_END_OF_TURN: &str = "<|endoftext|>";

/// Trim a raw continuation down to the teacher's single turn.
///
/// Drops anything after the first end-of-turn marker, and anything after the
/// model starts writing the student's next line.
pub fn clean_reply(raw: &str, end_of_turn: &str) -> String {
    let mut text = raw;

    if !end_of_turn.is_empty() {
        // A leading marker is an echo of the one we sent.
        text = text.trim_start().trim_start_matches(end_of_turn);
        if let Some(pos) = text.find(end_of_turn) {
            text = &text[..pos];
        }
    }

    if let Some(pos) = text.find("Student:") {
        text = &text[..pos];
    }

    let text = text.trim();
    text.strip_prefix("Teacher:").unwrap_or(text).trim().to_string()
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Source of the session's random choices.
pub trait RandomSource: Send {
    /// Pick an index uniformly from `0..n`. `n` is always at least 1.
    fn choose(&mut self, n: usize) -> usize;

    /// A uniform draw from `[0, 1)`.
    fn roll(&mut self) -> f64;
}

/// [`RandomSource`] backed by any `rand` generator.
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ChaCha8Rng> {
    /// Seeded from the OS; draw order differs on every run.
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }

    /// Same seed, same draw order.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn choose(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Line-oriented conversation with the student.
pub trait Console {
    /// Print one line.
    fn say(&mut self, line: &str) -> anyhow::Result<()>;

    /// Show `prompt` and wait for one line of input. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;
}
