//! The tutoring session loop.
//!
//! A session walks through the states
//! `Idle → (SmallTalk) → AskQuestion → AwaitAnswer → GiveFeedback → Idle`
//! until every question has been asked once, then ends in `Done`.
//! All session state lives on [`Session`] and starts empty.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;

use crate::dataset::QuestionBank;
use crate::error::DialogueError;
use crate::feedback::feedback;
use crate::model::{QuestionId, QuestionRecord};
use crate::similarity::score;
use crate::summary::{QuestionOutcome, SessionSummary};
use crate::traits::{
    Console, DialogueModel, RandomSource, ReplyRequest, RngSource, SamplingParams,
    DEFAULT_DIALOGUE_MODEL, DEFAULT_END_OF_TURN, DEFAULT_SMALL_TALK_PROMPT,
};

pub const GREETING: &str = "🤖 AI Teacher: Hello! Welcome to today's lesson.";
pub const CLOSING: &str = "🤖 AI Teacher: That's all for today! Great job! 🎉 Keep practicing!";
pub const ANSWER_PROMPT: &str = "You: ";

/// Small-talk settings.
#[derive(Debug, Clone)]
pub struct SmallTalkConfig {
    /// Chance of small talk before each question, in `[0, 1]`.
    pub probability: f64,
    /// Prompt sent to the dialogue model.
    pub prompt: String,
    /// Model identifier passed to the backend.
    pub model: String,
    /// End-of-turn marker appended to the prompt.
    pub end_of_turn: String,
    /// Decoding settings.
    pub sampling: SamplingParams,
}

impl Default for SmallTalkConfig {
    fn default() -> Self {
        Self {
            probability: 0.3,
            prompt: DEFAULT_SMALL_TALK_PROMPT.to_string(),
            model: DEFAULT_DIALOGUE_MODEL.to_string(),
            end_of_turn: DEFAULT_END_OF_TURN.to_string(),
            sampling: SamplingParams::default(),
        }
    }
}

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub small_talk: SmallTalkConfig,
    /// Print "(Question n of m)" before each question.
    pub show_progress: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            small_talk: SmallTalkConfig::default(),
            show_progress: true,
        }
    }
}

/// Append-only transcript of the session.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    text: String,
    turns: usize,
}

impl ConversationHistory {
    pub fn teacher(&mut self, line: &str) {
        self.push("Teacher", line);
    }

    pub fn student(&mut self, line: &str) {
        self.push("Student", line);
    }

    fn push(&mut self, speaker: &str, line: &str) {
        self.text.push_str(speaker);
        self.text.push_str(": ");
        self.text.push_str(line);
        self.text.push('\n');
        self.turns += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of lines appended.
    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns == 0
    }
}

enum Step<'a> {
    Idle,
    SmallTalk,
    AskQuestion,
    AwaitAnswer(&'a QuestionRecord),
    GiveFeedback(&'a QuestionRecord, String),
    Done,
}

/// One run through a question bank.
pub struct Session<'a> {
    bank: &'a QuestionBank,
    config: SessionConfig,
    dialogue: Option<Arc<dyn DialogueModel>>,
    random: Box<dyn RandomSource>,
    used_ids: HashSet<QuestionId>,
    history: ConversationHistory,
    outcomes: Vec<QuestionOutcome>,
    small_talk_turns: usize,
    small_talk_failures: usize,
    finished: bool,
}

impl<'a> Session<'a> {
    /// A session with no dialogue model and OS-seeded randomness.
    pub fn new(bank: &'a QuestionBank, config: SessionConfig) -> Self {
        Self {
            bank,
            config,
            dialogue: None,
            random: Box::new(RngSource::from_entropy()),
            used_ids: HashSet::new(),
            history: ConversationHistory::default(),
            outcomes: Vec::new(),
            small_talk_turns: 0,
            small_talk_failures: 0,
            finished: false,
        }
    }

    /// Attach a dialogue model. Without one there is no small talk.
    pub fn with_dialogue(mut self, dialogue: Arc<dyn DialogueModel>) -> Self {
        self.dialogue = Some(dialogue);
        self
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Ids asked so far.
    pub fn used_ids(&self) -> &HashSet<QuestionId> {
        &self.used_ids
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run the session to completion, or until the console runs out of input.
    pub async fn run(&mut self, console: &mut dyn Console) -> Result<SessionSummary> {
        anyhow::ensure!(!self.finished, "session has already run");

        let started_at = Utc::now();
        let start = Instant::now();
        let mut completed = true;

        tracing::info!("session started with {} questions", self.bank.len());
        console.say(GREETING)?;
        console.say("")?;

        let mut step = Step::Idle;
        loop {
            step = match step {
                Step::Idle => {
                    if self.wants_small_talk() {
                        Step::SmallTalk
                    } else {
                        Step::AskQuestion
                    }
                }
                Step::SmallTalk => {
                    self.small_talk(console).await?;
                    Step::AskQuestion
                }
                Step::AskQuestion => match self.next_question() {
                    Some(record) => {
                        self.ask(console, record)?;
                        Step::AwaitAnswer(record)
                    }
                    None => Step::Done,
                },
                Step::AwaitAnswer(record) => match console.ask(ANSWER_PROMPT)? {
                    Some(answer) => Step::GiveFeedback(record, answer),
                    None => {
                        tracing::info!("input closed after {} questions", self.outcomes.len());
                        completed = false;
                        break;
                    }
                },
                Step::GiveFeedback(record, answer) => {
                    self.give_feedback(console, record, answer)?;
                    Step::Idle
                }
                Step::Done => {
                    console.say(CLOSING)?;
                    break;
                }
            };
        }

        self.finished = true;
        let summary = SessionSummary {
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            total_questions: self.bank.len(),
            outcomes: self.outcomes.clone(),
            small_talk_turns: self.small_talk_turns,
            small_talk_failures: self.small_talk_failures,
            completed,
        };
        tracing::info!(
            "session finished: {}/{} correct",
            summary.correct(),
            summary.asked()
        );
        Ok(summary)
    }

    fn wants_small_talk(&mut self) -> bool {
        if self.dialogue.is_none() {
            return false;
        }
        self.random.roll() < self.config.small_talk.probability
    }

    async fn small_talk(&mut self, console: &mut dyn Console) -> Result<()> {
        let Some(dialogue) = self.dialogue.clone() else {
            return Ok(());
        };

        let cfg = &self.config.small_talk;
        let request = ReplyRequest {
            model: cfg.model.clone(),
            prompt: cfg.prompt.clone(),
            end_of_turn: cfg.end_of_turn.clone(),
            sampling: cfg.sampling,
        };

        let reply = match dialogue.reply(&request).await {
            Ok(response) if response.text.trim().is_empty() => Err(DialogueError::EmptyReply.into()),
            other => other,
        };

        match reply {
            Ok(response) => {
                tracing::debug!(
                    "small talk from {} in {}ms",
                    dialogue.name(),
                    response.latency_ms
                );
                console.say(&format!("Teacher (small talk): {}", response.text))?;
                console.say("")?;
                self.history.teacher(&response.text);
                self.small_talk_turns += 1;
            }
            Err(e) => {
                tracing::warn!("skipping small talk, {} failed: {e:#}", dialogue.name());
                self.small_talk_failures += 1;
            }
        }
        Ok(())
    }

    /// Pick an unused question uniformly at random and mark it used.
    fn next_question(&mut self) -> Option<&'a QuestionRecord> {
        let bank: &'a QuestionBank = self.bank;
        let remaining: Vec<&'a QuestionRecord> = bank
            .records()
            .iter()
            .filter(|r| !self.used_ids.contains(r.id()))
            .collect();

        if remaining.is_empty() {
            return None;
        }

        let record = remaining[self.random.choose(remaining.len())];
        self.used_ids.insert(record.id().clone());
        tracing::debug!(
            "selected question {} ({} remaining)",
            record.id(),
            remaining.len() - 1
        );
        Some(record)
    }

    fn ask(&mut self, console: &mut dyn Console, record: &QuestionRecord) -> Result<()> {
        if self.config.show_progress {
            console.say(&format!(
                "(Question {} of {})",
                self.used_ids.len(),
                self.bank.len()
            ))?;
        }
        console.say(&format!("Teacher: {}", record.prompt_text()))
    }

    fn give_feedback(
        &mut self,
        console: &mut dyn Console,
        record: &QuestionRecord,
        answer: String,
    ) -> Result<()> {
        let score = score(&answer, record.answer());
        let fb = feedback(score, &answer, record.answer(), record.hint());
        tracing::debug!("question {} scored {score} ({})", record.id(), fb.verdict);

        console.say(&format!("Teacher: {}", fb.message))?;
        console.say(&format!(
            "Teacher: Here's more about it: {}",
            record.explanation()
        ))?;
        console.say("")?;

        self.history.teacher(record.question());
        self.history.student(&answer);
        self.outcomes.push(QuestionOutcome {
            id: record.id().clone(),
            question: record.question().to_string(),
            student_answer: answer,
            score,
            verdict: fb.verdict,
        });
        Ok(())
    }
}
