//! End-of-session results: per-question outcomes, XP, and a rating.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::Verdict;
use crate::model::QuestionId;

/// XP awarded per correct answer.
pub const XP_PER_CORRECT: u32 = 10;

/// How one asked question went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub id: QuestionId,
    pub question: String,
    pub student_answer: String,
    pub score: u8,
    pub verdict: Verdict,
}

/// Overall rating shown at the end of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Perfect,
    Excellent,
    Good,
    KeepLearning,
}

impl Rating {
    /// Rate `correct` out of `asked`. Nothing asked rates as
    /// [`Rating::KeepLearning`].
    pub fn from_counts(correct: usize, asked: usize) -> Self {
        if asked == 0 {
            return Rating::KeepLearning;
        }
        if correct >= asked {
            return Rating::Perfect;
        }
        let ratio = correct as f64 / asked as f64;
        if ratio >= 0.8 {
            Rating::Excellent
        } else if ratio >= 0.6 {
            Rating::Good
        } else {
            Rating::KeepLearning
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Rating::Perfect => "Perfect Score! 🌟",
            Rating::Excellent => "Excellent Work! 🌱",
            Rating::Good => "Good Job! 🍃",
            Rating::KeepLearning => "Keep Learning! 🌿",
        }
    }

    pub fn encouragement(&self) -> &'static str {
        match self {
            Rating::Perfect => "You're a true environmental champion!",
            Rating::Excellent => "Your environmental knowledge is impressive!",
            Rating::Good => "You're on the right track to becoming eco-conscious!",
            Rating::KeepLearning => "Every step counts in protecting our planet!",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

/// Everything a finished (or interrupted) session produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Questions in the bank.
    pub total_questions: usize,
    /// Outcomes in the order the questions were asked.
    pub outcomes: Vec<QuestionOutcome>,
    /// Small-talk replies that were shown.
    pub small_talk_turns: usize,
    /// Small-talk attempts skipped because the model failed.
    pub small_talk_failures: usize,
    /// `false` when input ended before the bank was exhausted.
    pub completed: bool,
}

impl SessionSummary {
    pub fn asked(&self) -> usize {
        self.outcomes.len()
    }

    pub fn correct(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Correct)
            .count()
    }

    pub fn xp(&self) -> u32 {
        self.correct() as u32 * XP_PER_CORRECT
    }

    pub fn rating(&self) -> Rating {
        Rating::from_counts(self.correct(), self.asked())
    }

    /// Mean similarity score over asked questions, 0 when none were asked.
    pub fn average_score(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let total: u32 = self.outcomes.iter().map(|o| o.score as u32).sum();
        total as f64 / self.outcomes.len() as f64
    }
}
