//! Canned feedback for a scored answer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores at or below this are treated as wrong.
pub const CLOSE_THRESHOLD: u8 = 40;
/// Scores above this are treated as correct.
pub const CORRECT_THRESHOLD: u8 = 75;

/// How an answer was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Close,
    Incorrect,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        if score > CORRECT_THRESHOLD {
            Verdict::Correct
        } else if score > CLOSE_THRESHOLD {
            Verdict::Close
        } else {
            Verdict::Incorrect
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => write!(f, "correct"),
            Verdict::Close => write!(f, "close"),
            Verdict::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// The judged verdict and the line the teacher says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub verdict: Verdict,
    pub message: String,
}

/// Pick the feedback line for `score`.
///
/// The correct answer never appears in the message.
pub fn feedback(
    score: u8,
    student_answer: &str,
    _correct_answer: &str,
    hint: Option<&str>,
) -> Feedback {
    let verdict = Verdict::from_score(score);
    let message = match verdict {
        Verdict::Correct => format!("Excellent! ✅ Your answer '{student_answer}' is correct."),
        Verdict::Close => match hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hint) => format!("You're close! Hint: {hint}"),
            None => {
                "You're close! There's no hint for this one, so give it another thought."
                    .to_string()
            }
        },
        Verdict::Incorrect => "Not quite right. Let's learn this properly.".to_string(),
    };

    Feedback { verdict, message }
}
