//! Core data model types for ecotutor.
//!
//! Question records are only ever built through [`QuestionRecord::from_raw`],
//! which checks the whole schema up front so a bad record fails the load
//! instead of surfacing mid-session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DatasetError;

/// Identifier of a question. Datasets may use JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "IdRepr")]
pub struct QuestionId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Text(String),
}

impl From<IdRepr> for QuestionId {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Int(n) => QuestionId(n.to_string()),
            IdRepr::Text(s) => QuestionId(s),
        }
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        QuestionId(s.to_string())
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        QuestionId(n.to_string())
    }
}

impl QuestionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two kinds of question a dataset can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Concept,
    MultipleChoice,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Concept => write!(f, "concept"),
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concept" => Ok(QuestionKind::Concept),
            "multiple-choice" | "multiple_choice" | "mcq" => Ok(QuestionKind::MultipleChoice),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// A question object exactly as it appears in the dataset file.
///
/// Everything except `id` is optional here so that [`QuestionRecord::from_raw`]
/// can report which field is missing and on which record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: Option<QuestionId>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A validated, immutable quiz item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: QuestionKind,
    question: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    explanation: String,
}

impl QuestionRecord {
    /// Validate a raw record. `index` is its position in the file and only
    /// used for error reporting.
    pub fn from_raw(raw: RawQuestion, index: usize) -> Result<Self, DatasetError> {
        let id = raw
            .id
            .ok_or_else(|| invalid(index, QuestionId(format!("#{index}")), "missing id"))?;

        let kind: QuestionKind = match raw.kind.as_deref() {
            Some(k) => k.parse().map_err(|e: String| invalid(index, id.clone(), &e))?,
            None => return Err(invalid(index, id, "missing type")),
        };

        let question = required(raw.question, "question", index, &id)?;
        let answer = required(raw.answer, "answer", index, &id)?;
        let explanation = required(raw.explanation, "explanation", index, &id)?;

        let options: Vec<String> = raw
            .options
            .unwrap_or_default()
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if kind == QuestionKind::MultipleChoice && options.is_empty() {
            return Err(invalid(index, id, "multiple-choice question has no options"));
        }

        let hint = raw
            .hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        Ok(Self {
            id,
            kind,
            question,
            options,
            answer,
            hint,
            explanation,
        })
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Answer options. Empty for concept questions.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// The question as the teacher says it, with options appended for
    /// multiple-choice items.
    pub fn prompt_text(&self) -> String {
        match self.kind {
            QuestionKind::Concept => self.question.clone(),
            QuestionKind::MultipleChoice => {
                format!("{} Options: {}", self.question, self.options.join(", "))
            }
        }
    }
}

fn invalid(index: usize, id: QuestionId, reason: &str) -> DatasetError {
    DatasetError::InvalidRecord {
        index,
        id,
        reason: reason.to_string(),
    }
}

fn required(
    value: Option<String>,
    field: &str,
    index: usize,
    id: &QuestionId,
) -> Result<String, DatasetError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        Some(_) => Err(invalid(index, id.clone(), &format!("{field} is empty"))),
        None => Err(invalid(index, id.clone(), &format!("missing {field}"))),
    }
}
