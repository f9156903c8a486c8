//! JSON question dataset loader.
//!
//! Loads a question bank from a JSON array file and validates it.

use std::collections::HashSet;
use std::path::Path;

use crate::error::DatasetError;
use crate::model::{QuestionId, QuestionKind, QuestionRecord, RawQuestion};
use crate::similarity::score;

/// Dataset file name used when none is given.
pub const DEFAULT_DATASET_PATH: &str = "enhanced_ai_chatbot_dataset.json";

/// An ordered, validated collection of questions. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    records: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Build a bank from already-validated records, rejecting duplicate ids.
    pub fn new(records: Vec<QuestionRecord>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(DatasetError::DuplicateId(record.id().clone()));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &QuestionId) -> Option<&QuestionRecord> {
        self.records.iter().find(|r| r.id() == id)
    }
}

/// Load a question bank from a JSON file.
pub fn load(path: &Path) -> Result<QuestionBank, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    load_str(&content, path)
}

/// Parse a JSON string into a question bank (useful for testing).
pub fn load_str(content: &str, source_path: &Path) -> Result<QuestionBank, DatasetError> {
    let raw: Vec<RawQuestion> =
        serde_json::from_str(content).map_err(|source| DatasetError::Parse {
            path: source_path.to_path_buf(),
            source,
        })?;

    let records = raw
        .into_iter()
        .enumerate()
        .map(|(index, r)| QuestionRecord::from_raw(r, index))
        .collect::<Result<Vec<_>, _>>()?;

    let bank = QuestionBank::new(records)?;
    tracing::debug!(
        "loaded {} questions from {}",
        bank.len(),
        source_path.display()
    );
    Ok(bank)
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<QuestionId>,
    /// Warning message.
    pub message: String,
}

/// Check a loaded bank for issues that do not stop a session but make it
/// worse.
pub fn validate(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "dataset has no questions; a session will end immediately".into(),
        });
    }

    for record in bank.records() {
        let id = Some(record.id().clone());

        match record.kind() {
            QuestionKind::MultipleChoice => {
                // An answer no option can reach would never score as correct.
                let reachable = record
                    .options()
                    .iter()
                    .any(|o| score(o, record.answer()) == 100);
                if !reachable {
                    warnings.push(ValidationWarning {
                        question_id: id.clone(),
                        message: format!(
                            "answer '{}' is not one of the options",
                            record.answer()
                        ),
                    });
                }
            }
            QuestionKind::Concept => {
                if !record.options().is_empty() {
                    warnings.push(ValidationWarning {
                        question_id: id.clone(),
                        message: "concept question has options; they will not be shown".into(),
                    });
                }
            }
        }

        if record.hint().is_none() {
            warnings.push(ValidationWarning {
                question_id: id,
                message: "no hint provided for near-miss answers".into(),
            });
        }
    }

    warnings
}
