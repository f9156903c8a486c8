//! The `ecotutor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use ecotutor_core::dataset;
use ecotutor_core::model::QuestionKind;
use ecotutor_providers::config::load_config_from;

pub fn execute(dataset_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let path = match dataset_path {
        Some(p) => p,
        None => load_config_from(config_path.as_deref())?.dataset,
    };

    let bank = dataset::load(&path)?;
    let concept = bank
        .records()
        .iter()
        .filter(|r| r.kind() == QuestionKind::Concept)
        .count();
    println!(
        "Dataset: {} ({} questions: {} concept, {} multiple-choice)",
        path.display(),
        bank.len(),
        concept,
        bank.len() - concept
    );

    let warnings = dataset::validate(&bank);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Dataset valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
