//! The `ecotutor start` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ecotutor_core::dataset;
use ecotutor_core::session::Session;
use ecotutor_core::summary::SessionSummary;
use ecotutor_core::traits::{RandomSource, RngSource};
use ecotutor_providers::config::load_config_from;
use ecotutor_providers::{create_dialogue, DialogueConfig};

use crate::console::LineConsole;

pub async fn execute(
    dataset_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    seed: Option<u64>,
    small_talk_probability: Option<f64>,
    no_small_talk: bool,
) -> Result<()> {
    // Load config, then let flags override it
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(path) = dataset_path {
        config.dataset = path;
    }
    if let Some(p) = small_talk_probability {
        config.small_talk_probability = p;
    }
    if no_small_talk {
        config.dialogue = DialogueConfig::Disabled;
    }
    config.validate()?;

    // Load the dataset; every record is checked here
    let bank = dataset::load(&config.dataset)
        .with_context(|| format!("cannot start a session from {}", config.dataset.display()))?;
    for w in dataset::validate(&bank) {
        match &w.question_id {
            Some(id) => tracing::warn!("question {id}: {}", w.message),
            None => tracing::warn!("{}", w.message),
        }
    }

    // Create the dialogue backend, falling back to no small talk if the
    // model cannot be prepared
    let mut dialogue = create_dialogue(&config.dialogue)?;
    let wants_small_talk = config.small_talk_probability > 0.0;
    let ready = match (&dialogue, config.model_name()) {
        (Some(d), Some(model)) if wants_small_talk => match d.warm_up(model).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("small talk disabled, {} is not ready: {e:#}", d.name());
                false
            }
        },
        _ => true,
    };
    if !ready || !wants_small_talk {
        dialogue = None;
    }

    let random: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    };

    let mut session = Session::new(&bank, config.session_config()).with_random(random);
    if let Some(d) = dialogue {
        session = session.with_dialogue(d);
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut console = LineConsole::new(stdin.lock(), stdout.lock());

    let summary = session.run(&mut console).await?;
    drop(console);

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    use comfy_table::{Cell, Table};

    if summary.asked() == 0 {
        return;
    }

    let rating = summary.rating();
    println!(
        "\nScore: {}/{} correct (+{} XP)",
        summary.correct(),
        summary.asked(),
        summary.xp()
    );
    println!("{} {}", rating.headline(), rating.encouragement());
    if !summary.completed {
        println!(
            "Session ended early: {} of {} questions answered.",
            summary.asked(),
            summary.total_questions
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Score", "Result"]);

    for (i, outcome) in summary.outcomes.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&outcome.question),
            Cell::new(&outcome.student_answer),
            Cell::new(outcome.score),
            Cell::new(outcome.verdict),
        ]);
    }

    println!("{table}");
}
