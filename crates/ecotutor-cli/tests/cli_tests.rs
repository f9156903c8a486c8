//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ecotutor_core::traits::DEFAULT_DIALOGUE_MODEL;

const ONE_QUESTION: &str = r#"[{"id": 1, "type": "concept", "question": "What is 2+2?",
  "answer": "four", "hint": "count on fingers", "explanation": "Addition basics."}]"#;

const TWO_QUESTIONS: &str = r#"[
  {"id": 1, "type": "concept", "question": "What is 2+2?",
   "answer": "four", "hint": "count on fingers", "explanation": "Addition basics."},
  {"id": 2, "type": "multiple-choice", "question": "Which gas do plants absorb?",
   "options": ["Oxygen", "Carbon dioxide"], "answer": "Carbon dioxide",
   "hint": "You breathe it out.", "explanation": "Photosynthesis uses CO2."}
]"#;

const CLOSING: &str = "That's all for today! Great job! 🎉 Keep practicing!";

/// Runs in `dir` with HOME pointed there too, so no user config leaks in.
fn ecotutor(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("ecotutor").unwrap();
    cmd.current_dir(dir).env("HOME", dir).env_remove("RUST_LOG");
    cmd
}

fn write_dataset(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("questions.json");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn correct_answer_session() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--no-small-talk")
        .write_stdin("four\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello! Welcome to today's lesson."))
        .stdout(predicate::str::contains("Teacher: What is 2+2?"))
        .stdout(predicate::str::contains(
            "Excellent! ✅ Your answer 'four' is correct.",
        ))
        .stdout(predicate::str::contains(
            "Teacher: Here's more about it: Addition basics.",
        ))
        .stdout(predicate::str::contains(CLOSING))
        .stdout(predicate::str::contains("Score: 1/1 correct (+10 XP)"))
        .stdout(predicate::str::contains("Perfect Score!"));
}

#[test]
fn empty_answer_session() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--no-small-talk")
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not quite right."))
        .stdout(predicate::str::contains("Addition basics."))
        .stdout(predicate::str::contains("four").not())
        .stdout(predicate::str::contains("Score: 0/1 correct"));
}

#[test]
fn seeded_session_asks_both_questions() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, TWO_QUESTIONS);

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--no-small-talk")
        .arg("--seed")
        .arg("42")
        .write_stdin("no idea\nno idea\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Teacher: What is 2+2?"))
        .stdout(predicate::str::contains(
            "Which gas do plants absorb? Options: Oxygen, Carbon dioxide",
        ))
        .stdout(predicate::str::contains("(Question 2 of 2)"))
        .stdout(predicate::str::contains(CLOSING));
}

#[test]
fn mock_small_talk_from_config() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);
    let config = dir.path().join("custom.toml");
    std::fs::write(
        &config,
        "small_talk_probability = 1.0\n[dialogue]\ntype = \"mock\"\nreplies = [\"Lovely weather today!\"]\n",
    )
    .unwrap();

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--config")
        .arg(&config)
        .write_stdin("four\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Teacher (small talk): Lovely weather today!",
        ))
        .stdout(predicate::str::contains("Excellent!"));
}

#[test]
fn failing_small_talk_keeps_going() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);
    let config = dir.path().join("ecotutor.toml");
    std::fs::write(
        &config,
        "small_talk_probability = 1.0\n[dialogue]\ntype = \"mock\"\n",
    )
    .unwrap();

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .write_stdin("four\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("small talk").not())
        .stdout(predicate::str::contains(CLOSING))
        .stderr(predicate::str::contains("skipping small talk"));
}

#[test]
fn unreachable_model_disables_small_talk() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);
    let config = dir.path().join("ecotutor.toml");
    std::fs::write(
        &config,
        "small_talk_probability = 1.0\n[dialogue]\ntype = \"ollama\"\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n",
    )
    .unwrap();

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .env_remove("ECOTUTOR_OLLAMA_URL")
        .write_stdin("four\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(CLOSING))
        .stderr(predicate::str::contains("small talk disabled"));
}

#[tokio::test(flavor = "multi_thread")]
async fn default_model_is_pulled_and_chats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"models": []}"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_string_contains(DEFAULT_DIALOGUE_MODEL))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "success"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains(DEFAULT_DIALOGUE_MODEL))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"model": "qwen2.5:0.5b", "response": " Nice to see you again!<|endoftext|>"}"#,
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);
    // No model set, so the built-in default is used
    std::fs::write(
        dir.path().join("ecotutor.toml"),
        format!(
            "small_talk_probability = 1.0\n[dialogue]\ntype = \"ollama\"\nbase_url = \"{}\"\n",
            server.uri()
        ),
    )
    .unwrap();

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .env_remove("ECOTUTOR_OLLAMA_URL")
        .env_remove("ECOTUTOR_MODEL")
        .write_stdin("four\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Teacher (small talk): Nice to see you again!",
        ))
        .stdout(predicate::str::contains(CLOSING))
        .stderr(predicate::str::contains("pulling model"))
        .stderr(predicate::str::contains("small talk disabled").not());
}

#[test]
fn closed_input_ends_early() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, TWO_QUESTIONS);

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--no-small-talk")
        .write_stdin("four\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(CLOSING).not())
        .stdout(predicate::str::contains("Session ended early"));
}

#[test]
fn empty_dataset_ends_immediately() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, "[]");

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--no-small-talk")
        .assert()
        .success()
        .stdout(predicate::str::contains(CLOSING))
        .stdout(predicate::str::contains("You: ").not());
}

#[test]
fn missing_dataset_fails() {
    let dir = TempDir::new().unwrap();

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg("nonexistent.json")
        .arg("--no-small-talk")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("failed to read dataset"));
}

#[test]
fn malformed_record_fails_before_any_question() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(
        &dir,
        r#"[{"id": 1, "type": "concept", "question": "Q?", "explanation": "e"}]"#,
    );

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--no-small-talk")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Welcome").not())
        .stderr(predicate::str::contains("missing answer"));
}

#[test]
fn probability_out_of_range_fails() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, ONE_QUESTION);

    ecotutor(dir.path())
        .arg("start")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--small-talk-probability")
        .arg("1.5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("small_talk_probability"));
}

#[test]
fn validate_valid_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(&dir, TWO_QUESTIONS);

    ecotutor(dir.path())
        .arg("validate")
        .arg("--dataset")
        .arg(&dataset)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2 questions: 1 concept, 1 multiple-choice",
        ))
        .stdout(predicate::str::contains("Dataset valid."));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(
        &dir,
        r#"[{"id": 1, "type": "mcq", "question": "Q?", "options": ["a", "b"],
            "answer": "c", "explanation": "e"}]"#,
    );

    ecotutor(dir.path())
        .arg("validate")
        .arg("--dataset")
        .arg(&dataset)
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] WARNING"))
        .stdout(predicate::str::contains("not one of the options"))
        .stdout(predicate::str::contains("2 warning(s) found."));
}

#[test]
fn validate_duplicate_ids_fails() {
    let dir = TempDir::new().unwrap();
    let dataset = write_dataset(
        &dir,
        r#"[{"id": 1, "type": "concept", "question": "A?", "answer": "a", "explanation": "e"},
            {"id": 1, "type": "concept", "question": "B?", "answer": "b", "explanation": "e"}]"#,
    );

    ecotutor(dir.path())
        .arg("validate")
        .arg("--dataset")
        .arg(&dataset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate question id: 1"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    ecotutor(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ecotutor.toml"))
        .stdout(predicate::str::contains(
            "Created enhanced_ai_chatbot_dataset.json",
        ));

    assert!(dir.path().join("ecotutor.toml").exists());
    assert!(dir.path().join("enhanced_ai_chatbot_dataset.json").exists());

    // The generated dataset and config are usable as-is
    ecotutor(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("Dataset valid."));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    ecotutor(dir.path()).arg("init").assert().success();

    ecotutor(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn models_with_disabled_dialogue() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("ecotutor.toml"),
        "[dialogue]\ntype = \"none\"\n",
    )
    .unwrap();

    ecotutor(dir.path())
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("Small talk is disabled"));
}
