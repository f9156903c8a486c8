//! The `ecotutor init` command.

use anyhow::Result;

use ecotutor_core::dataset::DEFAULT_DATASET_PATH;

pub fn execute() -> Result<()> {
    // Create ecotutor.toml
    if std::path::Path::new("ecotutor.toml").exists() {
        println!("ecotutor.toml already exists, skipping.");
    } else {
        std::fs::write("ecotutor.toml", SAMPLE_CONFIG)?;
        println!("Created ecotutor.toml");
    }

    // Create sample dataset
    let dataset_path = std::path::Path::new(DEFAULT_DATASET_PATH);
    if dataset_path.exists() {
        println!("{DEFAULT_DATASET_PATH} already exists, skipping.");
    } else {
        std::fs::write(dataset_path, SAMPLE_DATASET)?;
        println!("Created {DEFAULT_DATASET_PATH}");
    }

    println!("\nNext steps:");
    println!("  1. Start Ollama (ollama serve) or set [dialogue] type = \"none\"");
    println!("  2. Run: ecotutor validate");
    println!("  3. Run: ecotutor start");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# ecotutor configuration

dataset = "enhanced_ai_chatbot_dataset.json"
small_talk_probability = 0.3
small_talk_prompt = "Student: Hi\nTeacher:"
show_progress = true

[dialogue]
type = "ollama"
base_url = "http://localhost:11434"
model = "qwen2.5:0.5b"
end_of_turn = "<|endoftext|>"
top_k = 50
top_p = 0.95
max_new_tokens = 50
"#;

const SAMPLE_DATASET: &str = r#"[
  {
    "id": 1,
    "type": "concept",
    "question": "What process do plants use to turn sunlight into food?",
    "answer": "photosynthesis",
    "hint": "It starts with 'photo', meaning light.",
    "explanation": "Photosynthesis uses light energy to turn carbon dioxide and water into glucose, releasing oxygen."
  },
  {
    "id": 2,
    "type": "multiple-choice",
    "question": "Which of these is a renewable energy source?",
    "options": ["Coal", "Solar power", "Natural gas", "Oil"],
    "answer": "Solar power",
    "hint": "It comes up every morning.",
    "explanation": "Solar power is renewable because sunlight is replenished continuously; fossil fuels take millions of years to form."
  },
  {
    "id": 3,
    "type": "concept",
    "question": "What is the name of the effect where gases trap heat in the atmosphere?",
    "answer": "greenhouse effect",
    "hint": "Gardeners grow plants in a glass building named after it.",
    "explanation": "The greenhouse effect happens when gases such as CO2 and methane absorb heat radiated by the Earth."
  },
  {
    "id": 4,
    "type": "multiple-choice",
    "question": "Which gas do trees absorb from the air?",
    "options": ["Oxygen", "Nitrogen", "Carbon dioxide"],
    "answer": "Carbon dioxide",
    "hint": "You breathe it out.",
    "explanation": "Trees absorb carbon dioxide and store the carbon in their wood, which is why forests act as carbon sinks."
  },
  {
    "id": 5,
    "type": "concept",
    "question": "What do we call the three R's of waste reduction?",
    "answer": "reduce reuse recycle",
    "hint": "All three words start with 're'.",
    "explanation": "Reduce, reuse, recycle: cutting waste at the source comes first, then using items again, then recovering materials."
  }
]
"#;
