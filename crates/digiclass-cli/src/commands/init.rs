//! The `digiclass init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("digiclass.toml").exists() {
        println!("digiclass.toml already exists, skipping.");
    } else {
        std::fs::write("digiclass.toml", SAMPLE_CONFIG)?;
        println!("Created digiclass.toml");
    }

    std::fs::create_dir_all("assignments")?;
    let example_path = std::path::Path::new("assignments/example.toml");
    if example_path.exists() {
        println!("assignments/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ASSIGNMENT)?;
        println!("Created assignments/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: digiclass validate --assignment assignments/example.toml");
    println!("  2. Run: digiclass publish --assignment assignments/example.toml");
    println!("  3. Run: digiclass submit --assignment-id 1 --learner 1 --answers answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# digiclass configuration

project_name = "Digital Classroom"
store_path = "./digiclass-data/store.json"
default_page_size = 20
max_page_size = 100
"#;

const EXAMPLE_ASSIGNMENT: &str = r#"[assignment]
class_id = 1
subject = "math"
topic_id = 1
type = "practice"
title = "Example quiz"
description = "A short quiz to get started"
max_attempts = 2

[[questions]]
type = "select"
prompt = "What is 7 * 8?"
options = ["54", "56", "64"]
correct_answer = "56"

[[questions]]
type = "checkbox"
prompt = "Select the prime numbers"
options = ["2", "4", "7", "9"]
points = 2
correct_answer = ["2", "7"]

[[questions]]
type = "text"
prompt = "Name the longest side of a right triangle"
correct_answer = "hypotenuse"
"#;
