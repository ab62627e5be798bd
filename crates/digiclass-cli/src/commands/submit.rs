//! The `digiclass submit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use digiclass_core::parser::parse_answers_json;

use crate::commands::grade::print_outcome;
use crate::context::{student, Session};

pub async fn execute(
    config: Option<PathBuf>,
    assignment_id: u64,
    learner: u64,
    answers_path: PathBuf,
    json: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let answers = parse_answers_json(&content)?;

    let session = Session::open(config)?;
    let receipt = match session
        .service
        .submit(&student(learner), assignment_id, answers)
        .await
    {
        Ok(receipt) => receipt,
        Err(e) if e.is_retryable() => {
            return Err(anyhow::Error::new(e).context("submission not recorded, run submit again"))
        }
        Err(e) => return Err(e.into()),
    };
    session.save().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        println!(
            "Attempt {} recorded for learner {learner} on assignment {assignment_id}",
            receipt.submission.attempt_no
        );
        print_outcome(&receipt.outcome);
        println!("Attempts left: {}", receipt.attempts_left);
    }

    Ok(())
}
