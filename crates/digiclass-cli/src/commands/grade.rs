//! The `digiclass grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use digiclass_core::grading::{grade, GradeOutcome};
use digiclass_core::parser::{parse_answers_json, parse_assignment};

pub fn execute(assignment_path: PathBuf, answers_path: PathBuf, json: bool) -> Result<()> {
    let assignment = parse_assignment(&assignment_path)?;
    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let answers = parse_answers_json(&content)?;

    let outcome = grade(&assignment.questions, &answers);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Assignment: {}", assignment.title);
        print_outcome(&outcome);
    }

    Ok(())
}

/// Score line plus a per-question table.
pub(crate) fn print_outcome(outcome: &GradeOutcome) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Points", "Result"]);

    for item in &outcome.items {
        let result = match (item.gradable, item.correct) {
            (false, _) => "review only",
            (true, true) => "correct",
            (true, false) => "wrong",
        };
        table.add_row(vec![
            Cell::new(&item.key),
            Cell::new(item.points),
            Cell::new(result),
        ]);
    }

    println!("{table}");
    println!(
        "Score: {}% ({}/{} points), grade {}",
        outcome.score, outcome.earned_points, outcome.total_points, outcome.grade
    );
}
