//! The `digiclass summary` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use digiclass_core::traits::AssignmentFilter;

use crate::context::{teacher, Session};

pub async fn execute(
    config: Option<PathBuf>,
    class_id: Option<u64>,
    subject: Option<String>,
    teacher_id: u64,
) -> Result<()> {
    let session = Session::open(config)?;
    let filter = AssignmentFilter {
        class_id,
        subject,
        ..Default::default()
    };
    let summary = session
        .service
        .class_summary(&teacher(teacher_id), &filter)
        .await?;

    println!("{}: class summary", session.config.project_name);

    let mut table = Table::new();
    table.set_header(vec!["Learner", "Submissions", "Avg grade", "Best score"]);
    for row in &summary.learners {
        table.add_row(vec![
            Cell::new(row.learner_id),
            Cell::new(row.submissions),
            Cell::new(format!("{:.2}", row.avg_grade)),
            Cell::new(format!("{}%", row.best_score)),
        ]);
    }
    println!("{table}");

    let distribution: Vec<String> = summary
        .distribution
        .iter()
        .map(|(grade, count)| format!("{grade}: {count}"))
        .collect();
    println!(
        "{} assignment(s), {} learner(s). Grades: {}",
        summary.assignments,
        summary.learners.len(),
        if distribution.is_empty() {
            "none".to_string()
        } else {
            distribution.join(", ")
        }
    );
    Ok(())
}
