//! The `digiclass history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use crate::context::{student, Session};

pub async fn execute(config: Option<PathBuf>, learner: u64, subject: Option<String>) -> Result<()> {
    let session = Session::open(config)?;
    let history = session
        .service
        .student_grades(&student(learner), subject.as_deref())
        .await?;

    if history.items.is_empty() {
        println!("No submissions for learner {learner}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Submitted", "Assignment", "Type", "Attempt", "Score", "Grade"]);
    for item in &history.items {
        table.add_row(vec![
            Cell::new(item.submitted_at.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{} (#{})", item.assignment_title, item.assignment_id)),
            Cell::new(item.kind),
            Cell::new(item.attempt_no),
            Cell::new(format!("{}%", item.score)),
            Cell::new(item.grade),
        ]);
    }

    println!("{table}");
    println!("Average grade: {:.2}", history.avg_grade);
    Ok(())
}
