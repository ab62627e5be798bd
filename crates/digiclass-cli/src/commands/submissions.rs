//! The `digiclass submissions` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use crate::context::{teacher, Session};

pub async fn execute(
    config: Option<PathBuf>,
    assignment_id: u64,
    page: usize,
    page_size: Option<usize>,
    teacher_id: u64,
) -> Result<()> {
    let session = Session::open(config)?;
    let assignment = session.service.get_assignment(assignment_id).await?;
    let result = session
        .service
        .submissions_page(&teacher(teacher_id), assignment_id, page, page_size)
        .await?;

    println!("Submissions for '{}'", assignment.title);

    let mut table = Table::new();
    table.set_header(vec!["Submitted", "Learner", "Attempt", "Score", "Grade"]);
    for s in &result.items {
        table.add_row(vec![
            Cell::new(s.submitted_at.format("%Y-%m-%d %H:%M")),
            Cell::new(s.learner_id),
            Cell::new(s.attempt_no),
            Cell::new(format!("{}%", s.score)),
            Cell::new(s.grade),
        ]);
    }
    println!("{table}");

    let pages = result.total.div_ceil(result.page_size).max(1);
    println!(
        "Page {} of {pages} ({} submission(s) total)",
        result.page, result.total
    );
    Ok(())
}
