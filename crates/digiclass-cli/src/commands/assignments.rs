//! The `digiclass assignments` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use digiclass_core::traits::AssignmentFilter;

use crate::context::{student, teacher, Session};

pub async fn execute(
    config: Option<PathBuf>,
    learner: Option<u64>,
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

    let mut table = Table::new();

    if let Some(learner) = learner {
        let rows = session
            .service
            .student_assignments(&student(learner), &filter)
            .await?;
        table.set_header(vec!["ID", "Title", "Type", "Attempts", "Left", "Last grade"]);
        for row in &rows {
            table.add_row(vec![
                Cell::new(row.id),
                Cell::new(&row.title),
                Cell::new(row.kind),
                Cell::new(format!("{}/{}", row.attempts_used, row.max_attempts)),
                Cell::new(row.attempts_left),
                Cell::new(row.last_grade.map_or_else(|| "-".to_string(), |g| g.to_string())),
            ]);
        }
        println!("{table}");
        println!(
            "{} assignment(s) open to learner {learner} in {}",
            rows.len(),
            session.config.project_name
        );
    } else {
        let rows = session
            .service
            .list_assignments(&teacher(teacher_id), &filter)
            .await?;
        table.set_header(vec![
            "ID",
            "Title",
            "Subject",
            "Class",
            "Type",
            "Questions",
            "Max attempts",
            "Published",
        ]);
        for a in &rows {
            table.add_row(vec![
                Cell::new(a.id),
                Cell::new(&a.title),
                Cell::new(&a.subject),
                Cell::new(a.class_id),
                Cell::new(a.kind),
                Cell::new(a.questions.len()),
                Cell::new(a.max_attempts),
                Cell::new(if a.published { "yes" } else { "no" }),
            ]);
        }
        println!("{table}");
        println!(
            "{} assignment(s) in {}",
            rows.len(),
            session.config.project_name
        );
    }

    Ok(())
}
