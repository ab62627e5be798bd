//! The `digiclass publish` command.

use std::path::PathBuf;

use anyhow::Result;

use digiclass_core::parser::{load_assignment_directory, parse_assignment, validate_assignment};

use crate::context::{teacher, Session};

pub async fn execute(
    config: Option<PathBuf>,
    assignment_path: PathBuf,
    teacher_id: u64,
    draft: bool,
) -> Result<()> {
    let drafts = if assignment_path.is_dir() {
        load_assignment_directory(&assignment_path)?
    } else {
        vec![parse_assignment(&assignment_path)?]
    };
    if drafts.is_empty() {
        anyhow::bail!("no assignments found in {}", assignment_path.display());
    }

    let session = Session::open(config)?;
    let principal = teacher(teacher_id);

    for mut assignment in drafts {
        for w in validate_assignment(&assignment) {
            tracing::warn!("{}: {}", assignment.title, w.message);
        }
        if draft {
            assignment.published = false;
        }
        let created = session
            .service
            .create_assignment(&principal, assignment)
            .await?;
        let state = if created.published { "published" } else { "draft" };
        println!(
            "Stored assignment {}: {} ({state}, {} questions, {} attempt(s))",
            created.id,
            created.title,
            created.questions.len(),
            created.max_attempts
        );
    }

    session.save().await?;
    Ok(())
}
