//! The `digiclass reset` command.

use std::path::PathBuf;

use anyhow::Result;

use crate::context::{teacher, Session};

pub async fn execute(
    config: Option<PathBuf>,
    assignment_id: u64,
    learner: u64,
    teacher_id: u64,
) -> Result<()> {
    let session = Session::open(config)?;
    let assignment = session.service.get_assignment(assignment_id).await?;
    let removed = session
        .service
        .reset_attempts(&teacher(teacher_id), learner, assignment_id)
        .await?;
    session.save().await?;

    println!(
        "Removed {removed} attempt(s) for learner {learner} on '{}'",
        assignment.title
    );
    Ok(())
}
