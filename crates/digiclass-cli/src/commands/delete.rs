//! The `digiclass delete` command.

use std::path::PathBuf;

use anyhow::Result;

use crate::context::{teacher, Session};

pub async fn execute(config: Option<PathBuf>, assignment_id: u64, teacher_id: u64) -> Result<()> {
    let session = Session::open(config)?;
    let removed = session
        .service
        .delete_assignment(&teacher(teacher_id), assignment_id)
        .await?;
    session.save().await?;

    println!("Deleted assignment {assignment_id} and {removed} submission(s)");
    Ok(())
}
