//! The `digiclass validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(assignment_path: PathBuf) -> Result<()> {
    let assignments = if assignment_path.is_dir() {
        digiclass_core::parser::load_assignment_directory(&assignment_path)?
    } else {
        vec![digiclass_core::parser::parse_assignment(&assignment_path)?]
    };

    let mut total_warnings = 0;

    for assignment in &assignments {
        println!(
            "Assignment: {} ({} questions)",
            assignment.title,
            assignment.questions.len()
        );

        let warnings = digiclass_core::parser::validate_assignment(assignment);
        for w in &warnings {
            let prefix = w
                .position
                .map(|p| format!("  [q{p}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All assignments valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
