//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn digiclass(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("digiclass").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("DIGICLASS_STORE_PATH", dir.join("store.json"))
        .env_remove("RUST_LOG");
    cmd
}

fn sample(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../assignments")
        .join(name)
}

fn write_answers(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, json).unwrap();
    path
}

const ALGEBRA_FULL: &str =
    r#"{"q1": "x = 4", "q2": ["3x - y = 0", "y = 2x + 1"], "q3": "  root "}"#;
const ALGEBRA_PARTIAL: &str = r#"{"q1": "x = 4", "q2": ["y = 2x + 1", "3x - y = 0"], "q3": 42}"#;

#[test]
fn validate_sample_assignment() {
    let dir = TempDir::new().unwrap();
    digiclass(dir.path())
        .arg("validate")
        .arg("--assignment")
        .arg(sample("algebra-basics.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Algebra basics (4 questions)"))
        .stdout(predicate::str::contains("[q4] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    digiclass(dir.path())
        .arg("validate")
        .arg("--assignment")
        .arg(sample(""))
        .assert()
        .success()
        .stdout(predicate::str::contains("Algebra basics"))
        .stdout(predicate::str::contains("Irregular verbs (3 questions)"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    digiclass(dir.path())
        .arg("validate")
        .arg("--assignment")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_prints_breakdown() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(dir.path(), "answers.json", ALGEBRA_PARTIAL);

    digiclass(dir.path())
        .arg("grade")
        .arg("--assignment")
        .arg(sample("algebra-basics.toml"))
        .arg("--answers")
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("review only"))
        .stdout(predicate::str::contains("Score: 80% (4/5 points), grade 4"));
}

#[test]
fn grade_json_output() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(dir.path(), "answers.json", ALGEBRA_FULL);

    digiclass(dir.path())
        .arg("grade")
        .arg("--assignment")
        .arg(sample("algebra-basics.toml"))
        .arg("--answers")
        .arg(&answers)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"score\": 100"))
        .stdout(predicate::str::contains("\"grade\": 5"));
}

#[test]
fn grade_rejects_non_object_answers() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(dir.path(), "answers.json", "[1, 2, 3]");

    digiclass(dir.path())
        .arg("grade")
        .arg("--assignment")
        .arg(sample("algebra-basics.toml"))
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON object"));
}

#[test]
fn publish_submit_and_history() {
    let dir = TempDir::new().unwrap();
    let partial = write_answers(dir.path(), "partial.json", ALGEBRA_PARTIAL);
    let full = write_answers(dir.path(), "full.json", ALGEBRA_FULL);

    digiclass(dir.path())
        .arg("publish")
        .arg("--assignment")
        .arg(sample("algebra-basics.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored assignment 1: Algebra basics"));
    assert!(dir.path().join("store.json").exists());

    digiclass(dir.path())
        .args(["submit", "--assignment-id", "1", "--learner", "5", "--answers"])
        .arg(&partial)
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempt 1 recorded"))
        .stdout(predicate::str::contains("grade 4"))
        .stdout(predicate::str::contains("Attempts left: 2"));

    digiclass(dir.path())
        .args(["submit", "--assignment-id", "1", "--learner", "5", "--answers"])
        .arg(&full)
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempt 2 recorded"))
        .stdout(predicate::str::contains("Score: 100%"));

    digiclass(dir.path())
        .args(["history", "--learner", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Algebra basics (#1)"))
        .stdout(predicate::str::contains("Average grade: 4.50"));

    digiclass(dir.path())
        .args(["assignments", "--learner", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2/3"));

    digiclass(dir.path())
        .args(["submissions", "--assignment-id", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 1 of 1 (2 submission(s) total)"));
}

#[test]
fn attempt_limit_and_reset() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(
        dir.path(),
        "verbs.json",
        r#"{"q1": "Went", "q2": "written", "q3": "sent"}"#,
    );

    digiclass(dir.path())
        .args(["publish", "--assignment"])
        .arg(sample("english-verbs.toml"))
        .assert()
        .success();

    let submit = |dir: &Path| {
        let mut cmd = digiclass(dir);
        cmd.args(["submit", "--assignment-id", "1", "--learner", "9", "--answers"])
            .arg(&answers);
        cmd
    };

    submit(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempts left: 0"));

    submit(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no attempts left (1 of 1 used)"));

    digiclass(dir.path())
        .args(["reset", "--assignment-id", "1", "--learner", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 attempt(s)"));

    submit(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempt 1 recorded"));
}

#[test]
fn draft_assignments_reject_submissions() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(dir.path(), "answers.json", "{}");

    digiclass(dir.path())
        .args(["publish", "--draft", "--assignment"])
        .arg(sample("english-verbs.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("draft"));

    digiclass(dir.path())
        .args(["submit", "--assignment-id", "1", "--learner", "2", "--answers"])
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not published"));
}

#[test]
fn submit_to_missing_assignment_fails() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(dir.path(), "answers.json", "{}");

    digiclass(dir.path())
        .args(["submit", "--assignment-id", "42", "--learner", "1", "--answers"])
        .arg(&answers)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("42"));
}

#[test]
fn concurrent_processes_share_the_attempt_limit() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(
        dir.path(),
        "verbs.json",
        r#"{"q1": "went", "q2": "written", "q3": "sent"}"#,
    );

    digiclass(dir.path())
        .args(["publish", "--assignment"])
        .arg(sample("english-verbs.toml"))
        .assert()
        .success();

    #[allow(deprecated)]
    let bin = assert_cmd::cargo::cargo_bin("digiclass");
    let children: Vec<_> = (0..2)
        .map(|_| {
            std::process::Command::new(&bin)
                .current_dir(dir.path())
                .env("HOME", dir.path())
                .env("DIGICLASS_STORE_PATH", dir.path().join("store.json"))
                .env_remove("RUST_LOG")
                .args(["submit", "--assignment-id", "1", "--learner", "4", "--answers"])
                .arg(&answers)
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped())
                .spawn()
                .unwrap()
        })
        .collect();
    let outputs: Vec<_> = children
        .into_iter()
        .map(|child| child.wait_with_output().unwrap())
        .collect();

    assert_eq!(outputs.iter().filter(|o| o.status.success()).count(), 1);
    let rejected = outputs.iter().find(|o| !o.status.success()).unwrap();
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("no attempts left (1 of 1 used)"));

    let history = digiclass(dir.path())
        .args(["history", "--learner", "4"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let history = String::from_utf8(history).unwrap();
    assert_eq!(history.matches("Irregular verbs").count(), 1);
}

#[test]
fn assignments_as_another_teacher() {
    let dir = TempDir::new().unwrap();

    digiclass(dir.path())
        .args(["publish", "--teacher", "3", "--assignment"])
        .arg(sample("english-verbs.toml"))
        .assert()
        .success();

    digiclass(dir.path())
        .args(["assignments", "--teacher", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 assignment(s) in Digital Classroom"));
}

#[test]
fn summary_and_delete() {
    let dir = TempDir::new().unwrap();
    let answers = write_answers(dir.path(), "answers.json", ALGEBRA_FULL);

    digiclass(dir.path())
        .args(["publish", "--assignment"])
        .arg(sample(""))
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored assignment 2"));

    for learner in ["1", "2"] {
        digiclass(dir.path())
            .args(["submit", "--assignment-id", "1", "--learner", learner, "--answers"])
            .arg(&answers)
            .assert()
            .success();
    }

    digiclass(dir.path())
        .args(["summary", "--class-id", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Digital Classroom: class summary"))
        .stdout(predicate::str::contains("2 assignment(s), 2 learner(s). Grades: 5: 2"));

    digiclass(dir.path())
        .args(["delete", "--assignment-id", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted assignment 1 and 2 submission(s)"));

    digiclass(dir.path())
        .arg("assignments")
        .assert()
        .success()
        .stdout(predicate::str::contains("Irregular verbs"))
        .stdout(predicate::str::contains("1 assignment(s)"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    digiclass(dir.path())
        .args(["--config", "missing.toml", "assignments"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    digiclass(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created digiclass.toml"))
        .stdout(predicate::str::contains("Created assignments/example.toml"));

    assert!(dir.path().join("digiclass.toml").exists());

    digiclass(dir.path())
        .args(["validate", "--assignment", "assignments/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All assignments valid."));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    digiclass(dir.path()).arg("init").assert().success();

    digiclass(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    digiclass(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assignment grading and attempt tracking"));
}
