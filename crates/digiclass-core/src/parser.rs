//! Assignment file parser.
//!
//! Loads assignments authored as TOML, validates them, and reads submitted
//! answers from JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Answers, AssignmentKind, CorrectAnswer, NewAssignment, Question, QuestionType,
};

/// Intermediate TOML structure for assignment files.
#[derive(Debug, Deserialize)]
struct TomlAssignmentFile {
    assignment: TomlAssignmentHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlAssignmentHeader {
    class_id: u64,
    subject: String,
    topic_id: u64,
    #[serde(rename = "type", default = "default_kind_str")]
    kind: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_true")]
    published: bool,
}

fn default_kind_str() -> String {
    "practice".to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default = "default_true")]
    required: bool,
    #[serde(default = "default_points")]
    points: u32,
    #[serde(default)]
    correct_answer: Option<CorrectAnswer>,
}

fn default_points() -> u32 {
    1
}

/// Parse a single TOML file into a `NewAssignment`.
pub fn parse_assignment(path: &Path) -> Result<NewAssignment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assignment file: {}", path.display()))?;

    parse_assignment_str(&content, path)
}

/// Parse a TOML string into a `NewAssignment`. Positions are numbered 1..n in file order.
pub fn parse_assignment_str(content: &str, source_path: &Path) -> Result<NewAssignment> {
    let parsed: TomlAssignmentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let kind: AssignmentKind = parsed
        .assignment
        .kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(index, q)| {
            let kind: QuestionType = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", index + 1, e))?;
            Ok(Question {
                position: index as u32 + 1,
                kind,
                prompt: q.prompt,
                options: q.options,
                required: q.required,
                points: q.points,
                correct_answer: q.correct_answer,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NewAssignment {
        class_id: parsed.assignment.class_id,
        subject: parsed.assignment.subject,
        topic_id: parsed.assignment.topic_id,
        kind,
        title: parsed.assignment.title,
        description: parsed.assignment.description,
        max_attempts: parsed.assignment.max_attempts,
        published: parsed.assignment.published,
        questions,
    })
}

/// Recursively load all `.toml` assignment files from a directory.
pub fn load_assignment_directory(dir: &Path) -> Result<Vec<NewAssignment>> {
    let mut assignments = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            assignments.extend(load_assignment_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_assignment(&path) {
                Ok(assignment) => assignments.push(assignment),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(assignments)
}

/// Read a learner's answers from a JSON object keyed by `"q<position>"`.
pub fn parse_answers_json(content: &str) -> Result<Answers> {
    serde_json::from_str(content).context("answers must be a JSON object keyed by \"q<position>\"")
}

/// A warning from assignment validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question position (if applicable).
    pub position: Option<u32>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(position: u32, message: impl Into<String>) -> Self {
        Self {
            position: Some(position),
            message: message.into(),
        }
    }

    fn assignment(message: impl Into<String>) -> Self {
        Self {
            position: None,
            message: message.into(),
        }
    }
}

/// Validate an assignment for common authoring mistakes.
pub fn validate_assignment(assignment: &NewAssignment) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if assignment.title.trim().is_empty() {
        warnings.push(ValidationWarning::assignment("title is empty"));
    }
    if assignment.max_attempts == 0 {
        warnings.push(ValidationWarning::assignment(
            "max_attempts is 0, learners can never submit",
        ));
    }
    if assignment.questions.is_empty() {
        warnings.push(ValidationWarning::assignment("assignment has no questions"));
    } else if !assignment.questions.iter().any(Question::is_gradable) {
        warnings.push(ValidationWarning::assignment(
            "no question has a correct answer, every submission will score 0",
        ));
    }

    for question in &assignment.questions {
        let position = question.position;

        if question.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::question(position, "prompt is empty"));
        }
        if question.points == 0 {
            warnings.push(ValidationWarning::question(position, "points must be positive"));
        }

        let options = question.options.as_deref().unwrap_or_default();
        let is_choice = matches!(question.kind, QuestionType::Select | QuestionType::Checkbox);
        if is_choice && options.is_empty() {
            warnings.push(ValidationWarning::question(
                position,
                format!("{} question has no options", question.kind),
            ));
        }

        let Some(correct) = &question.correct_answer else {
            warnings.push(ValidationWarning::question(
                position,
                "no correct answer, question is review-only and not scored",
            ));
            continue;
        };

        match (question.kind, correct) {
            (QuestionType::Select | QuestionType::Text, CorrectAnswer::Multiple(_)) => {
                warnings.push(ValidationWarning::question(
                    position,
                    format!(
                        "{} question has a list as correct answer \
                         and can never be answered correctly",
                        question.kind
                    ),
                ));
            }
            (QuestionType::Checkbox, CorrectAnswer::Single(_)) => {
                warnings.push(ValidationWarning::question(
                    position,
                    "checkbox correct answer is a single string, treated as a one-option set",
                ));
            }
            _ => {}
        }

        if is_choice && !options.is_empty() {
            let expected: Vec<&String> = match correct {
                CorrectAnswer::Single(value) => vec![value],
                CorrectAnswer::Multiple(values) => values.iter().collect(),
            };
            for value in expected {
                if !options.contains(value) {
                    warnings.push(ValidationWarning::question(
                        position,
                        format!("correct answer '{value}' is not one of the options"),
                    ));
                }
            }
        }
    }

    warnings
}
