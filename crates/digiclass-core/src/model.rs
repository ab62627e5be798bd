//! Core data model types for digiclass.
//!
//! Assignments, questions, submitted answers, and graded submissions, plus the
//! authenticated principal that every service call is made on behalf of.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AssignmentId = u64;
pub type LearnerId = u64;
pub type TeacherId = u64;
pub type ClassId = u64;
pub type TopicId = u64;

/// How a question is answered and therefore how it is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// One option picked from a list.
    Select,
    /// Any subset of options.
    Checkbox,
    /// Free-text answer.
    Text,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Select => write!(f, "select"),
            QuestionType::Checkbox => write!(f, "checkbox"),
            QuestionType::Text => write!(f, "text"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "select" => Ok(QuestionType::Select),
            "checkbox" => Ok(QuestionType::Checkbox),
            "text" => Ok(QuestionType::Text),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// The expected answer stored on a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multiple(Vec<String>),
}

/// A value submitted by a learner for one question.
///
/// Anything that is neither a string nor a list of strings lands in `Other`,
/// so a malformed item never makes the whole submission unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
    Other(serde_json::Value),
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        AnswerValue::Choices(values.into_iter().map(str::to_string).collect())
    }
}

/// Submitted answers keyed by `"q<position>"`.
pub type Answers = BTreeMap<String, AnswerValue>;

/// A single question inside an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based ordinal inside the assignment.
    pub position: u32,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub prompt: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default = "default_points")]
    pub points: u32,
    /// Questions without a correct answer are review-only and never scored.
    #[serde(default)]
    pub correct_answer: Option<CorrectAnswer>,
}

impl Question {
    /// Key under which the learner's answer to this question is submitted.
    pub fn answer_key(&self) -> String {
        format!("q{}", self.position)
    }

    pub fn is_gradable(&self) -> bool {
        self.correct_answer.is_some()
    }
}

fn default_true() -> bool {
    true
}

fn default_points() -> u32 {
    1
}

/// Renumber question positions 1..n in list order.
pub fn renumber(questions: &mut [Question]) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.position = index as u32 + 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    Practice,
    Homework,
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentKind::Practice => write!(f, "practice"),
            AssignmentKind::Homework => write!(f, "homework"),
        }
    }
}

impl FromStr for AssignmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "practice" => Ok(AssignmentKind::Practice),
            "homework" => Ok(AssignmentKind::Homework),
            other => Err(format!("unknown assignment type: {other}")),
        }
    }
}

/// A published (or draft) collection of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub class_id: ClassId,
    pub subject: String,
    pub topic_id: TopicId,
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_attempts: u32,
    pub published: bool,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An assignment that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub class_id: ClassId,
    pub subject: String,
    pub topic_id: TopicId,
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_attempts: u32,
    #[serde(default = "default_true")]
    pub published: bool,
    pub questions: Vec<Question>,
}

impl NewAssignment {
    /// Materialize into a stored assignment with the given id.
    pub fn into_assignment(self, id: AssignmentId, now: DateTime<Utc>) -> Assignment {
        let mut questions = self.questions;
        renumber(&mut questions);
        Assignment {
            id,
            class_id: self.class_id,
            subject: self.subject,
            topic_id: self.topic_id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            max_attempts: self.max_attempts,
            published: self.published,
            questions,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial edit of an assignment. `None` leaves a field unchanged.
///
/// Editing never touches submissions that were already graded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentUpdate {
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic_id: Option<TopicId>,
    #[serde(default, rename = "type")]
    pub kind: Option<AssignmentKind>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

impl AssignmentUpdate {
    pub fn apply(self, assignment: &mut Assignment, now: DateTime<Utc>) {
        if let Some(class_id) = self.class_id {
            assignment.class_id = class_id;
        }
        if let Some(subject) = self.subject {
            assignment.subject = subject;
        }
        if let Some(topic_id) = self.topic_id {
            assignment.topic_id = topic_id;
        }
        if let Some(kind) = self.kind {
            assignment.kind = kind;
        }
        if let Some(title) = self.title {
            assignment.title = title;
        }
        if let Some(description) = self.description {
            assignment.description = Some(description);
        }
        if let Some(max_attempts) = self.max_attempts {
            assignment.max_attempts = max_attempts;
        }
        if let Some(published) = self.published {
            assignment.published = published;
        }
        if let Some(mut questions) = self.questions {
            renumber(&mut questions);
            assignment.questions = questions;
        }
        assignment.updated_at = now;
    }
}

/// Discrete grade on the 2..5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Grade {
    /// Map a 0..=100 score onto the grade scale.
    pub fn from_score(score: u32) -> Self {
        if score >= 90 {
            Grade::Five
        } else if score >= 75 {
            Grade::Four
        } else if score >= 60 {
            Grade::Three
        } else {
            Grade::Two
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Grade::Two),
            3 => Ok(Grade::Three),
            4 => Ok(Grade::Four),
            5 => Ok(Grade::Five),
            other => Err(format!("grade out of range: {other}")),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One graded attempt. Never mutated after it is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: AssignmentId,
    pub learner_id: LearnerId,
    /// 1-based, sequential per (learner, assignment).
    pub attempt_no: u32,
    pub answers: Answers,
    /// Integer percentage in 0..=100.
    pub score: u32,
    pub grade: Grade,
    pub submitted_at: DateTime<Utc>,
}

/// The authenticated caller, resolved once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Principal {
    Teacher {
        id: TeacherId,
        name: String,
    },
    Student {
        id: LearnerId,
        name: String,
        #[serde(default)]
        class_id: Option<ClassId>,
    },
}

impl Principal {
    pub fn id(&self) -> u64 {
        match self {
            Principal::Teacher { id, .. } | Principal::Student { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Teacher { name, .. } | Principal::Student { name, .. } => name,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Principal::Teacher { .. } => "teacher",
            Principal::Student { .. } => "student",
        }
    }

    /// The learner id if this principal is a student.
    pub fn as_student(&self) -> Option<LearnerId> {
        match self {
            Principal::Student { id, .. } => Some(*id),
            Principal::Teacher { .. } => None,
        }
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, Principal::Teacher { .. })
    }
}
