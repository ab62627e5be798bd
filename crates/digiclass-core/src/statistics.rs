//! Grade aggregates over submission history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Grade, LearnerId, Submission};

/// Mean grade rounded to two decimals. Zero when there are no submissions.
pub fn average_grade(submissions: &[Submission]) -> f64 {
    if submissions.is_empty() {
        return 0.0;
    }
    let sum: u32 = submissions.iter().map(|s| u32::from(s.grade.value())).sum();
    round2(f64::from(sum) / submissions.len() as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-learner aggregate across a set of submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSummary {
    pub learner_id: LearnerId,
    pub submissions: usize,
    pub avg_grade: f64,
    pub best_score: u32,
}

/// Group submissions by learner, ordered by learner id.
pub fn summarize_by_learner(submissions: &[Submission]) -> Vec<LearnerSummary> {
    let mut grouped: BTreeMap<LearnerId, Vec<&Submission>> = BTreeMap::new();
    for s in submissions {
        grouped.entry(s.learner_id).or_default().push(s);
    }

    grouped
        .into_iter()
        .map(|(learner_id, group)| {
            let sum: u32 = group.iter().map(|s| u32::from(s.grade.value())).sum();
            LearnerSummary {
                learner_id,
                submissions: group.len(),
                avg_grade: round2(f64::from(sum) / group.len() as f64),
                best_score: group.iter().map(|s| s.score).max().unwrap_or(0),
            }
        })
        .collect()
}

/// How many submissions landed on each grade.
pub fn grade_distribution(submissions: &[Submission]) -> BTreeMap<Grade, usize> {
    let mut distribution = BTreeMap::new();
    for s in submissions {
        *distribution.entry(s.grade).or_insert(0) += 1;
    }
    distribution
}
