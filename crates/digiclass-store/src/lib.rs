//! # digiclass-store
//!
//! In-memory implementation of the digiclass store traits, with JSON
//! snapshot persistence for the command line.
//!
//! [`MemoryStore`] implements both [`AssignmentStore`] and [`SubmissionStore`]
//! behind one lock, and enforces the uniqueness of
//! `(assignment, learner, attempt_no)` on insert.

pub mod snapshot;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use digiclass_core::error::StoreError;
use digiclass_core::model::{
    Assignment, AssignmentId, AssignmentUpdate, LearnerId, NewAssignment, Submission,
};
use digiclass_core::traits::{AssignmentFilter, AssignmentStore, SubmissionStore};

pub use snapshot::{Snapshot, SnapshotLock};

/// Assignments and submissions held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously saved state.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Copy of the current state, suitable for saving.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }
}

fn same_pair(s: &Submission, learner: LearnerId, assignment: AssignmentId) -> bool {
    s.learner_id == learner && s.assignment_id == assignment
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn create(&self, assignment: NewAssignment) -> Result<Assignment, StoreError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;
        let created = assignment.into_assignment(id, Utc::now());
        state.assignments.insert(id, created.clone());
        tracing::debug!("stored assignment {id}");
        Ok(created)
    }

    async fn get(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError> {
        Ok(self.state.read().await.assignments.get(&id).cloned())
    }

    async fn update(
        &self,
        id: AssignmentId,
        update: AssignmentUpdate,
    ) -> Result<Option<Assignment>, StoreError> {
        let mut state = self.state.write().await;
        let Some(assignment) = state.assignments.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(assignment, Utc::now());
        tracing::debug!("updated assignment {id}");
        Ok(Some(assignment.clone()))
    }

    async fn delete(&self, id: AssignmentId) -> Result<bool, StoreError> {
        let removed = self.state.write().await.assignments.remove(&id).is_some();
        if removed {
            tracing::debug!("deleted assignment {id}");
        }
        Ok(removed)
    }

    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .assignments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert(&self, submission: Submission) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let taken = state.submissions.iter().any(|s| {
            same_pair(s, submission.learner_id, submission.assignment_id)
                && s.attempt_no == submission.attempt_no
        });
        if taken {
            return Err(StoreError::DuplicateAttempt {
                assignment_id: submission.assignment_id,
                learner_id: submission.learner_id,
                attempt_no: submission.attempt_no,
            });
        }
        tracing::debug!(
            "stored attempt {} for learner {} on assignment {}",
            submission.attempt_no,
            submission.learner_id,
            submission.assignment_id
        );
        state.submissions.push(submission);
        Ok(())
    }

    async fn count(&self, learner: LearnerId, assignment: AssignmentId) -> Result<u32, StoreError> {
        let state = self.state.read().await;
        let n = state
            .submissions
            .iter()
            .filter(|s| same_pair(s, learner, assignment))
            .count();
        u32::try_from(n).map_err(|_| StoreError::Backend(format!("attempt count overflow: {n}")))
    }

    async fn latest(
        &self,
        learner: LearnerId,
        assignment: AssignmentId,
    ) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .submissions
            .iter()
            .filter(|s| same_pair(s, learner, assignment))
            .max_by_key(|s| s.attempt_no)
            .cloned())
    }

    async fn list_for_learner(&self, learner: LearnerId) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .submissions
            .iter()
            .rev()
            .filter(|s| s.learner_id == learner)
            .cloned()
            .collect())
    }

    async fn list_for_assignment(
        &self,
        assignment: AssignmentId,
    ) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .submissions
            .iter()
            .rev()
            .filter(|s| s.assignment_id == assignment)
            .cloned()
            .collect())
    }

    async fn delete_for(
        &self,
        learner: LearnerId,
        assignment: AssignmentId,
    ) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let before = state.submissions.len();
        state
            .submissions
            .retain(|s| !same_pair(s, learner, assignment));
        let removed = before - state.submissions.len();
        tracing::debug!(
            "removed {removed} submission(s) for learner {learner} on assignment {assignment}"
        );
        Ok(removed)
    }

    async fn delete_for_assignment(&self, assignment: AssignmentId) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let before = state.submissions.len();
        state.submissions.retain(|s| s.assignment_id != assignment);
        Ok(before - state.submissions.len())
    }
}
