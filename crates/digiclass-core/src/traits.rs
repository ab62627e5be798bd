//! Storage traits the submission service is built on.
//!
//! These async traits are implemented by the `digiclass-store` crate. Any
//! implementation must reject a second submission with the same
//! `(assignment, learner, attempt_no)` so that two racing writers cannot
//! both claim one attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{
    Assignment, AssignmentId, AssignmentKind, AssignmentUpdate, ClassId, LearnerId, NewAssignment,
    Submission, TopicId,
};

// ---------------------------------------------------------------------------
// Assignment store
// ---------------------------------------------------------------------------

/// Source of assignment definitions.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Store a new assignment and return it with its assigned id.
    async fn create(&self, assignment: NewAssignment) -> Result<Assignment, StoreError>;

    async fn get(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError>;

    /// Apply a partial update. Returns `None` if the assignment does not exist.
    async fn update(
        &self,
        id: AssignmentId,
        update: AssignmentUpdate,
    ) -> Result<Option<Assignment>, StoreError>;

    /// Returns `true` if something was deleted.
    async fn delete(&self, id: AssignmentId) -> Result<bool, StoreError>;

    /// All assignments matching the filter, ordered by id.
    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, StoreError>;
}

/// Criteria for listing assignments. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentFilter {
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic_id: Option<TopicId>,
    #[serde(default)]
    pub kind: Option<AssignmentKind>,
    #[serde(default)]
    pub published_only: bool,
}

impl AssignmentFilter {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.class_id.map_or(true, |id| assignment.class_id == id)
            && self
                .subject
                .as_deref()
                .map_or(true, |subject| assignment.subject == subject)
            && self.topic_id.map_or(true, |id| assignment.topic_id == id)
            && self.kind.map_or(true, |kind| assignment.kind == kind)
            && (!self.published_only || assignment.published)
    }
}

// ---------------------------------------------------------------------------
// Submission store
// ---------------------------------------------------------------------------

/// Append-only history of graded submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Record a submission.
    ///
    /// Fails with [`StoreError::DuplicateAttempt`] if the attempt number is
    /// already taken for this learner and assignment.
    async fn insert(&self, submission: Submission) -> Result<(), StoreError>;

    /// Number of submissions for the pair.
    async fn count(&self, learner: LearnerId, assignment: AssignmentId) -> Result<u32, StoreError>;

    /// Submission with the highest attempt number for the pair.
    async fn latest(
        &self,
        learner: LearnerId,
        assignment: AssignmentId,
    ) -> Result<Option<Submission>, StoreError>;

    /// Every submission by a learner, newest first.
    async fn list_for_learner(&self, learner: LearnerId) -> Result<Vec<Submission>, StoreError>;

    /// Every submission against an assignment, newest first.
    async fn list_for_assignment(
        &self,
        assignment: AssignmentId,
    ) -> Result<Vec<Submission>, StoreError>;

    /// Remove all submissions for the pair. Returns how many were removed.
    async fn delete_for(
        &self,
        learner: LearnerId,
        assignment: AssignmentId,
    ) -> Result<usize, StoreError>;

    /// Remove every submission against an assignment.
    async fn delete_for_assignment(&self, assignment: AssignmentId) -> Result<usize, StoreError>;
}
