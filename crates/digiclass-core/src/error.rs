//! Error types for the store and service layers.
//!
//! Grading itself has no error type: malformed answers degrade to zero
//! points. These errors cover the attempt policy around grading and the
//! storage collaborators it relies on.

use thiserror::Error;

use crate::model::{AssignmentId, LearnerId};

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(assignment, learner, attempt_no)` triple is already taken.
    #[error(
        "attempt {attempt_no} already recorded for learner {learner_id} \
         on assignment {assignment_id}"
    )]
    DuplicateAttempt {
        assignment_id: AssignmentId,
        learner_id: LearnerId,
        attempt_no: u32,
    },

    /// The backing storage failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors returned by the submission service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller's role may not perform this operation.
    #[error("{0} role required")]
    Forbidden(&'static str),

    #[error("assignment {0} not found")]
    NotFound(AssignmentId),

    #[error("assignment {0} is not published")]
    NotPublished(AssignmentId),

    /// All attempts are used up until a teacher resets them.
    #[error("no attempts left ({used} of {max} used)")]
    NoAttemptsLeft { used: u32, max: u32 },

    /// Another submission for the same learner and assignment won the race.
    #[error("attempt {attempt_no} was recorded concurrently, resubmit to use the next attempt")]
    ConcurrentAttempt { attempt_no: u32 },

    /// The request was rejected before touching the store.
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Returns `true` if the caller caused this error and should not retry as-is.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Store(StoreError::Backend(_)))
    }

    /// Returns `true` if resubmitting may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::ConcurrentAttempt { .. } | ServiceError::Store(StoreError::Backend(_))
        )
    }
}
