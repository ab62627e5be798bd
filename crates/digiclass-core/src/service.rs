//! Submission service: attempt policy around the grading engine.
//!
//! Every submission goes through the same sequence: read the number of
//! attempts used, check it against the assignment's limit, grade, and record
//! the submission as attempt `used + 1`. The check and the insert are
//! serialized per (learner, assignment) inside this process, and the store's
//! uniqueness constraint on the attempt number catches writers from anywhere
//! else.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{ServiceError, StoreError};
use crate::grading::{grade, GradeOutcome};
use crate::model::{
    Answers, Assignment, AssignmentId, AssignmentKind, AssignmentUpdate, Grade, LearnerId,
    NewAssignment, Principal, Submission, TopicId,
};
use crate::statistics::{average_grade, grade_distribution, summarize_by_learner, LearnerSummary};
use crate::traits::{AssignmentFilter, AssignmentStore, SubmissionStore};

type PairKey = (LearnerId, AssignmentId);

/// Result of an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub submission: Submission,
    pub attempts_left: u32,
    pub outcome: GradeOutcome,
}

/// An assignment as a student sees it in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAssignment {
    pub id: AssignmentId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    pub max_attempts: u32,
    pub attempts_used: u32,
    pub attempts_left: u32,
    pub last_grade: Option<Grade>,
}

/// One row of a learner's grade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeHistoryItem {
    pub assignment_id: AssignmentId,
    pub assignment_title: String,
    pub topic_id: TopicId,
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    pub attempt_no: u32,
    pub score: u32,
    pub grade: Grade,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeHistory {
    pub avg_grade: f64,
    pub items: Vec<GradeHistoryItem>,
}

/// A page of submissions, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPage {
    pub items: Vec<Submission>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

/// Per-learner averages over a set of assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    pub assignments: usize,
    pub learners: Vec<LearnerSummary>,
    pub distribution: BTreeMap<Grade, usize>,
}

/// Remaining attempts, never negative.
pub fn attempts_left(max_attempts: u32, used: u32) -> u32 {
    max_attempts.saturating_sub(used)
}

/// Orchestrates grading, attempt limits, and submission history.
pub struct SubmissionService {
    assignments: Arc<dyn AssignmentStore>,
    submissions: Arc<dyn SubmissionStore>,
    config: ServiceConfig,
    locks: Mutex<HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubmissionService {
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        submissions: Arc<dyn SubmissionStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            assignments,
            submissions,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Attempt policy
    // -----------------------------------------------------------------------

    pub async fn attempts_used(
        &self,
        learner: LearnerId,
        assignment: AssignmentId,
    ) -> Result<u32, ServiceError> {
        Ok(self.submissions.count(learner, assignment).await?)
    }

    /// Grade and record a student's submission.
    pub async fn submit(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
        answers: Answers,
    ) -> Result<SubmitReceipt, ServiceError> {
        let learner = require_student(principal)?;
        let assignment = self.load_assignment(assignment_id).await?;
        if !assignment.published {
            tracing::warn!(
                "learner {learner} tried to submit unpublished assignment {assignment_id}"
            );
            return Err(ServiceError::NotPublished(assignment_id));
        }

        let key = (learner, assignment_id);
        let lock = self.pair_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.submit_locked(learner, &assignment, answers).await
        };
        self.release_pair_lock(key, lock);
        result
    }

    async fn submit_locked(
        &self,
        learner: LearnerId,
        assignment: &Assignment,
        answers: Answers,
    ) -> Result<SubmitReceipt, ServiceError> {
        let used = self.submissions.count(learner, assignment.id).await?;
        if used >= assignment.max_attempts {
            tracing::warn!(
                "learner {learner} has no attempts left on assignment {} ({used}/{})",
                assignment.id,
                assignment.max_attempts
            );
            return Err(ServiceError::NoAttemptsLeft {
                used,
                max: assignment.max_attempts,
            });
        }

        let outcome = grade(&assignment.questions, &answers);
        let attempt_no = used + 1;
        let submission = Submission {
            id: Uuid::new_v4(),
            assignment_id: assignment.id,
            learner_id: learner,
            attempt_no,
            answers,
            score: outcome.score,
            grade: outcome.grade,
            submitted_at: Utc::now(),
        };

        match self.submissions.insert(submission.clone()).await {
            Ok(()) => {}
            Err(StoreError::DuplicateAttempt { attempt_no, .. }) => {
                tracing::warn!(
                    "attempt {attempt_no} for learner {learner} on assignment {} \
                     was taken concurrently",
                    assignment.id
                );
                return Err(ServiceError::ConcurrentAttempt { attempt_no });
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            "graded attempt {attempt_no} for learner {learner} on assignment {}: score={} grade={}",
            assignment.id,
            outcome.score,
            outcome.grade
        );

        Ok(SubmitReceipt {
            submission,
            attempts_left: attempts_left(assignment.max_attempts, attempt_no),
            outcome,
        })
    }

    /// Clear a learner's attempts on an assignment. Teacher only.
    pub async fn reset_attempts(
        &self,
        principal: &Principal,
        learner: LearnerId,
        assignment_id: AssignmentId,
    ) -> Result<usize, ServiceError> {
        require_teacher(principal)?;

        let key = (learner, assignment_id);
        let lock = self.pair_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.submissions.delete_for(learner, assignment_id).await
        };
        self.release_pair_lock(key, lock);

        let removed = result?;
        tracing::info!(
            "{} reset {removed} attempt(s) for learner {learner} on assignment {assignment_id}",
            principal.name()
        );
        Ok(removed)
    }

    fn pair_lock(&self, key: PairKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key).or_default())
    }

    // Drops the map entry once the caller holds the last outside reference.
    fn release_pair_lock(&self, key: PairKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }
    }

    // -----------------------------------------------------------------------
    // Student views
    // -----------------------------------------------------------------------

    /// Published assignments with the caller's attempt usage and last grade.
    pub async fn student_assignments(
        &self,
        principal: &Principal,
        filter: &AssignmentFilter,
    ) -> Result<Vec<StudentAssignment>, ServiceError> {
        let learner = require_student(principal)?;

        let filter = AssignmentFilter {
            published_only: true,
            ..filter.clone()
        };
        let assignments = self.assignments.list(&filter).await?;

        let rows = try_join_all(assignments.into_iter().map(|assignment| async move {
            let used = self.submissions.count(learner, assignment.id).await?;
            let last = self.submissions.latest(learner, assignment.id).await?;
            Ok::<_, StoreError>(StudentAssignment {
                id: assignment.id,
                title: assignment.title,
                kind: assignment.kind,
                max_attempts: assignment.max_attempts,
                attempts_used: used,
                attempts_left: attempts_left(assignment.max_attempts, used),
                last_grade: last.map(|s| s.grade),
            })
        }))
        .await?;

        Ok(rows)
    }

    /// The caller's grade history, newest first, optionally for one subject.
    pub async fn student_grades(
        &self,
        principal: &Principal,
        subject: Option<&str>,
    ) -> Result<GradeHistory, ServiceError> {
        let learner = require_student(principal)?;
        self.grade_history(learner, subject).await
    }

    /// Grade history for any learner. Teacher only.
    pub async fn learner_grades(
        &self,
        principal: &Principal,
        learner: LearnerId,
        subject: Option<&str>,
    ) -> Result<GradeHistory, ServiceError> {
        require_teacher(principal)?;
        self.grade_history(learner, subject).await
    }

    async fn grade_history(
        &self,
        learner: LearnerId,
        subject: Option<&str>,
    ) -> Result<GradeHistory, ServiceError> {
        let submissions = self.submissions.list_for_learner(learner).await?;

        let ids: BTreeSet<AssignmentId> = submissions.iter().map(|s| s.assignment_id).collect();
        let fetched = try_join_all(ids.into_iter().map(|id| self.assignments.get(id))).await?;
        let assignments: HashMap<AssignmentId, Assignment> = fetched
            .into_iter()
            .flatten()
            .map(|a| (a.id, a))
            .collect();

        let mut kept = Vec::new();
        let mut items = Vec::new();
        for submission in submissions {
            // Submissions whose assignment is gone are not reported.
            let Some(assignment) = assignments.get(&submission.assignment_id) else {
                continue;
            };
            if subject.is_some_and(|subject| assignment.subject != subject) {
                continue;
            }
            items.push(GradeHistoryItem {
                assignment_id: assignment.id,
                assignment_title: assignment.title.clone(),
                topic_id: assignment.topic_id,
                kind: assignment.kind,
                attempt_no: submission.attempt_no,
                score: submission.score,
                grade: submission.grade,
                submitted_at: submission.submitted_at,
            });
            kept.push(submission);
        }

        Ok(GradeHistory {
            avg_grade: average_grade(&kept),
            items,
        })
    }

    // -----------------------------------------------------------------------
    // Teacher views and assignment management
    // -----------------------------------------------------------------------

    /// Paged submissions for an assignment, newest first. Teacher only.
    pub async fn submissions_page(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<SubmissionPage, ServiceError> {
        require_teacher(principal)?;
        if page == 0 {
            return Err(ServiceError::Invalid("page must be at least 1".into()));
        }
        let page_size = page_size
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size);

        let all = self.submissions.list_for_assignment(assignment_id).await?;
        let total = all.len();
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Ok(SubmissionPage {
            items,
            page,
            page_size,
            total,
        })
    }

    /// Per-learner averages across the assignments matching `filter`. Teacher only.
    pub async fn class_summary(
        &self,
        principal: &Principal,
        filter: &AssignmentFilter,
    ) -> Result<ClassSummary, ServiceError> {
        require_teacher(principal)?;

        let assignments = self.assignments.list(filter).await?;
        let batches = try_join_all(
            assignments
                .iter()
                .map(|a| self.submissions.list_for_assignment(a.id)),
        )
        .await?;
        let submissions: Vec<Submission> = batches.into_iter().flatten().collect();

        Ok(ClassSummary {
            assignments: assignments.len(),
            learners: summarize_by_learner(&submissions),
            distribution: grade_distribution(&submissions),
        })
    }

    pub async fn get_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, ServiceError> {
        self.load_assignment(assignment_id).await
    }

    /// Teacher only.
    pub async fn list_assignments(
        &self,
        principal: &Principal,
        filter: &AssignmentFilter,
    ) -> Result<Vec<Assignment>, ServiceError> {
        require_teacher(principal)?;
        Ok(self.assignments.list(filter).await?)
    }

    /// Teacher only.
    pub async fn create_assignment(
        &self,
        principal: &Principal,
        assignment: NewAssignment,
    ) -> Result<Assignment, ServiceError> {
        require_teacher(principal)?;
        check_max_attempts(assignment.max_attempts)?;
        if assignment.questions.is_empty() {
            return Err(ServiceError::Invalid(
                "an assignment needs at least one question".into(),
            ));
        }

        let created = self.assignments.create(assignment).await?;
        tracing::info!(
            "{} created assignment {} '{}'",
            principal.name(),
            created.id,
            created.title
        );
        Ok(created)
    }

    /// Teacher only. Past submissions keep the score they were graded with.
    pub async fn update_assignment(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> Result<Assignment, ServiceError> {
        require_teacher(principal)?;
        if let Some(max_attempts) = update.max_attempts {
            check_max_attempts(max_attempts)?;
        }
        if update.questions.as_ref().is_some_and(Vec::is_empty) {
            return Err(ServiceError::Invalid(
                "an assignment needs at least one question".into(),
            ));
        }

        let updated = self
            .assignments
            .update(assignment_id, update)
            .await?
            .ok_or(ServiceError::NotFound(assignment_id))?;
        tracing::info!(
            "{} updated assignment {assignment_id}",
            principal.name()
        );
        Ok(updated)
    }

    /// Teacher only. Removes the assignment and its submission history.
    pub async fn delete_assignment(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
    ) -> Result<usize, ServiceError> {
        require_teacher(principal)?;
        if !self.assignments.delete(assignment_id).await? {
            return Err(ServiceError::NotFound(assignment_id));
        }
        let removed = self
            .submissions
            .delete_for_assignment(assignment_id)
            .await?;
        tracing::info!(
            "{} deleted assignment {assignment_id} with {removed} submission(s)",
            principal.name()
        );
        Ok(removed)
    }

    async fn load_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, ServiceError> {
        self.assignments
            .get(assignment_id)
            .await?
            .ok_or(ServiceError::NotFound(assignment_id))
    }
}

fn require_teacher(principal: &Principal) -> Result<(), ServiceError> {
    if principal.is_teacher() {
        return Ok(());
    }
    tracing::warn!(
        "{} {} attempted a teacher-only operation",
        principal.role(),
        principal.id()
    );
    Err(ServiceError::Forbidden("teacher"))
}

fn require_student(principal: &Principal) -> Result<LearnerId, ServiceError> {
    principal.as_student().ok_or_else(|| {
        tracing::warn!(
            "{} {} attempted a student-only operation",
            principal.role(),
            principal.id()
        );
        ServiceError::Forbidden("student")
    })
}

fn check_max_attempts(max_attempts: u32) -> Result<(), ServiceError> {
    if max_attempts == 0 {
        return Err(ServiceError::Invalid(
            "max_attempts must be at least 1".into(),
        ));
    }
    Ok(())
}
