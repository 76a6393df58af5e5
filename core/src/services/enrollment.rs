//! Enrollment service: eligibility, idempotent creation, progress lookup.

use crate::error::{CoreError, Result};
use crate::stores::{CourseCatalog, EnrollmentStore};
use crate::types::{Course, CourseId, EnrolledCourse, Enrollment, UserId};
use chrono::Utc;
use std::sync::Arc;

/// Outcome of an enrollment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentOutcome {
    /// A new enrollment row was created.
    Enrolled {
        /// The inserted row.
        enrollment: Enrollment,
        /// The course, for building user-facing messages.
        course: Course,
    },
    /// The user was already enrolled; no write was performed.
    AlreadyEnrolled,
}

impl EnrollmentOutcome {
    /// User-facing message for this outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Enrolled { course, .. } => {
                format!("Successfully enrolled in {}", course.title)
            }
            Self::AlreadyEnrolled => "Already enrolled".to_string(),
        }
    }
}

/// Decides enrollment eligibility, creates enrollment records and exposes
/// progress lookups.
///
/// Free courses enroll directly through [`EnrollmentService::enroll`]; paid
/// courses must go through the payment verification path, which grants the
/// enrollment transactionally with the purchase record.
pub struct EnrollmentService<S> {
    store: Arc<S>,
}

impl<S> Clone for EnrollmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> EnrollmentService<S>
where
    S: CourseCatalog + EnrollmentStore,
{
    /// Create a new enrollment service backed by `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// True iff an enrollment row exists for the pair.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails; the caller decides whether
    /// that fails open or closed.
    pub async fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> Result<bool> {
        Ok(self.store.find_enrollment(user_id, course_id).await?.is_some())
    }

    /// Enroll a user in a free course, idempotently.
    ///
    /// A second call for the same pair returns
    /// [`EnrollmentOutcome::AlreadyEnrolled`] without writing. Duplicate
    /// concurrent submissions resolve at the store's uniqueness constraint.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CourseNotFound`] if the course does not exist
    /// - [`CoreError::PaidCourse`] if the course is not free
    /// - [`CoreError::Store`] on store failure
    pub async fn enroll(&self, user_id: UserId, course_id: CourseId) -> Result<EnrollmentOutcome> {
        if self.is_enrolled(user_id, course_id).await? {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        let course = self.store.get_course(course_id).await?;
        if !course.is_free {
            return Err(CoreError::PaidCourse);
        }

        let enrollment = Enrollment::new(user_id, course_id, Utc::now());
        let inserted = self.store.insert_enrollment(&enrollment).await?;
        if inserted {
            Ok(EnrollmentOutcome::Enrolled { enrollment, course })
        } else {
            // Lost a race with a concurrent enroll; the constraint already
            // holds the invariant.
            Ok(EnrollmentOutcome::AlreadyEnrolled)
        }
    }

    /// Single-row progress lookup; `Ok(None)` when not enrolled.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>> {
        self.store.find_enrollment(user_id, course_id).await
    }

    /// Low-level progress setter; also bumps `last_accessed_at`.
    ///
    /// Used by the lesson-progress roll-up. Direct callers bypass the
    /// recomputation and must supply a percentage derived from real
    /// completion state.
    ///
    /// # Errors
    ///
    /// - [`CoreError::EnrollmentNotFound`] if no row exists for the pair
    /// - [`CoreError::Store`] on store failure
    pub async fn set_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        percentage: u8,
    ) -> Result<()> {
        self.store
            .set_progress(user_id, course_id, percentage.min(100), Utc::now())
            .await
    }

    /// Force-set an enrollment to 100% with `completed_at` stamped.
    ///
    /// Trust boundary: this bypasses the lesson-count recomputation and is
    /// reserved for admin overrides; callers must ensure it corresponds to
    /// real completion.
    ///
    /// # Errors
    ///
    /// - [`CoreError::EnrollmentNotFound`] if no row exists for the pair
    /// - [`CoreError::Store`] on store failure
    pub async fn complete(&self, user_id: UserId, course_id: CourseId) -> Result<()> {
        self.store
            .complete_enrollment(user_id, course_id, Utc::now())
            .await
    }

    /// All enrollments for a user joined with course metadata, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn enrollments_for(&self, user_id: UserId) -> Result<Vec<EnrolledCourse>> {
        self.store.list_enrollments(user_id).await
    }

    /// Number of enrollments for a user (drives the redirect policy).
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn enrollment_count(&self, user_id: UserId) -> Result<u64> {
        self.store.count_enrollments(user_id).await
    }
}
