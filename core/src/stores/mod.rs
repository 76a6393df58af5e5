//! Store traits: the seam between the services and the relational store.
//!
//! All methods return `Send` futures so the HTTP layer can drive them from
//! spawned tasks. Production uses the PostgreSQL implementation in
//! `flowschool-postgres`; tests use [`crate::mocks::MemoryStore`]. A single
//! store type typically implements every trait here.

use crate::error::Result;
use crate::types::{
    CompletionStatus, Course, CourseId, CoursePurchase, EnrolledCourse, Enrollment, LessonId,
    LessonProgress, UserId,
};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Read-only access to the course catalog.
pub trait CourseCatalog: Send + Sync {
    /// Get a course by id.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Store query fails
    /// - Course not found → `CoreError::CourseNotFound`
    fn get_course(&self, course_id: CourseId) -> impl Future<Output = Result<Course>> + Send;

    /// Count the lessons belonging to a course.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn count_lessons(&self, course_id: CourseId) -> impl Future<Output = Result<u32>> + Send;
}

/// Enrollment rows, keyed by `(user_id, course_id)`.
pub trait EnrollmentStore: Send + Sync {
    /// Look up the enrollment for a `(user, course)` pair.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails. Absence of a row is
    /// `Ok(None)`, not an error.
    fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Option<Enrollment>>> + Send;

    /// Insert an enrollment, treating a uniqueness-constraint conflict as a
    /// no-op.
    ///
    /// Returns `true` if a new row was inserted, `false` if an enrollment
    /// already existed. Conflict-as-no-op removes the read-then-insert race
    /// on double submission.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    fn insert_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Set the progress percentage and bump `last_accessed_at`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Store write fails
    /// - No enrollment row exists → `CoreError::EnrollmentNotFound`
    fn set_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        percentage: u8,
        accessed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Force-complete an enrollment: 100% and `completed_at` set.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Store write fails
    /// - No enrollment row exists → `CoreError::EnrollmentNotFound`
    fn complete_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// All enrollments for a user joined with course metadata, newest
    /// enrollment first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_enrollments(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<EnrolledCourse>>> + Send;

    /// Number of enrollments for a user.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn count_enrollments(&self, user_id: UserId) -> impl Future<Output = Result<u64>> + Send;
}

/// Per-lesson completion rows, keyed by `(user_id, lesson_id)`.
pub trait LessonProgressStore: Send + Sync {
    /// Insert or update a lesson-progress row (conflict key
    /// `(user_id, lesson_id)`).
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    fn upsert_lesson_progress(
        &self,
        progress: &LessonProgress,
    ) -> impl Future<Output = Result<()>> + Send;

    /// All lesson-progress rows for a `(user, course)` pair.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_lesson_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Vec<LessonProgress>>> + Send;

    /// Look up a single lesson-progress row.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails. Absence of a row is
    /// `Ok(None)`.
    fn find_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> impl Future<Output = Result<Option<LessonProgress>>> + Send;

    /// Count completed lessons for a `(user, course)` pair.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn count_completed_lessons(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<u32>> + Send;
}

/// Append-only purchase log plus the transactional paid-purchase path.
pub trait PurchaseStore: Send + Sync {
    /// Append a purchase attempt to the log.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    fn record_purchase(
        &self,
        purchase: &CoursePurchase,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Record a paid purchase and the idempotent enrollment it grants in a
    /// single transaction.
    ///
    /// The financial record precedes the access grant: if either write
    /// fails, both roll back. Returns `true` if a new enrollment was
    /// created, `false` if the user was already enrolled.
    ///
    /// # Errors
    ///
    /// Returns error if the transaction fails.
    fn record_paid_purchase_and_enroll(
        &self,
        purchase: &CoursePurchase,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Convenience alias for a store implementing every trait the services need.
pub trait Store:
    CourseCatalog + EnrollmentStore + LessonProgressStore + PurchaseStore + 'static
{
}

impl<T> Store for T where
    T: CourseCatalog + EnrollmentStore + LessonProgressStore + PurchaseStore + 'static
{
}

/// Compute the rolled-up completion percentage.
///
/// Standard round-half-up integer rounding; callers guard `total == 0`
/// before calling (an empty course has no meaningful percentage).
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn completion_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    ((f64::from(completed) * 100.0) / f64::from(total)).round() as u8
}

/// Build a [`CompletionStatus`] from raw counts.
#[must_use]
pub fn completion_status(completed: u32, total: u32) -> CompletionStatus {
    CompletionStatus {
        completed,
        total,
        percentage: completion_percentage(completed, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(3, 3), 100);
        assert_eq!(completion_percentage(1, 2), 50);
        assert_eq!(completion_percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(completion_percentage(0, 5), 0);
    }

    #[test]
    fn zero_total_is_zero_not_a_panic() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(3, 0), 0);
        assert_eq!(
            completion_status(0, 0),
            CompletionStatus {
                completed: 0,
                total: 0,
                percentage: 0
            }
        );
    }
}
