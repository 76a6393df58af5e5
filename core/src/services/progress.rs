//! Lesson progress service: per-lesson completion and the course roll-up.
//!
//! Progress is never incremented. Every toggle recomputes the percentage
//! from the completed-lesson rows, so the number self-heals after missed or
//! out-of-order updates and moves backward when a lesson is un-completed.

use crate::error::Result;
use crate::stores::{
    completion_percentage, completion_status, CourseCatalog, EnrollmentStore, LessonProgressStore,
};
use crate::types::{CompletionStatus, CourseId, LessonId, LessonProgress, UserId};
use chrono::Utc;
use std::sync::Arc;

/// Records per-lesson completion and keeps the enrollment-level percentage
/// consistent with it.
///
/// Unlike the enrollment reads, the write paths here propagate store errors
/// to the caller, which is expected to surface a failure notification.
pub struct LessonProgressService<S> {
    store: Arc<S>,
}

impl<S> Clone for LessonProgressService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> LessonProgressService<S>
where
    S: LessonProgressStore + CourseCatalog + EnrollmentStore,
{
    /// Create a new lesson progress service backed by `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Mark a lesson completed and recompute the course roll-up.
    ///
    /// Returns the recomputed percentage, or `None` for a course with no
    /// lessons (nothing to roll up).
    ///
    /// # Errors
    ///
    /// Returns error if any store operation fails.
    pub async fn mark_completed(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
    ) -> Result<Option<u8>> {
        let now = Utc::now();
        self.store
            .upsert_lesson_progress(&LessonProgress {
                user_id,
                lesson_id,
                course_id,
                is_completed: true,
                completed_at: Some(now),
                last_watched_at: now,
            })
            .await?;

        self.update_enrollment_progress(user_id, course_id).await
    }

    /// Mark a lesson incomplete and recompute the course roll-up.
    ///
    /// Symmetric with [`Self::mark_completed`]; the percentage can move
    /// backward as a result.
    ///
    /// # Errors
    ///
    /// Returns error if any store operation fails.
    pub async fn mark_incomplete(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
    ) -> Result<Option<u8>> {
        self.store
            .upsert_lesson_progress(&LessonProgress {
                user_id,
                lesson_id,
                course_id,
                is_completed: false,
                completed_at: None,
                last_watched_at: Utc::now(),
            })
            .await?;

        self.update_enrollment_progress(user_id, course_id).await
    }

    /// All lesson-progress rows for a `(user, course)` pair, for building a
    /// completion map keyed by lesson id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn lesson_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>> {
        self.store.list_lesson_progress(user_id, course_id).await
    }

    /// Whether a single lesson is completed; an absent row is `false`.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn is_lesson_completed(&self, user_id: UserId, lesson_id: LessonId) -> Result<bool> {
        Ok(self
            .store
            .find_lesson_progress(user_id, lesson_id)
            .await?
            .is_some_and(|p| p.is_completed))
    }

    /// Read-only completion summary; `{0, 0, 0}` for an empty course.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn completion_status(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CompletionStatus> {
        let total = self.store.count_lessons(course_id).await?;
        if total == 0 {
            return Ok(completion_status(0, 0));
        }
        let completed = self
            .store
            .count_completed_lessons(user_id, course_id)
            .await?
            .min(total);
        Ok(completion_status(completed, total))
    }

    /// Recompute the enrollment percentage from the ground truth of
    /// completed-lesson rows and write it back.
    ///
    /// A course with zero lessons is a no-op: no percentage is computable
    /// and the enrollment row is left untouched.
    async fn update_enrollment_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<u8>> {
        let total = self.store.count_lessons(course_id).await?;
        if total == 0 {
            return Ok(None);
        }

        // A progress row filed under a course the lesson does not belong to
        // can push the completed count past the lesson total; the cap keeps
        // the stored percentage inside 0-100.
        let completed = self
            .store
            .count_completed_lessons(user_id, course_id)
            .await?
            .min(total);
        let percentage = completion_percentage(completed, total);

        self.store
            .set_progress(user_id, course_id, percentage, Utc::now())
            .await?;

        Ok(Some(percentage))
    }
}
