//! In-memory store for testing.

use crate::error::{CoreError, Result};
use crate::stores::{CourseCatalog, EnrollmentStore, LessonProgressStore, PurchaseStore};
use crate::types::{
    Course, CourseId, CoursePurchase, EnrolledCourse, Enrollment, LessonId, LessonProgress, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory implementation of all store traits.
///
/// Uses `Arc<Mutex<HashMap>>` interior state so clones share the same data,
/// matching how a pool-backed store behaves. The uniqueness invariants are
/// enforced the same way the SQL schema enforces them: by key, at insert.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    lessons: Arc<Mutex<HashMap<CourseId, Vec<LessonId>>>>,
    enrollments: Arc<Mutex<HashMap<(UserId, CourseId), Enrollment>>>,
    lesson_progress: Arc<Mutex<HashMap<(UserId, LessonId), LessonProgress>>>,
    purchases: Arc<Mutex<Vec<CoursePurchase>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a course into the catalog.
    pub fn insert_course(&self, course: Course) {
        if let Ok(mut guard) = self.courses.lock() {
            guard.insert(course.id, course);
        }
    }

    /// Seed `count` lessons for a course and return their ids.
    pub fn add_lessons(&self, course_id: CourseId, count: usize) -> Vec<LessonId> {
        let ids: Vec<LessonId> = (0..count).map(|_| LessonId::new()).collect();
        if let Ok(mut guard) = self.lessons.lock() {
            guard.entry(course_id).or_default().extend(ids.iter().copied());
        }
        ids
    }

    /// Simulate (or clear) a store outage: every operation fails with
    /// [`CoreError::Store`] while enabled.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the purchase log, in insertion order.
    #[must_use]
    pub fn purchases(&self) -> Vec<CoursePurchase> {
        self.purchases.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Direct enrollment lookup for assertions.
    #[must_use]
    pub fn enrollment(&self, user_id: UserId, course_id: CourseId) -> Option<Enrollment> {
        self.enrollments
            .lock()
            .ok()
            .and_then(|g| g.get(&(user_id, course_id)).cloned())
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CoreError::Store("simulated store outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CourseCatalog for MemoryStore {
    fn get_course(&self, course_id: CourseId) -> impl Future<Output = Result<Course>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            this.courses
                .lock()
                .map_err(|_| CoreError::Internal)?
                .get(&course_id)
                .cloned()
                .ok_or(CoreError::CourseNotFound)
        }
    }

    fn count_lessons(&self, course_id: CourseId) -> impl Future<Output = Result<u32>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let guard = this.lessons.lock().map_err(|_| CoreError::Internal)?;
            Ok(guard.get(&course_id).map_or(0, |l| l.len() as u32))
        }
    }
}

impl EnrollmentStore for MemoryStore {
    fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Option<Enrollment>>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let guard = this.enrollments.lock().map_err(|_| CoreError::Internal)?;
            Ok(guard.get(&(user_id, course_id)).cloned())
        }
    }

    fn insert_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<bool>> + Send {
        let this = self.clone();
        let enrollment = enrollment.clone();

        async move {
            this.check_available()?;
            let mut guard = this.enrollments.lock().map_err(|_| CoreError::Internal)?;
            let key = (enrollment.user_id, enrollment.course_id);
            if guard.contains_key(&key) {
                // Conflict on the uniqueness key is the no-op case.
                return Ok(false);
            }
            guard.insert(key, enrollment);
            Ok(true)
        }
    }

    fn set_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        percentage: u8,
        accessed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let mut guard = this.enrollments.lock().map_err(|_| CoreError::Internal)?;
            let enrollment = guard
                .get_mut(&(user_id, course_id))
                .ok_or(CoreError::EnrollmentNotFound)?;
            enrollment.progress_percentage = percentage;
            enrollment.last_accessed_at = accessed_at;
            Ok(())
        }
    }

    fn complete_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let mut guard = this.enrollments.lock().map_err(|_| CoreError::Internal)?;
            let enrollment = guard
                .get_mut(&(user_id, course_id))
                .ok_or(CoreError::EnrollmentNotFound)?;
            enrollment.progress_percentage = 100;
            enrollment.completed_at = Some(completed_at);
            enrollment.last_accessed_at = completed_at;
            Ok(())
        }
    }

    fn list_enrollments(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<EnrolledCourse>>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let enrollments = this.enrollments.lock().map_err(|_| CoreError::Internal)?;
            let courses = this.courses.lock().map_err(|_| CoreError::Internal)?;

            let mut joined: Vec<EnrolledCourse> = enrollments
                .values()
                .filter(|e| e.user_id == user_id)
                .filter_map(|e| {
                    courses.get(&e.course_id).map(|course| EnrolledCourse {
                        enrollment: e.clone(),
                        course: course.clone(),
                    })
                })
                .collect();
            joined.sort_by(|a, b| b.enrollment.enrolled_at.cmp(&a.enrollment.enrolled_at));
            Ok(joined)
        }
    }

    fn count_enrollments(&self, user_id: UserId) -> impl Future<Output = Result<u64>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let guard = this.enrollments.lock().map_err(|_| CoreError::Internal)?;
            Ok(guard.values().filter(|e| e.user_id == user_id).count() as u64)
        }
    }
}

impl LessonProgressStore for MemoryStore {
    fn upsert_lesson_progress(
        &self,
        progress: &LessonProgress,
    ) -> impl Future<Output = Result<()>> + Send {
        let this = self.clone();
        let progress = progress.clone();

        async move {
            this.check_available()?;
            let mut guard = this.lesson_progress.lock().map_err(|_| CoreError::Internal)?;
            guard.insert((progress.user_id, progress.lesson_id), progress);
            Ok(())
        }
    }

    fn list_lesson_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Vec<LessonProgress>>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let guard = this.lesson_progress.lock().map_err(|_| CoreError::Internal)?;
            Ok(guard
                .values()
                .filter(|p| p.user_id == user_id && p.course_id == course_id)
                .cloned()
                .collect())
        }
    }

    fn find_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> impl Future<Output = Result<Option<LessonProgress>>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let guard = this.lesson_progress.lock().map_err(|_| CoreError::Internal)?;
            Ok(guard.get(&(user_id, lesson_id)).cloned())
        }
    }

    fn count_completed_lessons(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<u32>> + Send {
        let this = self.clone();

        async move {
            this.check_available()?;
            let guard = this.lesson_progress.lock().map_err(|_| CoreError::Internal)?;
            Ok(guard
                .values()
                .filter(|p| p.user_id == user_id && p.course_id == course_id && p.is_completed)
                .count() as u32)
        }
    }
}

impl PurchaseStore for MemoryStore {
    fn record_purchase(
        &self,
        purchase: &CoursePurchase,
    ) -> impl Future<Output = Result<()>> + Send {
        let this = self.clone();
        let purchase = purchase.clone();

        async move {
            this.check_available()?;
            this.purchases
                .lock()
                .map_err(|_| CoreError::Internal)?
                .push(purchase);
            Ok(())
        }
    }

    fn record_paid_purchase_and_enroll(
        &self,
        purchase: &CoursePurchase,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<bool>> + Send {
        let this = self.clone();
        let purchase = purchase.clone();
        let enrollment = enrollment.clone();

        async move {
            this.check_available()?;
            // Both locks held for the duration mirrors the transactional
            // boundary of the SQL implementation.
            let mut purchases = this.purchases.lock().map_err(|_| CoreError::Internal)?;
            let mut enrollments = this.enrollments.lock().map_err(|_| CoreError::Internal)?;

            purchases.push(purchase);
            let key = (enrollment.user_id, enrollment.course_id);
            if enrollments.contains_key(&key) {
                return Ok(false);
            }
            enrollments.insert(key, enrollment);
            Ok(true)
        }
    }
}
