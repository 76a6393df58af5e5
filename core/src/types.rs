//! Domain types for courses, enrollments, lesson progress and purchases.
//!
//! Rows coming back from the store are modeled as explicit structs with
//! required fields; malformed rows are rejected at the store boundary rather
//! than flowing through as loosely-typed maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user (owned by the external auth provider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub uuid::Uuid);

impl CourseId {
    /// Generate a new random `CourseId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LessonId(pub uuid::Uuid);

impl LessonId {
    /// Generate a new random `LessonId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for LessonId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LessonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Catalog Types (read-only from this crate's perspective)
// ═══════════════════════════════════════════════════════════════════════

/// Course catalog entry.
///
/// Owned by the data store; this crate only reads it to decide enrollment
/// eligibility and to join course metadata onto enrollment listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course identifier.
    pub id: CourseId,
    /// Display title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Thumbnail image URL.
    pub thumbnail_url: Option<String>,
    /// Instructor user id.
    pub instructor_id: Option<UserId>,
    /// Total runtime in minutes.
    pub duration_minutes: u32,
    /// Number of lessons advertised for the course.
    pub total_lessons: u32,
    /// Price in the smallest currency unit (paise).
    pub price_minor: i64,
    /// Difficulty level (e.g. "beginner").
    pub level: Option<String>,
    /// Free-text tags.
    pub tags: Vec<String>,
    /// Average rating.
    pub rating: Option<f64>,
    /// Whether the course can be enrolled in without payment.
    pub is_free: bool,
    /// Whether the course is flagged as premium content.
    pub is_premium: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// Enrollment
// ═══════════════════════════════════════════════════════════════════════

/// One enrollment row per `(user, course)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrolled user.
    pub user_id: UserId,
    /// Enrolled course.
    pub course_id: CourseId,
    /// Set once at creation.
    pub enrolled_at: DateTime<Utc>,
    /// 0–100, recomputed from completed-lesson counts, never incremented.
    pub progress_percentage: u8,
    /// Bumped on every progress mutation.
    pub last_accessed_at: DateTime<Utc>,
    /// `None` until the course is completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// Create a fresh enrollment at 0% progress.
    #[must_use]
    pub const fn new(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            enrolled_at: now,
            progress_percentage: 0,
            last_accessed_at: now,
            completed_at: None,
        }
    }
}

/// An enrollment joined with its course metadata, for display listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCourse {
    /// The enrollment row.
    pub enrollment: Enrollment,
    /// The joined course.
    pub course: Course,
}

// ═══════════════════════════════════════════════════════════════════════
// Lesson Progress
// ═══════════════════════════════════════════════════════════════════════

/// One row per `(user, lesson)` pair, upserted on conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    /// Watching user.
    pub user_id: UserId,
    /// The lesson.
    pub lesson_id: LessonId,
    /// Denormalized course id for per-course queries.
    pub course_id: CourseId,
    /// Completion flag; drives the course-level roll-up.
    pub is_completed: bool,
    /// Set when marked completed, cleared when marked incomplete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Bumped on every mutation.
    pub last_watched_at: DateTime<Utc>,
}

/// Read-only course completion summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    /// Number of completed lessons.
    pub completed: u32,
    /// Total lessons in the course.
    pub total: u32,
    /// `round(100 * completed / total)`; 0 for an empty course.
    pub percentage: u8,
}

// ═══════════════════════════════════════════════════════════════════════
// Purchases
// ═══════════════════════════════════════════════════════════════════════

/// Outcome of a single payment verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Signature verified and purchase recorded.
    Paid,
    /// Signature mismatch; recorded for the audit trail only.
    Failed,
}

impl PurchaseStatus {
    /// Stable string form used in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only log entry for a payment attempt.
///
/// Both the success and failure paths of verification insert a row; this is
/// an audit log, not a mutable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePurchase {
    /// Paying user.
    pub user_id: UserId,
    /// Purchased course.
    pub course_id: CourseId,
    /// Gateway payment id.
    pub payment_id: String,
    /// Gateway order id.
    pub order_id: String,
    /// Client-supplied signature, kept verbatim for the audit trail.
    pub signature: String,
    /// Amount in the smallest currency unit.
    pub amount_minor: i64,
    /// Verification outcome.
    pub status: PurchaseStatus,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}
