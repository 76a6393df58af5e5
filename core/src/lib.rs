//! # FlowSchool Core
//!
//! Enrollment and lesson-progress bookkeeping for the FlowSchool course
//! platform: who may access course content, how a verified purchase becomes
//! an enrollment, and how per-lesson completion rolls up into a course-level
//! progress percentage.
//!
//! ## Architecture
//!
//! Storage is abstracted behind async traits in [`stores`]; the services in
//! [`services`] hold the business rules and are generic over those traits so
//! the same logic runs against PostgreSQL in production and the in-memory
//! [`mocks`] in tests:
//!
//! ```text
//! HTTP handler → Service → Store trait → PostgreSQL / MemoryStore
//! ```
//!
//! ## Key invariants
//!
//! - At most one enrollment per `(user, course)` pair; enrollment is
//!   idempotent and duplicate inserts resolve at the store's uniqueness
//!   constraint, not via read-then-write.
//! - `progress_percentage` is always recomputed from the completed-lesson
//!   rows, never incremented, so it self-heals after missed updates and may
//!   move backward when a lesson is un-completed.
//! - A paid purchase row is recorded before any access is granted; the two
//!   writes share one transactional boundary.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod access;
pub mod config;
pub mod error;
pub mod gateway;
pub mod redirect;
pub mod services;
pub mod signature;
pub mod stores;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use error::{CoreError, Result};
pub use types::{
    CompletionStatus, Course, CourseId, CoursePurchase, EnrolledCourse, Enrollment, LessonId,
    LessonProgress, PurchaseStatus, UserId,
};
