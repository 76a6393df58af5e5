//! Course content access gate.
//!
//! Cross-cutting rule: content is accessible iff the course is free or the
//! user holds an enrollment. Callers re-evaluate this whenever enrollment
//! state changes (after a free enroll or a verified payment).

use crate::services::EnrollmentService;
use crate::stores::{CourseCatalog, EnrollmentStore};
use crate::types::{Course, UserId};

/// Whether `user_id` may view the content of `course`.
///
/// Free courses are always accessible. For paid courses an enrollment-check
/// failure denies access: unlike the redirect policy, gating content fails
/// closed.
pub async fn can_access_course<S>(
    enrollments: &EnrollmentService<S>,
    user_id: UserId,
    course: &Course,
) -> bool
where
    S: CourseCatalog + EnrollmentStore,
{
    if course.is_free {
        return true;
    }

    match enrollments.is_enrolled(user_id, course.id).await {
        Ok(enrolled) => enrolled,
        Err(error) => {
            tracing::warn!(%user_id, course_id = %course.id, %error, "enrollment check failed; denying access");
            false
        }
    }
}
