//! Post-authentication redirect policy.
//!
//! Pure function of the user's enrollment count with a safe fallback; this
//! is the one read that deliberately fails open to the home page, decided
//! here at the caller rather than inside the service.

use crate::services::EnrollmentService;
use crate::stores::{CourseCatalog, EnrollmentStore};
use crate::types::UserId;

/// Landing page for users with at least one enrollment.
pub const MY_LEARNING_PATH: &str = "/my-learning";

/// Default landing page.
pub const HOME_PATH: &str = "/";

/// Decide where to send a user immediately after sign-in/sign-up.
///
/// Users with one or more enrollments land on their learning page; everyone
/// else, including any user whose enrollment count cannot be read, lands on
/// the home page. No side effects.
pub async fn post_auth_redirect_path<S>(
    enrollments: &EnrollmentService<S>,
    user_id: UserId,
) -> &'static str
where
    S: CourseCatalog + EnrollmentStore,
{
    match enrollments.enrollment_count(user_id).await {
        Ok(count) if count >= 1 => MY_LEARNING_PATH,
        Ok(_) => HOME_PATH,
        Err(error) => {
            tracing::warn!(%user_id, %error, "enrollment count failed; defaulting to home");
            HOME_PATH
        }
    }
}
