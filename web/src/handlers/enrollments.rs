//! Enrollment API endpoints.
//!
//! Free-course direct enrollment, per-user listings, the read-only progress
//! view, the content access gate and the post-auth redirect.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use flowschool_core::access::can_access_course;
use flowschool_core::redirect::post_auth_redirect_path;
use flowschool_core::services::EnrollmentOutcome;
use flowschool_core::stores::{CourseCatalog, Store};
use flowschool_core::{CompletionStatus, CourseId, EnrolledCourse, Enrollment, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to enroll in a free course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    /// Enrolling user.
    pub user_id: Option<Uuid>,
    /// Course to enroll in.
    pub course_id: Option<Uuid>,
}

/// Enrollment outcome returned to the client.
#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    /// `true` when a new enrollment row was created.
    pub enrolled: bool,
    /// User-facing message for the outcome.
    pub message: String,
}

/// Enroll a user in a free course, idempotently.
///
/// Paid courses are rejected with 400; a repeated call returns 200 with
/// "Already enrolled" and performs no write.
pub async fn enroll<S: Store>(
    State(state): State<AppState<S>>,
    Json(body): Json<EnrollRequest>,
) -> Result<Json<EnrollResponse>, AppError> {
    let (Some(user_id), Some(course_id)) = (body.user_id, body.course_id) else {
        return Err(AppError::bad_request("Missing user_id or course_id"));
    };

    let outcome = state
        .enrollments
        .enroll(UserId(user_id), CourseId(course_id))
        .await?;

    Ok(Json(EnrollResponse {
        enrolled: matches!(outcome, EnrollmentOutcome::Enrolled { .. }),
        message: outcome.message(),
    }))
}

/// Per-user enrollment listing.
#[derive(Debug, Serialize)]
pub struct EnrollmentListResponse {
    /// Enrollments joined with course metadata, newest first.
    pub enrollments: Vec<EnrolledCourse>,
}

/// List a user's enrollments with course metadata, newest first.
pub async fn list_enrollments<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<EnrollmentListResponse>, AppError> {
    let enrollments = state.enrollments.enrollments_for(UserId(user_id)).await?;
    Ok(Json(EnrollmentListResponse { enrollments }))
}

/// Course progress view for one `(user, course)` pair.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// The enrollment row, absent when the user is not enrolled.
    pub enrollment: Option<Enrollment>,
    /// Completed/total/percentage roll-up, recomputed on read.
    pub status: CompletionStatus,
}

/// Read-only progress for a user in a course.
pub async fn course_progress<S: Store>(
    State(state): State<AppState<S>>,
    Path((user_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProgressResponse>, AppError> {
    let user = UserId(user_id);
    let course = CourseId(course_id);

    let enrollment = state.enrollments.progress(user, course).await?;
    let status = state.progress.completion_status(user, course).await?;

    Ok(Json(ProgressResponse { enrollment, status }))
}

/// Access gate verdict.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    /// Whether the user may view the course content.
    pub can_access: bool,
}

/// Content access gate: free course or enrolled user.
///
/// An unknown course is 404; an enrollment-check failure denies access
/// rather than erroring, so the response stays a verdict.
pub async fn course_access<S: Store>(
    State(state): State<AppState<S>>,
    Path((user_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AccessResponse>, AppError> {
    let course = state.store.get_course(CourseId(course_id)).await?;
    let can_access = can_access_course(&state.enrollments, UserId(user_id), &course).await;
    Ok(Json(AccessResponse { can_access }))
}

/// Post-auth redirect target.
#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    /// Path to send the user to after sign-in/sign-up.
    pub redirect: String,
}

/// Where to land a user immediately after authentication.
///
/// Never fails: a store outage falls back to the home page inside the
/// policy.
pub async fn post_auth_redirect<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> Json<RedirectResponse> {
    let path = post_auth_redirect_path(&state.enrollments, UserId(user_id)).await;
    Json(RedirectResponse {
        redirect: path.to_string(),
    })
}
