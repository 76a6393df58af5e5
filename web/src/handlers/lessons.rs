//! Lesson progress API endpoints.
//!
//! Marking a lesson complete or incomplete recomputes the course-level
//! percentage; store failures surface as 500 so the client can show a
//! failure notification instead of silently losing the update.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use flowschool_core::stores::Store;
use flowschool_core::{CourseId, LessonId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for the lesson completion toggles.
#[derive(Debug, Deserialize)]
pub struct LessonProgressRequest {
    /// Watching user.
    pub user_id: Option<Uuid>,
    /// Course the lesson belongs to.
    pub course_id: Option<Uuid>,
}

/// Response after toggling lesson completion.
#[derive(Debug, Serialize)]
pub struct LessonProgressResponse {
    /// Always `true`; failures return an error body instead.
    pub success: bool,
    /// Recomputed course percentage, absent for a course with no lessons.
    pub progress_percentage: Option<u8>,
}

/// Mark a lesson completed and recompute the course roll-up.
pub async fn mark_completed<S: Store>(
    State(state): State<AppState<S>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<LessonProgressRequest>,
) -> Result<Json<LessonProgressResponse>, AppError> {
    let (Some(user_id), Some(course_id)) = (body.user_id, body.course_id) else {
        return Err(AppError::bad_request("Missing user_id or course_id"));
    };

    let progress_percentage = state
        .progress
        .mark_completed(UserId(user_id), LessonId(lesson_id), CourseId(course_id))
        .await?;

    Ok(Json(LessonProgressResponse {
        success: true,
        progress_percentage,
    }))
}

/// Mark a lesson incomplete and recompute the course roll-up.
///
/// The percentage can move backward as a result.
pub async fn mark_incomplete<S: Store>(
    State(state): State<AppState<S>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<LessonProgressRequest>,
) -> Result<Json<LessonProgressResponse>, AppError> {
    let (Some(user_id), Some(course_id)) = (body.user_id, body.course_id) else {
        return Err(AppError::bad_request("Missing user_id or course_id"));
    };

    let progress_percentage = state
        .progress
        .mark_incomplete(UserId(user_id), LessonId(lesson_id), CourseId(course_id))
        .await?;

    Ok(Json(LessonProgressResponse {
        success: true,
        progress_percentage,
    }))
}
