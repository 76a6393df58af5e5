//! Lesson progress roll-up tests.
//!
//! The percentage must always equal `round(100 * completed / total)`
//! recomputed from the per-lesson rows, in any marking order, moving
//! backward when lessons are un-completed, and never dividing by zero.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use flowschool_core::mocks::MemoryStore;
use flowschool_core::services::{EnrollmentService, LessonProgressService};
use flowschool_core::{Course, CourseId, LessonId, UserId};
use std::sync::Arc;

fn free_course(id: CourseId, total_lessons: u32) -> Course {
    Course {
        id,
        title: "Poi Spinning 101".to_string(),
        description: "Flow arts fundamentals".to_string(),
        thumbnail_url: None,
        instructor_id: None,
        duration_minutes: 90,
        total_lessons,
        price_minor: 0,
        level: Some("beginner".to_string()),
        tags: vec![],
        rating: None,
        is_free: true,
        is_premium: false,
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    enrollments: EnrollmentService<MemoryStore>,
    progress: LessonProgressService<MemoryStore>,
    user: UserId,
    course: CourseId,
    lessons: Vec<LessonId>,
}

async fn enrolled_fixture(lesson_count: usize) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let enrollments = EnrollmentService::new(Arc::clone(&store));
    let progress = LessonProgressService::new(Arc::clone(&store));

    let user = UserId::new();
    let course = CourseId::new();
    store.insert_course(free_course(course, lesson_count as u32));
    let lessons = store.add_lessons(course, lesson_count);
    enrollments.enroll(user, course).await.unwrap();

    Fixture {
        store,
        enrollments,
        progress,
        user,
        course,
        lessons,
    }
}

#[tokio::test]
async fn three_lesson_scenario_33_67_100_67() {
    let f = enrolled_fixture(3).await;

    let pct = f
        .progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await
        .unwrap();
    assert_eq!(pct, Some(33));

    let pct = f
        .progress
        .mark_completed(f.user, f.lessons[1], f.course)
        .await
        .unwrap();
    assert_eq!(pct, Some(67));

    let pct = f
        .progress
        .mark_completed(f.user, f.lessons[2], f.course)
        .await
        .unwrap();
    assert_eq!(pct, Some(100));

    // Un-completing moves the percentage backward: not a ratchet.
    let pct = f
        .progress
        .mark_incomplete(f.user, f.lessons[1], f.course)
        .await
        .unwrap();
    assert_eq!(pct, Some(67));

    let enrollment = f.store.enrollment(f.user, f.course).unwrap();
    assert_eq!(enrollment.progress_percentage, 67);
}

#[tokio::test]
async fn percentage_is_independent_of_marking_order() {
    let f = enrolled_fixture(8).await;

    // Mark 5 of 8 in a scrambled order: round(100 * 5 / 8) = 63.
    for index in [6, 2, 7, 0, 4] {
        f.progress
            .mark_completed(f.user, f.lessons[index], f.course)
            .await
            .unwrap();
    }

    let status = f.progress.completion_status(f.user, f.course).await.unwrap();
    assert_eq!(status.completed, 5);
    assert_eq!(status.total, 8);
    assert_eq!(status.percentage, 63);
    assert_eq!(
        f.store.enrollment(f.user, f.course).unwrap().progress_percentage,
        63
    );
}

#[tokio::test]
async fn marking_the_same_lesson_twice_counts_once() {
    let f = enrolled_fixture(3).await;

    f.progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await
        .unwrap();
    let pct = f
        .progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await
        .unwrap();

    assert_eq!(pct, Some(33));
    let status = f.progress.completion_status(f.user, f.course).await.unwrap();
    assert_eq!(status.completed, 1);
}

#[tokio::test]
async fn empty_course_rollup_is_a_noop() {
    let f = enrolled_fixture(0).await;
    let before = f.store.enrollment(f.user, f.course).unwrap();

    // No lessons exist, so no percentage is computable; the recompute must
    // neither error nor touch the enrollment row.
    let phantom = LessonId::new();
    let pct = f
        .progress
        .mark_completed(f.user, phantom, f.course)
        .await
        .unwrap();
    assert_eq!(pct, None);
    assert_eq!(f.store.enrollment(f.user, f.course).unwrap(), before);

    let status = f.progress.completion_status(f.user, f.course).await.unwrap();
    assert_eq!((status.completed, status.total, status.percentage), (0, 0, 0));
}

#[tokio::test]
async fn foreign_lesson_rows_cannot_push_progress_past_100() {
    let f = enrolled_fixture(1).await;

    f.progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await
        .unwrap();

    // A lesson that belongs to another course, filed under this one: the
    // completed count is capped at the lesson total so the percentage stays
    // inside 0-100.
    let foreign = LessonId::new();
    let pct = f
        .progress
        .mark_completed(f.user, foreign, f.course)
        .await
        .unwrap();
    assert_eq!(pct, Some(100));
    assert_eq!(
        f.store.enrollment(f.user, f.course).unwrap().progress_percentage,
        100
    );

    let status = f.progress.completion_status(f.user, f.course).await.unwrap();
    assert_eq!((status.completed, status.total, status.percentage), (1, 1, 100));
}

#[tokio::test]
async fn lesson_completion_flags_round_trip() {
    let f = enrolled_fixture(2).await;

    assert!(!f
        .progress
        .is_lesson_completed(f.user, f.lessons[0])
        .await
        .unwrap());

    f.progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await
        .unwrap();
    assert!(f
        .progress
        .is_lesson_completed(f.user, f.lessons[0])
        .await
        .unwrap());

    f.progress
        .mark_incomplete(f.user, f.lessons[0], f.course)
        .await
        .unwrap();
    assert!(!f
        .progress
        .is_lesson_completed(f.user, f.lessons[0])
        .await
        .unwrap());

    // The row survives as incomplete; completed_at is cleared.
    let rows = f.progress.lesson_progress(f.user, f.course).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_completed);
    assert_eq!(rows[0].completed_at, None);
}

#[tokio::test]
async fn progress_listing_builds_a_completion_map() {
    let f = enrolled_fixture(3).await;

    f.progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await
        .unwrap();
    f.progress
        .mark_completed(f.user, f.lessons[2], f.course)
        .await
        .unwrap();

    let rows = f.progress.lesson_progress(f.user, f.course).await.unwrap();
    let completed: std::collections::HashMap<_, _> =
        rows.iter().map(|p| (p.lesson_id, p.is_completed)).collect();

    assert_eq!(completed.get(&f.lessons[0]), Some(&true));
    assert_eq!(completed.get(&f.lessons[1]), None);
    assert_eq!(completed.get(&f.lessons[2]), Some(&true));
}

#[tokio::test]
async fn write_errors_propagate_to_the_caller() {
    let f = enrolled_fixture(3).await;

    f.store.set_failing(true);
    let result = f
        .progress
        .mark_completed(f.user, f.lessons[0], f.course)
        .await;
    assert!(result.is_err());

    // Reads from the enrollment side keep their own error contract too.
    assert!(f.enrollments.progress(f.user, f.course).await.is_err());
}
