//! Enrollment service integration tests.
//!
//! Exercised against the in-memory store: idempotent free enrollment, the
//! paid-course guard, listings, the redirect policy boundary and the access
//! gate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect

use flowschool_core::access::can_access_course;
use flowschool_core::mocks::MemoryStore;
use flowschool_core::redirect::{post_auth_redirect_path, HOME_PATH, MY_LEARNING_PATH};
use flowschool_core::services::{EnrollmentOutcome, EnrollmentService};
use flowschool_core::stores::EnrollmentStore;
use flowschool_core::{CoreError, Course, CourseId, Enrollment, UserId};
use chrono::Utc;
use std::sync::Arc;

fn course(id: CourseId, title: &str, is_free: bool) -> Course {
    Course {
        id,
        title: title.to_string(),
        description: "Flow arts fundamentals".to_string(),
        thumbnail_url: None,
        instructor_id: None,
        duration_minutes: 90,
        total_lessons: 3,
        price_minor: if is_free { 0 } else { 49_900 },
        level: Some("beginner".to_string()),
        tags: vec!["flow".to_string()],
        rating: Some(4.8),
        is_free,
        is_premium: !is_free,
    }
}

fn setup() -> (Arc<MemoryStore>, EnrollmentService<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = EnrollmentService::new(Arc::clone(&store));
    (store, service)
}

#[tokio::test]
async fn free_enrollment_is_idempotent() {
    let (store, service) = setup();
    let user = UserId::new();
    let course_id = CourseId::new();
    store.insert_course(course(course_id, "Poi Spinning 101", true));

    let first = service.enroll(user, course_id).await.unwrap();
    match &first {
        EnrollmentOutcome::Enrolled { enrollment, .. } => {
            assert_eq!(enrollment.progress_percentage, 0);
            assert_eq!(enrollment.completed_at, None);
        }
        EnrollmentOutcome::AlreadyEnrolled => panic!("first enroll should insert"),
    }
    assert_eq!(
        first.message(),
        "Successfully enrolled in Poi Spinning 101"
    );

    let before = store.enrollment(user, course_id).unwrap();

    let second = service.enroll(user, course_id).await.unwrap();
    assert_eq!(second, EnrollmentOutcome::AlreadyEnrolled);
    assert_eq!(second.message(), "Already enrolled");

    // The second call performed no write.
    assert_eq!(store.enrollment(user, course_id).unwrap(), before);
    assert_eq!(service.enrollment_count(user).await.unwrap(), 1);
}

#[tokio::test]
async fn paid_course_cannot_be_enrolled_directly() {
    let (store, service) = setup();
    let user = UserId::new();
    let course_id = CourseId::new();
    store.insert_course(course(course_id, "Advanced Staff", false));

    let err = service.enroll(user, course_id).await.unwrap_err();
    assert_eq!(err, CoreError::PaidCourse);
    assert!(store.enrollment(user, course_id).is_none());
    assert!(!service.is_enrolled(user, course_id).await.unwrap());
}

#[tokio::test]
async fn unknown_course_is_an_error() {
    let (_store, service) = setup();
    let err = service.enroll(UserId::new(), CourseId::new()).await.unwrap_err();
    assert_eq!(err, CoreError::CourseNotFound);
}

#[tokio::test]
async fn listings_are_newest_first_with_course_metadata() {
    let (store, service) = setup();
    let user = UserId::new();

    let first = CourseId::new();
    let second = CourseId::new();
    store.insert_course(course(first, "Poi Spinning 101", true));
    store.insert_course(course(second, "Contact Staff Basics", true));

    service.enroll(user, first).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service.enroll(user, second).await.unwrap();

    let listed = service.enrollments_for(user).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].course.title, "Contact Staff Basics");
    assert_eq!(listed[1].course.title, "Poi Spinning 101");
}

#[tokio::test]
async fn set_progress_requires_an_enrollment() {
    let (store, service) = setup();
    let user = UserId::new();
    let course_id = CourseId::new();
    store.insert_course(course(course_id, "Poi Spinning 101", true));

    let err = service.set_progress(user, course_id, 50).await.unwrap_err();
    assert_eq!(err, CoreError::EnrollmentNotFound);
}

#[tokio::test]
async fn complete_forces_full_progress() {
    let (store, service) = setup();
    let user = UserId::new();
    let course_id = CourseId::new();
    store.insert_course(course(course_id, "Poi Spinning 101", true));
    service.enroll(user, course_id).await.unwrap();

    service.complete(user, course_id).await.unwrap();

    let enrollment = store.enrollment(user, course_id).unwrap();
    assert_eq!(enrollment.progress_percentage, 100);
    assert!(enrollment.completed_at.is_some());
}

#[tokio::test]
async fn redirect_policy_boundary() {
    let (store, service) = setup();
    let user = UserId::new();
    let course_id = CourseId::new();
    store.insert_course(course(course_id, "Poi Spinning 101", true));

    // Zero enrollments → home.
    assert_eq!(post_auth_redirect_path(&service, user).await, HOME_PATH);

    // Transitioning from 0 to 1 flips the next redirect.
    service.enroll(user, course_id).await.unwrap();
    assert_eq!(
        post_auth_redirect_path(&service, user).await,
        MY_LEARNING_PATH
    );
}

#[tokio::test]
async fn redirect_policy_fails_open_to_home() {
    let (store, service) = setup();
    let user = UserId::new();

    store.set_failing(true);
    assert_eq!(post_auth_redirect_path(&service, user).await, HOME_PATH);
}

#[tokio::test]
async fn access_gate_free_or_enrolled() {
    let (store, service) = setup();
    let user = UserId::new();

    let free_id = CourseId::new();
    let paid_id = CourseId::new();
    let free = course(free_id, "Poi Spinning 101", true);
    let paid = course(paid_id, "Advanced Staff", false);
    store.insert_course(free.clone());
    store.insert_course(paid.clone());

    assert!(can_access_course(&service, user, &free).await);
    assert!(!can_access_course(&service, user, &paid).await);

    // An enrollment (as granted by the payment path) opens the paid course.
    store
        .insert_enrollment(&Enrollment::new(user, paid_id, Utc::now()))
        .await
        .unwrap();
    assert!(can_access_course(&service, user, &paid).await);
}

#[tokio::test]
async fn access_gate_fails_closed_on_store_errors() {
    let (store, service) = setup();
    let user = UserId::new();
    let paid = course(CourseId::new(), "Advanced Staff", false);
    store.insert_course(paid.clone());

    store.set_failing(true);
    assert!(!can_access_course(&service, user, &paid).await);
}
