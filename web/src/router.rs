//! Router composition.

use crate::handlers::{enrollments, health, lessons, payments};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use flowschool_core::stores::Store;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete router: payment, enrollment and lesson-progress
/// endpoints under `/api`, plus the unauthenticated health check.
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    let api_routes = Router::new()
        // Checkout
        .route("/payments/order", post(payments::create_order))
        .route("/payments/verify", post(payments::verify_payment))
        // Enrollment
        .route("/enrollments", post(enrollments::enroll))
        .route(
            "/users/:user_id/enrollments",
            get(enrollments::list_enrollments),
        )
        .route(
            "/users/:user_id/courses/:course_id/progress",
            get(enrollments::course_progress),
        )
        .route(
            "/users/:user_id/courses/:course_id/access",
            get(enrollments::course_access),
        )
        .route(
            "/users/:user_id/post-auth-redirect",
            get(enrollments::post_auth_redirect),
        )
        // Lesson progress
        .route("/lessons/:lesson_id/complete", post(lessons::mark_completed))
        .route(
            "/lessons/:lesson_id/incomplete",
            post(lessons::mark_incomplete),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
