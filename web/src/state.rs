//! Shared application state.

use flowschool_core::config::PaymentConfig;
use flowschool_core::gateway::PaymentGateway;
use flowschool_core::services::{EnrollmentService, LessonProgressService, PaymentService};
use flowschool_core::stores::Store;
use std::sync::Arc;

/// State shared across all HTTP handlers, cloned cheaply per request.
///
/// Generic over the store so the router serves PostgreSQL in production and
/// the in-memory mocks in tests without changing the handlers.
pub struct AppState<S> {
    /// The underlying store, for reads the services do not wrap (catalog
    /// lookups in the access gate).
    pub store: Arc<S>,
    /// Enrollment eligibility, creation and listings.
    pub enrollments: EnrollmentService<S>,
    /// Per-lesson completion and the course roll-up.
    pub progress: LessonProgressService<S>,
    /// Order creation and payment verification.
    pub payments: PaymentService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            enrollments: self.enrollments.clone(),
            progress: self.progress.clone(),
            payments: self.payments.clone(),
        }
    }
}

impl<S> AppState<S>
where
    S: Store,
{
    /// Build the state, wiring every service to the same store.
    pub fn new(store: Arc<S>, gateway: Arc<dyn PaymentGateway>, payment: PaymentConfig) -> Self {
        Self {
            enrollments: EnrollmentService::new(Arc::clone(&store)),
            progress: LessonProgressService::new(Arc::clone(&store)),
            payments: PaymentService::new(Arc::clone(&store), gateway, payment),
            store,
        }
    }
}
