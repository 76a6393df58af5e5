//! # FlowSchool Web
//!
//! HTTP surface for the FlowSchool enrollment core: JSON handlers for order
//! creation, payment verification, free enrollment, lesson progress, the
//! access gate and the post-auth redirect, plus the router, shared state and
//! request middleware that tie them together.
//!
//! Handlers are generic over the store so the same router serves PostgreSQL
//! in production and the in-memory mocks in tests.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use router::build_router;
pub use state::AppState;
