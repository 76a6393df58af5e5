//! HTTP handlers, grouped by surface.

pub mod enrollments;
pub mod health;
pub mod lessons;
pub mod payments;
