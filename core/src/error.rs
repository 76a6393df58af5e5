//! Error types for enrollment, progress and payment operations.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error taxonomy for the enrollment/progress/payment core.
///
/// Services always surface failures through this type; the caller decides
/// whether a read fails open (redirect policy defaults to the home page) or
/// closed (the access gate denies content), instead of the service baking a
/// `false`/`null` default in.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    // ═══════════════════════════════════════════════════════════
    // Validation / domain errors
    // ═══════════════════════════════════════════════════════════

    /// The referenced course does not exist.
    #[error("Course not found")]
    CourseNotFound,

    /// Direct enrollment was attempted on a course that requires payment.
    #[error("Only free courses can be enrolled in directly")]
    PaidCourse,

    /// No enrollment row exists for the `(user, course)` pair.
    #[error("Enrollment not found")]
    EnrollmentNotFound,

    // ═══════════════════════════════════════════════════════════
    // Payment verification errors
    // ═══════════════════════════════════════════════════════════

    /// The supplied payment signature did not match the recomputed HMAC.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The payment gateway rejected or failed an order-creation call.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    // ═══════════════════════════════════════════════════════════
    // System errors
    // ═══════════════════════════════════════════════════════════

    /// A store query or write failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error")]
    Internal,
}

impl CoreError {
    /// Returns `true` if this error is due to invalid caller input rather
    /// than a system fault.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::CourseNotFound
                | Self::PaidCourse
                | Self::EnrollmentNotFound
                | Self::InvalidSignature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_mismatch_is_a_user_error() {
        assert!(CoreError::InvalidSignature.is_user_error());
        assert!(CoreError::PaidCourse.is_user_error());
        assert!(!CoreError::Store("down".to_string()).is_user_error());
        assert!(!CoreError::Gateway("timeout".to_string()).is_user_error());
    }
}
