//! Business services for enrollment, lesson progress and payments.
//!
//! Services are generic over the store traits in [`crate::stores`] and hold
//! no state beyond an `Arc` to the store, so they clone cheaply into HTTP
//! handlers and test harnesses alike.

pub mod enrollment;
pub mod payment;
pub mod progress;

pub use enrollment::{EnrollmentOutcome, EnrollmentService};
pub use payment::{PaymentService, VerifyPaymentRequest};
pub use progress::LessonProgressService;
