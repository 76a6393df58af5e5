//! Payment verification and order creation tests.
//!
//! Covers the REJECTED/VERIFIED paths of the confirmation state machine,
//! the failed-then-retried sequence, replay behavior, and order creation
//! against the mock gateway.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use flowschool_core::config::PaymentConfig;
use flowschool_core::gateway::MockPaymentGateway;
use flowschool_core::mocks::MemoryStore;
use flowschool_core::services::{PaymentService, VerifyPaymentRequest};
use flowschool_core::signature::payment_signature;
use flowschool_core::{CoreError, CourseId, PurchaseStatus, UserId};
use std::sync::Arc;

const SECRET: &str = "s3cr3t";

fn service(store: &Arc<MemoryStore>) -> PaymentService<MemoryStore> {
    PaymentService::new(
        Arc::clone(store),
        MockPaymentGateway::shared(),
        PaymentConfig::new("rzp_test_key".to_string(), SECRET.to_string()),
    )
}

fn request(user: UserId, course: CourseId, signature: &str) -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        payment_id: "pay_xyz".to_string(),
        order_id: "order_abc".to_string(),
        signature: signature.to_string(),
        user_id: user,
        course_id: course,
        amount_minor: 100,
    }
}

#[tokio::test]
async fn bad_signature_records_failure_and_does_not_enroll() {
    let store = Arc::new(MemoryStore::new());
    let payments = service(&store);
    let user = UserId::new();
    let course = CourseId::new();

    let err = payments
        .verify_payment(request(user, course, "definitely-not-the-hmac"))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::InvalidSignature);

    let purchases = store.purchases();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].status, PurchaseStatus::Failed);
    assert_eq!(purchases[0].order_id, "order_abc");
    assert!(store.enrollment(user, course).is_none());
}

#[tokio::test]
async fn failed_then_retried_payment_enrolls_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let payments = service(&store);
    let user = UserId::new();
    let course = CourseId::new();

    // First attempt: bad signature, audit row only.
    payments
        .verify_payment(request(user, course, "tampered"))
        .await
        .unwrap_err();

    // Retry with the correct signature for the same order/payment pair.
    let valid = payment_signature(SECRET, "order_abc", "pay_xyz").unwrap();
    payments
        .verify_payment(request(user, course, &valid))
        .await
        .unwrap();

    let purchases = store.purchases();
    assert_eq!(purchases.len(), 2);
    assert_eq!(purchases[0].status, PurchaseStatus::Failed);
    assert_eq!(purchases[1].status, PurchaseStatus::Paid);

    let enrollment = store.enrollment(user, course).unwrap();
    assert_eq!(enrollment.progress_percentage, 0);
}

#[tokio::test]
async fn replayed_verification_cannot_double_enroll() {
    let store = Arc::new(MemoryStore::new());
    let payments = service(&store);
    let user = UserId::new();
    let course = CourseId::new();

    let valid = payment_signature(SECRET, "order_abc", "pay_xyz").unwrap();
    payments
        .verify_payment(request(user, course, &valid))
        .await
        .unwrap();
    let first = store.enrollment(user, course).unwrap();

    // Replay: another paid log row is appended (it is an append-only audit
    // log) but the original enrollment is untouched.
    payments
        .verify_payment(request(user, course, &valid))
        .await
        .unwrap();

    let paid: Vec<_> = store
        .purchases()
        .into_iter()
        .filter(|p| p.status == PurchaseStatus::Paid)
        .collect();
    assert_eq!(paid.len(), 2);
    assert_eq!(store.enrollment(user, course).unwrap(), first);
}

#[tokio::test]
async fn store_failure_surfaces_as_an_error_not_an_enrollment() {
    let store = Arc::new(MemoryStore::new());
    let payments = service(&store);
    let user = UserId::new();
    let course = CourseId::new();

    let valid = payment_signature(SECRET, "order_abc", "pay_xyz").unwrap();
    store.set_failing(true);
    let err = payments
        .verify_payment(request(user, course, &valid))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));

    store.set_failing(false);
    assert!(store.enrollment(user, course).is_none());
    assert!(store.purchases().is_empty());
}

#[tokio::test]
async fn order_creation_uses_the_configured_price() {
    let store = Arc::new(MemoryStore::new());
    let payments = service(&store);

    let order = payments
        .create_order(UserId::new(), CourseId::new())
        .await
        .unwrap();
    assert_eq!(order.amount_minor, 100);
    assert_eq!(order.currency, "INR");
    assert!(order.id.starts_with("order_"));

    // Nothing persists at order-creation time.
    assert!(store.purchases().is_empty());
}

#[tokio::test]
async fn gateway_outage_is_a_gateway_error() {
    let store = Arc::new(MemoryStore::new());
    let payments = PaymentService::new(
        Arc::clone(&store),
        Arc::new(MockPaymentGateway::failing()),
        PaymentConfig::new("rzp_test_key".to_string(), SECRET.to_string()),
    );

    let err = payments
        .create_order(UserId::new(), CourseId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Gateway(_)));
}
