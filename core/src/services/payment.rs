//! Payment confirmation and order creation.
//!
//! Per purchase attempt the state machine is
//! `PENDING (order created) -> { VERIFIED, REJECTED }`. Order creation opens
//! a gateway order and persists nothing; verification checks the gateway
//! signature, appends to the purchase log and grants the enrollment.

use crate::config::PaymentConfig;
use crate::error::{CoreError, Result};
use crate::gateway::{order_receipt, GatewayOrder, PaymentGateway};
use crate::signature::verify_payment_signature;
use crate::stores::PurchaseStore;
use crate::types::{CourseId, CoursePurchase, Enrollment, PurchaseStatus, UserId};
use chrono::Utc;
use std::sync::Arc;

/// Fields the gateway checkout hands back to the client after payment.
#[derive(Debug, Clone)]
pub struct VerifyPaymentRequest {
    /// Gateway payment id.
    pub payment_id: String,
    /// Gateway order id.
    pub order_id: String,
    /// Client-supplied hex HMAC signature.
    pub signature: String,
    /// Paying user.
    pub user_id: UserId,
    /// Purchased course.
    pub course_id: CourseId,
    /// Amount in the smallest currency unit.
    pub amount_minor: i64,
}

/// Validates gateway signatures, records purchases and grants paid
/// enrollments.
pub struct PaymentService<S> {
    store: Arc<S>,
    gateway: Arc<dyn PaymentGateway>,
    config: PaymentConfig,
}

impl<S> Clone for PaymentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            config: self.config.clone(),
        }
    }
}

impl<S> PaymentService<S>
where
    S: PurchaseStore,
{
    /// Create a new payment service.
    pub fn new(store: Arc<S>, gateway: Arc<dyn PaymentGateway>, config: PaymentConfig) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// The configured checkout price and currency.
    #[must_use]
    pub const fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Open a gateway order for the fixed checkout price.
    ///
    /// The receipt is derived from the truncated user/course ids plus a
    /// timestamp, staying under the gateway's 40-character limit. Nothing is
    /// persisted; the order only becomes consequential once verification
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Gateway`] if the gateway call fails.
    pub async fn create_order(&self, user_id: UserId, course_id: CourseId) -> Result<GatewayOrder> {
        let receipt = order_receipt(user_id, course_id, Utc::now());
        self.gateway
            .create_order(self.config.amount_minor, &self.config.currency, &receipt)
            .await
    }

    /// Verify a completed checkout and grant the enrollment.
    ///
    /// 1. Recompute the HMAC over `"{order_id}|{payment_id}"` and compare it
    ///    to the supplied signature in constant time.
    /// 2. On mismatch, append a `failed` purchase row for the audit trail
    ///    and reject; no enrollment.
    /// 3. On match, record the `paid` purchase and the idempotent enrollment
    ///    in a single transaction: the financial record and the access
    ///    grant commit or roll back together.
    ///
    /// A replayed valid request appends another `paid` log row but cannot
    /// double-enroll: the enrollment insert is conflict-idempotent.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSignature`] on mismatch (client error)
    /// - [`CoreError::Store`] if the paid-purchase transaction fails
    pub async fn verify_payment(&self, request: VerifyPaymentRequest) -> Result<()> {
        let verified = verify_payment_signature(
            &self.config.key_secret,
            &request.order_id,
            &request.payment_id,
            &request.signature,
        );

        if !verified {
            let failed = purchase_row(&request, PurchaseStatus::Failed);
            // The rejection stands regardless of whether the audit insert
            // lands; a log write failure must not mask the signature error.
            if let Err(error) = self.store.record_purchase(&failed).await {
                tracing::error!(
                    user_id = %request.user_id,
                    course_id = %request.course_id,
                    order_id = %request.order_id,
                    %error,
                    "failed to record rejected purchase"
                );
            }
            tracing::warn!(
                user_id = %request.user_id,
                course_id = %request.course_id,
                order_id = %request.order_id,
                "payment signature mismatch"
            );
            return Err(CoreError::InvalidSignature);
        }

        let paid = purchase_row(&request, PurchaseStatus::Paid);
        let enrollment = Enrollment::new(request.user_id, request.course_id, Utc::now());
        let newly_enrolled = self
            .store
            .record_paid_purchase_and_enroll(&paid, &enrollment)
            .await?;

        tracing::info!(
            user_id = %request.user_id,
            course_id = %request.course_id,
            order_id = %request.order_id,
            newly_enrolled,
            "payment verified"
        );
        Ok(())
    }
}

fn purchase_row(request: &VerifyPaymentRequest, status: PurchaseStatus) -> CoursePurchase {
    CoursePurchase {
        user_id: request.user_id,
        course_id: request.course_id,
        payment_id: request.payment_id.clone(),
        order_id: request.order_id.clone(),
        signature: request.signature.clone(),
        amount_minor: request.amount_minor,
        status,
        created_at: Utc::now(),
    }
}
