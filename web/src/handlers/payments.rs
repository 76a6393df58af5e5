//! Payment API endpoints.
//!
//! - `POST /api/payments/order`: open a gateway order for the checkout
//! - `POST /api/payments/verify`: verify the checkout signature and grant
//!   the enrollment
//!
//! The HMAC secret stays server-side: clients send the signature the gateway
//! gave them and only ever learn whether it matched.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use flowschool_core::gateway::GatewayOrder;
use flowschool_core::services::VerifyPaymentRequest;
use flowschool_core::stores::Store;
use flowschool_core::{CourseId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to open a gateway order.
///
/// Fields are optional so their absence maps to a 400 instead of a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Paying user.
    pub user_id: Option<Uuid>,
    /// Course being purchased.
    pub course_id: Option<Uuid>,
}

/// Response carrying the opened order, fed to the checkout widget.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    /// The gateway order.
    pub order: GatewayOrder,
}

/// Open a gateway order for the fixed checkout price.
///
/// Nothing is persisted; the order only matters once verification succeeds.
pub async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let (Some(user_id), Some(course_id)) = (body.user_id, body.course_id) else {
        return Err(AppError::bad_request("Missing user_id or course_id"));
    };

    let order = state
        .payments
        .create_order(UserId(user_id), CourseId(course_id))
        .await?;

    Ok(Json(CreateOrderResponse { order }))
}

/// Request to verify a completed checkout.
///
/// Field names follow what the checkout widget posts back. All fields are
/// required; `access_token` scopes the caller's session and is validated
/// upstream of this service.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Gateway payment id.
    pub razorpay_payment_id: Option<String>,
    /// Gateway order id.
    pub razorpay_order_id: Option<String>,
    /// Gateway-produced HMAC signature.
    pub razorpay_signature: Option<String>,
    /// Paying user.
    pub user_id: Option<Uuid>,
    /// Purchased course.
    pub course_id: Option<Uuid>,
    /// Amount in the smallest currency unit.
    pub amount: Option<i64>,
    /// Caller session token.
    pub access_token: Option<String>,
}

/// Response for a verified payment.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Always `true`; failures return an error body instead.
    pub success: bool,
}

/// Verify a checkout signature and grant the enrollment.
///
/// 400 with `"Invalid signature"` on mismatch, 500 if the paid-purchase
/// transaction fails, 200 `{success: true}` otherwise.
pub async fn verify_payment<S: Store>(
    State(state): State<AppState<S>>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let (
        Some(payment_id),
        Some(order_id),
        Some(signature),
        Some(user_id),
        Some(course_id),
        Some(amount_minor),
        Some(_access_token),
    ) = (
        body.razorpay_payment_id,
        body.razorpay_order_id,
        body.razorpay_signature,
        body.user_id,
        body.course_id,
        body.amount,
        body.access_token,
    )
    else {
        return Err(AppError::bad_request("Missing required fields"));
    };

    state
        .payments
        .verify_payment(VerifyPaymentRequest {
            payment_id,
            order_id,
            signature,
            user_id: UserId(user_id),
            course_id: CourseId(course_id),
            amount_minor,
        })
        .await?;

    Ok(Json(VerifyResponse { success: true }))
}
