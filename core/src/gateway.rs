//! Payment gateway abstraction.
//!
//! Order creation goes through the [`PaymentGateway`] trait so the checkout
//! flow can run against the real Razorpay REST API in production and
//! [`MockPaymentGateway`] in development and tests. The gateway is an
//! external client capability injected at startup, not a lazily-mutated
//! global.

use crate::error::{CoreError, Result};
use crate::types::{CourseId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Maximum receipt length accepted by the gateway.
pub const MAX_RECEIPT_LEN: usize = 40;

/// An order opened with the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway order id, fed to the checkout widget.
    pub id: String,
    /// Amount in the smallest currency unit.
    #[serde(rename = "amount")]
    pub amount_minor: i64,
    /// ISO currency code.
    pub currency: String,
}

/// Payment gateway client.
///
/// Abstraction over the external order-creation API. Dyn-compatible (boxed
/// futures) so the application state can hold it as `Arc<dyn PaymentGateway>`.
pub trait PaymentGateway: Send + Sync {
    /// Open an order for `amount_minor` in `currency` with the given
    /// receipt identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Gateway`] if the gateway call fails.
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayOrder>> + Send>>;
}

/// Build a gateway receipt identifier for a checkout attempt.
///
/// First 8 characters of the user and course ids plus epoch milliseconds,
/// which keeps the identifier comfortably under [`MAX_RECEIPT_LEN`].
#[must_use]
pub fn order_receipt(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> String {
    let user = user_id.0.simple().to_string();
    let course = course_id.0.simple().to_string();
    let mut receipt = format!(
        "{}_{}_{}",
        &user[..8],
        &course[..8],
        now.timestamp_millis()
    );
    receipt.truncate(MAX_RECEIPT_LEN);
    receipt
}

// ═══════════════════════════════════════════════════════════════════════
// Razorpay client
// ═══════════════════════════════════════════════════════════════════════

/// Razorpay orders API client.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
}

impl RazorpayGateway {
    /// Production API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.razorpay.com/v1";

    /// Create a client against the production API.
    #[must_use]
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self::with_base_url(key_id, key_secret, Self::DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a custom endpoint (staging, test doubles).
    #[must_use]
    pub fn with_base_url(key_id: String, key_secret: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            key_id,
            key_secret,
            base_url,
        }
    }
}

impl PaymentGateway for RazorpayGateway {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayOrder>> + Send>> {
        let client = self.client.clone();
        let key_id = self.key_id.clone();
        let key_secret = self.key_secret.clone();
        let url = format!("{}/orders", self.base_url);
        let currency = currency.to_string();
        let receipt = receipt.to_string();

        Box::pin(async move {
            let body = CreateOrderBody {
                amount: amount_minor,
                currency: &currency,
                receipt: &receipt,
                payment_capture: 1,
            };

            let response = client
                .post(&url)
                .basic_auth(&key_id, Some(&key_secret))
                .json(&body)
                .send()
                .await
                .map_err(|e| CoreError::Gateway(format!("order request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(CoreError::Gateway(format!(
                    "order creation returned {status}: {detail}"
                )));
            }

            let order: GatewayOrder = response
                .json()
                .await
                .map_err(|e| CoreError::Gateway(format!("malformed order response: {e}")))?;

            tracing::info!(order_id = %order.id, amount = order.amount_minor, "gateway order created");
            Ok(order)
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Mock gateway
// ═══════════════════════════════════════════════════════════════════════

/// Mock payment gateway for development and testing.
///
/// Succeeds by default; [`MockPaymentGateway::failing`] simulates a gateway
/// outage for error-path tests.
#[derive(Clone, Debug)]
pub struct MockPaymentGateway {
    fail: bool,
}

impl MockPaymentGateway {
    /// Gateway that always succeeds.
    #[must_use]
    pub const fn new() -> Self {
        Self { fail: false }
    }

    /// Gateway that always fails with a gateway error.
    #[must_use]
    pub const fn failing() -> Self {
        Self { fail: true }
    }

    /// Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _receipt: &str,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayOrder>> + Send>> {
        let fail = self.fail;
        let currency = currency.to_string();

        Box::pin(async move {
            if fail {
                return Err(CoreError::Gateway("mock gateway unavailable".to_string()));
            }
            Ok(GatewayOrder {
                id: format!("order_{}", uuid::Uuid::new_v4().simple()),
                amount_minor,
                currency,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn receipt_fits_gateway_limit() {
        let receipt = order_receipt(UserId::new(), CourseId::new(), Utc::now());
        assert!(receipt.len() <= MAX_RECEIPT_LEN, "receipt too long: {receipt}");
        assert_eq!(receipt.matches('_').count(), 2);
    }

    #[test]
    fn receipt_truncates_ids_to_eight_chars() {
        let user = UserId::new();
        let course = CourseId::new();
        let receipt = order_receipt(user, course, Utc::now());
        let mut parts = receipt.splitn(3, '_');
        assert_eq!(parts.next().unwrap(), &user.0.simple().to_string()[..8]);
        assert_eq!(parts.next().unwrap(), &course.0.simple().to_string()[..8]);
    }

    #[tokio::test]
    async fn mock_gateway_echoes_amount_and_currency() {
        let gateway = MockPaymentGateway::new();
        let order = gateway.create_order(100, "INR", "r").await.unwrap();
        assert_eq!(order.amount_minor, 100);
        assert_eq!(order.currency, "INR");
        assert!(order.id.starts_with("order_"));
    }

    #[tokio::test]
    async fn failing_mock_gateway_errors() {
        let gateway = MockPaymentGateway::failing();
        let err = gateway.create_order(100, "INR", "r").await.unwrap_err();
        assert!(matches!(err, CoreError::Gateway(_)));
    }
}
