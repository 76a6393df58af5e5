//! Core configuration.
//!
//! Configuration values are provided by the application, not hardcoded.

/// Payment/checkout configuration.
///
/// Carries the gateway credentials and the fixed nominal checkout price.
/// The key secret is server-held and must never reach the client; it is
/// only used to recompute payment signatures and to authenticate
/// order-creation calls.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Gateway key id (public, embedded in the checkout widget).
    pub key_id: String,

    /// Gateway key secret (server-held, HMAC key for signature checks).
    pub key_secret: String,

    /// Fixed checkout amount in the smallest currency unit.
    ///
    /// Default: 100 (1 INR promotional price).
    pub amount_minor: i64,

    /// ISO currency code for checkout orders.
    ///
    /// Default: "INR"
    pub currency: String,
}

impl PaymentConfig {
    /// Create new payment configuration with the default promotional price.
    #[must_use]
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            amount_minor: 100,
            currency: "INR".to_string(),
        }
    }

    /// Set the checkout amount in the smallest currency unit.
    #[must_use]
    pub const fn with_amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = amount_minor;
        self
    }

    /// Set the checkout currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}
