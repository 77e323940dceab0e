//! Payment gateway integration.
//!
//! [`PaymentGateway`] is either a real Stripe client or the demo gateway.
//! The demo gateway never leaves the process: it hands back a simulated
//! session whose redirect goes straight to the success page, and the
//! checkout handler records the payment immediately.

mod stripe;
pub mod webhook;

use rust_decimal::Decimal;
use thiserror::Error;

use summer_camp_core::RegistrationId;

pub use self::stripe::StripeClient;

/// Placeholder Stripe substitutes with the real session id in redirect URLs.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Errors that can occur when creating a checkout session.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The amount cannot be charged.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// What to charge and where to send the visitor afterwards.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub registration_id: RegistrationId,
    /// Amount in euros.
    pub amount: Decimal,
    /// Line item name shown on the hosted checkout page.
    pub description: String,
    pub customer_email: String,
    /// May contain [`SESSION_ID_PLACEHOLDER`].
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session the visitor is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Stripe in live mode, simulated payments in demo mode.
#[derive(Debug, Clone)]
pub enum PaymentGateway {
    Stripe(StripeClient),
    Demo,
}

impl PaymentGateway {
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self, Self::Demo)
    }

    /// Open a checkout session.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the amount is not positive or the gateway
    /// rejects the request.
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if request.amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount(request.amount));
        }

        match self {
            Self::Stripe(client) => client.create_checkout_session(request).await,
            Self::Demo => {
                let id = format!("cs_demo_{}", uuid::Uuid::new_v4().simple());
                let url = request.success_url.replace(SESSION_ID_PLACEHOLDER, &id);
                tracing::info!(
                    registration_id = %request.registration_id,
                    amount = %request.amount,
                    session_id = %id,
                    "Simulated checkout session"
                );
                Ok(CheckoutSession { id, url })
            }
        }
    }
}
