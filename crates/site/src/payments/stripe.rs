//! Stripe Checkout client.

use secrecy::ExposeSecret;
use serde::Deserialize;

use summer_camp_core::to_cents;

use super::{CheckoutRequest, CheckoutSession, PaymentError};
use crate::config::StripeConfig;

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
}

/// Creates hosted checkout sessions through the Stripe REST API.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self { http, config })
    }

    /// Webhook signing secret, if configured.
    #[must_use]
    pub const fn webhook_secret(&self) -> Option<&secrecy::SecretString> {
        self.config.webhook_secret.as_ref()
    }

    /// Create a one-off EUR payment session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Stripe rejects it.
    #[tracing::instrument(skip(self, request), fields(registration_id = %request.registration_id))]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base);
        let params = checkout_params(request)?;

        let response = self
            .http
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Stripe rejected checkout session");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: StripeCheckoutSession = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Parse("checkout session has no url".to_string()))?;

        tracing::info!(session_id = %session.id, "Stripe checkout session created");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}

/// Form body for `POST /v1/checkout/sessions`.
fn checkout_params(request: &CheckoutRequest) -> Result<Vec<(&'static str, String)>, PaymentError> {
    let cents = to_cents(request.amount)
        .filter(|c| *c > 0)
        .ok_or(PaymentError::InvalidAmount(request.amount))?;
    let registration_id = request.registration_id.to_string();

    Ok(vec![
        ("mode", "payment".to_string()),
        ("customer_email", request.customer_email.clone()),
        ("client_reference_id", registration_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", "eur".to_string()),
        ("line_items[0][price_data][unit_amount]", cents.to_string()),
        (
            "line_items[0][price_data][product_data][name]",
            request.description.clone(),
        ),
        ("metadata[registration_id]", registration_id),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use summer_camp_core::RegistrationId;

    use super::*;

    #[test]
    fn test_checkout_params_use_cents_and_reference() {
        let id = RegistrationId::generate();
        let request = CheckoutRequest {
            registration_id: id,
            amount: Decimal::new(15050, 2),
            description: "Summer Camp 2026 - Standard (deposit)".to_string(),
            customer_email: "parent@example.com".to_string(),
            success_url: "http://localhost/ok".to_string(),
            cancel_url: "http://localhost/ko".to_string(),
        };

        let params = checkout_params(&request).unwrap();
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("15050"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("eur"));
        assert_eq!(get("client_reference_id"), Some(id.to_string().as_str()));
        assert_eq!(get("metadata[registration_id]"), Some(id.to_string().as_str()));
    }
}
