//! Stripe webhook handler.
//!
//! Deliveries are verified when a signing secret is configured. Unknown
//! events and events for registrations that no longer exist are
//! acknowledged with 200 so Stripe stops retrying them; database failures
//! return 500 so they are retried.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::instrument;

use summer_camp_core::Registration;
use summer_camp_data::RepositoryError;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::payments::webhook::{CheckoutSessionObject, WebhookEvent, verify_signature};
use crate::payments::PaymentGateway;
use crate::state::AppState;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Receive a Stripe event.
///
/// # Errors
///
/// Returns 400 for unverifiable or malformed deliveries and 500 when the
/// database update fails.
#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let secret = match state.payments() {
        PaymentGateway::Stripe(client) => client.webhook_secret(),
        PaymentGateway::Demo => None,
    };

    if let Some(secret) = secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if let Err(e) =
            verify_signature(&body, signature, secret, chrono::Utc::now().timestamp())
        {
            tracing::warn!(error = %e, "Rejected Stripe webhook");
            return Err(AppError::BadRequest("invalid signature".to_string()));
        }
    } else {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, accepting unverified webhook");
    }

    let event = WebhookEvent::parse(&body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed Stripe webhook");
        AppError::BadRequest("malformed event".to_string())
    })?;

    match event {
        WebhookEvent::CheckoutCompleted(session) => checkout_completed(&state, &session).await?,
        WebhookEvent::CheckoutExpired(session) => checkout_expired(&state, &session).await?,
        WebhookEvent::Ignored(event_type) => {
            tracing::debug!(%event_type, "Ignoring Stripe event");
        }
    }

    Ok(StatusCode::OK)
}

/// The registration a checkout session belongs to.
async fn find_registration(
    state: &AppState,
    session: &CheckoutSessionObject,
) -> std::result::Result<Option<Registration>, RepositoryError> {
    let registrations = &state.data().registrations;
    if let Some(id) = session.registration_id()
        && let Some(registration) = registrations.get(id).await?
    {
        return Ok(Some(registration));
    }
    registrations.find_by_checkout_session(&session.id).await
}

async fn checkout_completed(state: &AppState, session: &CheckoutSessionObject) -> Result<()> {
    if !session.is_paid() {
        tracing::info!(
            session_id = %session.id,
            payment_status = ?session.payment_status,
            "Checkout completed without payment, waiting for async confirmation"
        );
        return Ok(());
    }

    let Some(registration) = find_registration(state, session).await? else {
        tracing::warn!(session_id = %session.id, "Completed checkout for unknown registration");
        return Ok(());
    };

    add_breadcrumb(
        "payment",
        "Checkout completed",
        Some(&[("session_id", session.id.as_str())]),
    );

    let recorded = state
        .data()
        .registrations
        .record_payment(registration.id, session.amount(), Some(&session.id))
        .await?;

    if recorded.applied {
        tracing::info!(
            registration_id = %registration.id,
            session_id = %session.id,
            amount = %session.amount(),
            payment_status = %recorded.registration.payment_status,
            "Payment recorded"
        );
    } else {
        tracing::info!(session_id = %session.id, "Checkout session already recorded");
    }
    Ok(())
}

async fn checkout_expired(state: &AppState, session: &CheckoutSessionObject) -> Result<()> {
    let Some(registration) = find_registration(state, session).await? else {
        return Ok(());
    };

    // A newer session may have replaced the expired one
    if registration.stripe_session_id.as_deref() == Some(session.id.as_str()) {
        state
            .data()
            .registrations
            .set_checkout_session(registration.id, None)
            .await?;
        tracing::info!(registration_id = %registration.id, "Cleared expired checkout session");
    }
    Ok(())
}
