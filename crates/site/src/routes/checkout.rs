//! Checkout API.
//!
//! `start_checkout` is shared by the wizard submit and the JSON endpoint:
//! it opens a session for whatever the registration still owes and
//! remembers the session id on the registration. In demo mode the payment is
//! recorded on the spot.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use summer_camp_core::{PaymentStatus, Registration, RegistrationId, RegistrationStatus};

use crate::error::{AppError, Result};
use crate::payments::{CheckoutRequest, CheckoutSession, SESSION_ID_PLACEHOLDER};
use crate::state::AppState;

/// Open a checkout session for the amount a registration should pay next.
///
/// # Errors
///
/// Returns `BadRequest` when nothing is owed or the registration is
/// cancelled, and propagates gateway and database errors.
pub async fn start_checkout(
    state: &AppState,
    registration: &Registration,
) -> Result<CheckoutSession> {
    if registration.status == RegistrationStatus::Cancelled {
        return Err(AppError::BadRequest(
            "registration has been cancelled".to_string(),
        ));
    }

    let amount = registration.next_checkout_amount();
    if amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("nothing left to pay".to_string()));
    }

    let base_url = &state.config().base_url;
    let request = CheckoutRequest {
        registration_id: registration.id,
        amount,
        description: format!(
            "Summer Camp - {} ({})",
            registration.package.label(),
            registration.camper_name()
        ),
        customer_email: registration.parent_email.to_string(),
        success_url: format!(
            "{base_url}/register/success?session_id={SESSION_ID_PLACEHOLDER}&registration={}",
            registration.id
        ),
        cancel_url: format!(
            "{base_url}/register/cancelled?registration={}",
            registration.id
        ),
    };

    let session = state.payments().create_checkout(&request).await?;
    state
        .data()
        .registrations
        .set_checkout_session(registration.id, Some(&session.id))
        .await?;

    if state.payments().is_demo() {
        let recorded = state
            .data()
            .registrations
            .record_payment(registration.id, amount, Some(&session.id))
            .await?;
        tracing::info!(
            registration_id = %registration.id,
            payment_status = %recorded.registration.payment_status,
            "Recorded simulated payment"
        );
    }

    Ok(session)
}

/// JSON body of `POST /api/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub registration_id: RegistrationId,
}

/// JSON response of `POST /api/checkout`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub demo: bool,
}

/// Start a checkout for an existing registration.
///
/// # Errors
///
/// Returns 404 for unknown registrations and 400 when nothing is owed.
#[instrument(skip(state, body), fields(registration_id = %body.registration_id))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CheckoutBody>,
) -> Result<impl IntoResponse> {
    let registration = state
        .data()
        .registrations
        .get(body.registration_id)
        .await?
        .ok_or_else(|| AppError::NotFound("registration".to_string()))?;

    let session = start_checkout(&state, &registration).await?;

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
        demo: state.payments().is_demo(),
    }))
}

/// JSON payment status for polling.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub id: RegistrationId,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
    pub amount_due: Decimal,
}

impl From<&Registration> for PaymentStatusResponse {
    fn from(registration: &Registration) -> Self {
        Self {
            id: registration.id,
            status: registration.status,
            payment_status: registration.payment_status,
            amount_paid: registration.amount_paid,
            amount_due: registration.amount_due(),
        }
    }
}

/// Report the payment state of a registration.
///
/// # Errors
///
/// Returns 404 for unknown registrations.
#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<RegistrationId>,
) -> Result<impl IntoResponse> {
    let registration = state
        .data()
        .registrations
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("registration".to_string()))?;

    Ok(Json(PaymentStatusResponse::from(&registration)))
}
