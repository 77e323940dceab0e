//! Registration wizard route handlers.
//!
//! The draft lives in the visitor's session under [`DRAFT_KEY`]. Each step
//! post merges the step's fields into the draft and validates them; a step
//! can only be opened once every earlier step is valid. The final submit
//! creates the registration and redirects to the payment gateway.

use std::time::Duration;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use summer_camp_core::wizard::{furthest_reachable_step, validate_step};
use summer_camp_core::{
    ExperienceLevel, FieldErrors, Gender, PaymentOption, Registration, RegistrationDraft,
    RegistrationId, ShirtSize, WizardStep, format_eur,
};
use summer_camp_data::RepositoryError;

use super::checkout::start_checkout;
use super::home::PackageCard;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;

/// Session key of the wizard draft.
pub const DRAFT_KEY: &str = "registration_draft";

/// Session key of the registration created by the last submit.
pub const LAST_REGISTRATION_KEY: &str = "last_registration_id";

/// How long the success page waits for the payment lookup.
const STATUS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// View Types
// =============================================================================

/// One entry of the step progress bar.
#[derive(Debug, Clone)]
pub struct StepLink {
    pub number: u8,
    pub title: &'static str,
    pub current: bool,
    pub reachable: bool,
}

/// A `<select>` or radio option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn select_options(
    choices: impl Iterator<Item = (&'static str, &'static str)>,
    current: Option<&str>,
) -> Vec<SelectOption> {
    choices
        .map(|(value, label)| SelectOption {
            value,
            label,
            selected: current == Some(value),
        })
        .collect()
}

/// One form control of a step.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    /// `text`, `email`, `tel`, `date`, `textarea`, `select` or `checkbox`.
    pub kind: &'static str,
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub options: Vec<SelectOption>,
    pub error: Option<String>,
}

impl FormField {
    fn new(
        name: &'static str,
        label: &'static str,
        kind: &'static str,
        value: Option<&str>,
    ) -> Self {
        Self {
            name,
            label,
            kind,
            value: value.unwrap_or_default().to_string(),
            checked: false,
            required: true,
            options: Vec::new(),
            error: None,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn select(
        name: &'static str,
        label: &'static str,
        choices: impl Iterator<Item = (&'static str, &'static str)>,
        value: Option<&str>,
    ) -> Self {
        let mut field = Self::new(name, label, "select", value);
        field.options = select_options(choices, value);
        field
    }

    fn checkbox(name: &'static str, label: &'static str, checked: bool) -> Self {
        let mut field = Self::new(name, label, "checkbox", None);
        field.checked = checked;
        field
    }
}

/// The form controls of a step, with current values and errors attached.
fn step_fields(
    step: WizardStep,
    draft: &RegistrationDraft,
    errors: &FieldErrors,
) -> Vec<FormField> {
    let d = draft;
    let mut fields = match step {
        WizardStep::Camper => vec![
            FormField::new(
                "camper_first_name",
                "First name",
                "text",
                d.camper_first_name.as_deref(),
            ),
            FormField::new("camper_last_name", "Last name", "text", d.camper_last_name.as_deref()),
            FormField::new(
                "camper_birth_date",
                "Date of birth",
                "date",
                d.camper_birth_date.as_deref(),
            ),
            FormField::new(
                "camper_birth_place",
                "Place of birth",
                "text",
                d.camper_birth_place.as_deref(),
            ),
            FormField::new(
                "camper_fiscal_code",
                "Fiscal code",
                "text",
                d.camper_fiscal_code.as_deref(),
            ),
            FormField::select(
                "camper_gender",
                "Gender",
                Gender::ALL.iter().map(|g| (g.as_str(), g.label())),
                d.camper_gender.as_deref(),
            ),
            FormField::select(
                "shirt_size",
                "T-shirt size",
                ShirtSize::ALL.iter().map(|s| (s.as_str(), s.label())),
                d.shirt_size.as_deref(),
            ),
            FormField::select(
                "experience",
                "Experience",
                ExperienceLevel::ALL.iter().map(|e| (e.as_str(), e.label())),
                d.experience.as_deref(),
            ),
            FormField::new("club", "Current club", "text", d.club.as_deref()).optional(),
            FormField::new("allergies", "Allergies", "textarea", d.allergies.as_deref()).optional(),
            FormField::new("medical_notes", "Medical notes", "textarea", d.medical_notes.as_deref())
                .optional(),
        ],
        WizardStep::Parent => vec![
            FormField::new(
                "parent_first_name",
                "First name",
                "text",
                d.parent_first_name.as_deref(),
            ),
            FormField::new("parent_last_name", "Last name", "text", d.parent_last_name.as_deref()),
            FormField::new("parent_email", "Email", "email", d.parent_email.as_deref()),
            FormField::new("parent_phone", "Phone", "tel", d.parent_phone.as_deref()),
            FormField::new(
                "parent_fiscal_code",
                "Fiscal code",
                "text",
                d.parent_fiscal_code.as_deref(),
            ),
            FormField::new("address", "Address", "text", d.address.as_deref()),
            FormField::new("city", "City", "text", d.city.as_deref()),
            FormField::new("postal_code", "Postal code", "text", d.postal_code.as_deref()),
        ],
        WizardStep::Emergency => vec![
            FormField::new("emergency_name", "Contact name", "text", d.emergency_name.as_deref()),
            FormField::new("emergency_phone", "Phone", "tel", d.emergency_phone.as_deref()),
            FormField::new(
                "emergency_relationship",
                "Relationship to the camper",
                "text",
                d.emergency_relationship.as_deref(),
            ),
        ],
        WizardStep::Package => vec![
            FormField::select(
                "payment_option",
                "Payment",
                PaymentOption::ALL.iter().map(|p| (p.as_str(), p.label())),
                d.payment_option.as_deref(),
            ),
            FormField::checkbox(
                "privacy_consent",
                "I have read and accept the privacy policy",
                d.privacy_consent,
            ),
            FormField::checkbox(
                "regulations_consent",
                "I have read and accept the camp regulations",
                d.regulations_consent,
            ),
            FormField::checkbox(
                "photo_consent",
                "I allow photos of my child to be published in the gallery",
                d.photo_consent,
            )
            .optional(),
        ],
        WizardStep::Review => Vec::new(),
    };

    for field in &mut fields {
        field.error = errors.get(field.name).cloned();
    }
    fields
}

/// What the review step shows before payment.
#[derive(Debug, Clone)]
pub struct ReviewSummary {
    pub camper: String,
    pub parent: String,
    pub parent_email: String,
    pub emergency: String,
    pub package: &'static str,
    pub payment_option: &'static str,
    pub total: String,
    pub due_now: String,
}

impl ReviewSummary {
    fn from_draft(draft: &RegistrationDraft) -> Option<Self> {
        let package = draft.selected_package()?;
        let option = draft.selected_payment_option()?;
        let text = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();

        Some(Self {
            camper: format!(
                "{} {}",
                text(&draft.camper_first_name),
                text(&draft.camper_last_name)
            ),
            parent: format!(
                "{} {}",
                text(&draft.parent_first_name),
                text(&draft.parent_last_name)
            ),
            parent_email: text(&draft.parent_email),
            emergency: format!(
                "{} ({})",
                text(&draft.emergency_name),
                text(&draft.emergency_phone)
            ),
            package: package.label(),
            payment_option: option.label(),
            total: format_eur(package.price()),
            due_now: format_eur(package.checkout_amount(option)),
        })
    }
}

/// Wizard step template.
#[derive(Template, WebTemplate)]
#[template(path = "register/step.html")]
pub struct StepTemplate {
    pub step: WizardStep,
    pub progress: Vec<StepLink>,
    pub fields: Vec<FormField>,
    pub packages: Vec<PackageCard>,
    pub package_error: Option<String>,
    pub summary: Option<ReviewSummary>,
    pub has_errors: bool,
}

impl StepTemplate {
    fn new(
        step: WizardStep,
        draft: &RegistrationDraft,
        errors: &FieldErrors,
        today: chrono::NaiveDate,
    ) -> Self {
        let reachable = furthest_reachable_step(draft, today);
        let progress = WizardStep::ALL
            .iter()
            .map(|&s| StepLink {
                number: s.number(),
                title: s.title(),
                current: s == step,
                reachable: s <= reachable,
            })
            .collect();

        Self {
            step,
            progress,
            fields: step_fields(step, draft, errors),
            packages: if step == WizardStep::Package {
                PackageCard::all(draft.selected_package())
            } else {
                Vec::new()
            },
            package_error: errors.get("package").cloned(),
            summary: (step == WizardStep::Review)
                .then(|| ReviewSummary::from_draft(draft))
                .flatten(),
            has_errors: !errors.is_empty(),
        }
    }

    pub const fn previous_number(&self) -> Option<u8> {
        match self.step.previous() {
            Some(step) => Some(step.number()),
            None => None,
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_draft(session: &Session) -> Result<RegistrationDraft> {
    Ok(session
        .get::<RegistrationDraft>(DRAFT_KEY)
        .await?
        .unwrap_or_default())
}

fn step_url(step: WizardStep) -> String {
    format!("/register/step/{}", step.number())
}

fn parse_step(number: u8) -> Result<WizardStep> {
    WizardStep::from_number(number)
        .ok_or_else(|| AppError::NotFound(format!("wizard step {number}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Send the visitor to the furthest step they can open.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
#[instrument(skip(state, session))]
pub async fn start(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let draft = load_draft(&session).await?;
    let step = furthest_reachable_step(&draft, state.config().camp_start_date);
    Ok(Redirect::to(&step_url(step)))
}

/// Render a wizard step.
///
/// Steps beyond the first invalid one redirect back to it.
///
/// # Errors
///
/// Returns 404 for unknown step numbers.
#[instrument(skip(state, session))]
pub async fn show_step(
    State(state): State<AppState>,
    session: Session,
    Path(number): Path<u8>,
) -> Result<Response> {
    let step = parse_step(number)?;
    let today = state.config().camp_start_date;
    let draft = load_draft(&session).await?;

    let reachable = furthest_reachable_step(&draft, today);
    if step > reachable {
        return Ok(Redirect::to(&step_url(reachable)).into_response());
    }

    Ok(StepTemplate::new(step, &draft, &FieldErrors::new(), today).into_response())
}

/// Save a wizard step and move on when it is valid.
///
/// The posted fields are kept in the session even when invalid, so the
/// visitor does not have to retype them.
///
/// # Errors
///
/// Returns 404 for unknown step numbers.
#[instrument(skip(state, session, posted))]
pub async fn save_step(
    State(state): State<AppState>,
    session: Session,
    Path(number): Path<u8>,
    Form(posted): Form<RegistrationDraft>,
) -> Result<Response> {
    let step = parse_step(number)?;
    let today = state.config().camp_start_date;
    let mut draft = load_draft(&session).await?;

    // Earlier steps must be valid before this one is accepted
    let reachable = furthest_reachable_step(&draft, today);
    if step > reachable {
        return Ok(Redirect::to(&step_url(reachable)).into_response());
    }

    draft.merge_step(step, posted);
    session.insert(DRAFT_KEY, &draft).await?;

    let errors = validate_step(step, &draft, today);
    if !errors.is_empty() {
        tracing::debug!(step = step.number(), errors = errors.len(), "Wizard step invalid");
        let template = StepTemplate::new(step, &draft, &errors, today);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    }

    let next = step.next().unwrap_or(WizardStep::Review);
    Ok(Redirect::to(&step_url(next)).into_response())
}

/// Create the registration and redirect to checkout.
///
/// # Errors
///
/// Returns an error if the registration cannot be stored or the payment
/// gateway rejects the checkout.
#[instrument(skip(state, session))]
pub async fn submit(State(state): State<AppState>, session: Session) -> Result<Response> {
    let today = state.config().camp_start_date;
    let draft = load_draft(&session).await?;

    let new = match draft.clone().into_new_registration(today) {
        Ok(new) => new,
        Err(errors) => {
            let step = furthest_reachable_step(&draft, today);
            tracing::debug!(errors = errors.len(), "Submit with incomplete draft");
            return Ok(Redirect::to(&step_url(step)).into_response());
        }
    };

    let registration = state.data().registrations.create(new).await?;
    tracing::info!(
        registration_id = %registration.id,
        package = %registration.package,
        "Registration created"
    );
    add_breadcrumb(
        "registration",
        "Registration submitted",
        Some(&[("registration_id", &registration.id.to_string())]),
    );

    session.remove::<RegistrationDraft>(DRAFT_KEY).await?;
    session
        .insert(LAST_REGISTRATION_KEY, registration.id)
        .await?;

    let checkout = start_checkout(&state, &registration).await?;
    Ok(Redirect::to(&checkout.url).into_response())
}

/// Query string of the success and cancel redirects.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnQuery {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub registration: Option<RegistrationId>,
}

/// Payment confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "register/success.html")]
pub struct SuccessTemplate {
    /// `None` while the payment is still being confirmed.
    pub registration: Option<Registration>,
}

async fn lookup_registration(
    state: &AppState,
    query: &ReturnQuery,
) -> std::result::Result<Option<Registration>, RepositoryError> {
    let registrations = &state.data().registrations;
    if let Some(session_id) = query.session_id.as_deref()
        && let Some(registration) = registrations.find_by_checkout_session(session_id).await?
    {
        return Ok(Some(registration));
    }
    match query.registration {
        Some(id) => registrations.get(id).await,
        None => Ok(None),
    }
}

/// Show the payment confirmation.
///
/// The lookup is bounded by a timeout; on timeout or error the page
/// shows a "payment being confirmed" placeholder instead.
#[instrument(skip(state, session))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    Query(mut query): Query<ReturnQuery>,
) -> impl IntoResponse {
    if query.registration.is_none() {
        query.registration = session
            .get::<RegistrationId>(LAST_REGISTRATION_KEY)
            .await
            .ok()
            .flatten();
    }

    let registration =
        match tokio::time::timeout(STATUS_LOOKUP_TIMEOUT, lookup_registration(&state, &query)).await
        {
            Ok(Ok(registration)) => registration,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Payment status lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!("Payment status lookup timed out");
                None
            }
        };

    SuccessTemplate { registration }
}

/// Payment cancelled template.
#[derive(Template, WebTemplate)]
#[template(path = "register/cancelled.html")]
pub struct CancelledTemplate {
    pub registration_id: Option<RegistrationId>,
}

/// Show the payment cancelled page with a retry link.
#[instrument]
pub async fn cancelled(Query(query): Query<ReturnQuery>) -> impl IntoResponse {
    CancelledTemplate {
        registration_id: query.registration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use summer_camp_core::Package;

    #[test]
    fn test_step_fields_carry_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("parent_email", "Enter a valid email address".to_string());
        let fields = step_fields(WizardStep::Parent, &RegistrationDraft::default(), &errors);

        let email = fields.iter().find(|f| f.name == "parent_email");
        assert_eq!(
            email.and_then(|f| f.error.as_deref()),
            Some("Enter a valid email address")
        );
        assert!(fields.iter().filter(|f| f.name != "parent_email").all(|f| f.error.is_none()));
    }

    #[test]
    fn test_select_marks_current_value() {
        let draft = RegistrationDraft {
            shirt_size: Some("l".to_string()),
            ..RegistrationDraft::default()
        };
        let fields = step_fields(WizardStep::Camper, &draft, &FieldErrors::new());
        let size = fields.iter().find(|f| f.name == "shirt_size");

        let selected: Vec<&str> = size
            .map(|f| f.options.iter().filter(|o| o.selected).map(|o| o.value).collect())
            .unwrap_or_default();
        assert_eq!(selected, vec!["l"]);
    }

    #[test]
    fn test_review_summary_needs_package() {
        assert!(ReviewSummary::from_draft(&RegistrationDraft::default()).is_none());

        let draft = RegistrationDraft {
            package: Some(Package::HighSpecialization.as_str().to_string()),
            payment_option: Some(PaymentOption::Deposit.as_str().to_string()),
            ..RegistrationDraft::default()
        };
        let summary = ReviewSummary::from_draft(&draft);
        assert_eq!(
            summary.map(|s| s.due_now),
            Some(format_eur(Package::HighSpecialization.deposit()))
        );
    }
}
