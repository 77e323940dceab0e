//! Registration management route handlers.
//!
//! The table is filtered in memory over the full registration list, which
//! stays in the low hundreds for a camp season.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use summer_camp_core::filter::{DEFAULT_PER_PAGE, apply, paginate};
use summer_camp_core::{
    AgeBucket, ExperienceLevel, Package, Page, PaymentFilter, PaymentStatus, Registration,
    RegistrationFilter, RegistrationId, RegistrationStatus, ShirtSize, SortDirection, SortKey,
};

use crate::{
    error::{AppError, Result},
    filters,
    middleware::{RequireAdminAuth, RequireFullAdmin, set_flash, take_flash},
    models::Flash,
    services::email::{ReminderOutcome, deliver_payment_reminder},
    state::AppState,
};

use super::dashboard::AdminUserView;

// =============================================================================
// Query Parsing
// =============================================================================

/// Query parameters for the registrations table.
///
/// Everything arrives as text so a stale or hand-edited URL degrades to "no
/// filter" instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationsQuery {
    pub status: Option<String>,
    pub package: Option<String>,
    pub payment: Option<String>,
    pub size: Option<String>,
    pub experience: Option<String>,
    pub age: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// `yes` or `no`.
    pub notes: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<String>,
}

fn parse_param<T: FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

impl RegistrationsQuery {
    /// Build the filter, dropping values that do not parse.
    #[must_use]
    pub fn to_filter(&self) -> RegistrationFilter {
        let defaults = RegistrationFilter::default();
        RegistrationFilter {
            status: parse_param(self.status.as_deref()),
            package: parse_param(self.package.as_deref()),
            payment: parse_param(self.payment.as_deref()),
            size: parse_param(self.size.as_deref()),
            experience: parse_param(self.experience.as_deref()),
            age_bucket: parse_param(self.age.as_deref()),
            created_from: parse_param::<NaiveDate>(self.from.as_deref()),
            created_to: parse_param::<NaiveDate>(self.to.as_deref()),
            has_notes: match self.notes.as_deref().map(str::trim) {
                Some("yes") => Some(true),
                Some("no") => Some(false),
                _ => None,
            },
            search: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            sort: parse_param(self.sort.as_deref()).unwrap_or(defaults.sort),
            direction: parse_param(self.dir.as_deref()).unwrap_or(defaults.direction),
        }
    }

    /// Requested page, 1 when missing or invalid.
    #[must_use]
    pub fn page(&self) -> usize {
        parse_param(self.page.as_deref()).unwrap_or(1)
    }
}

/// Query string parameters that reproduce a filter, without page.
fn filter_params(filter: &RegistrationFilter) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = filter.status {
        params.push(("status", status.as_str().to_string()));
    }
    if let Some(package) = filter.package {
        params.push(("package", package.as_str().to_string()));
    }
    if let Some(payment) = filter.payment {
        params.push(("payment", payment.as_str().to_string()));
    }
    if let Some(size) = filter.size {
        params.push(("size", size.as_str().to_string()));
    }
    if let Some(experience) = filter.experience {
        params.push(("experience", experience.as_str().to_string()));
    }
    if let Some(age) = filter.age_bucket {
        params.push(("age", age.as_str().to_string()));
    }
    if let Some(from) = filter.created_from {
        params.push(("from", from.to_string()));
    }
    if let Some(to) = filter.created_to {
        params.push(("to", to.to_string()));
    }
    if let Some(has_notes) = filter.has_notes {
        params.push(("notes", if has_notes { "yes" } else { "no" }.to_string()));
    }
    if let Some(q) = &filter.search {
        params.push(("q", q.clone()));
    }
    params
}

/// Build a `/registrations` URL from parameters.
fn registrations_url(params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return "/registrations".to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("/registrations?{query}")
}

// =============================================================================
// View Types
// =============================================================================

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn select_options<T: Copy + PartialEq>(
    all: &[T],
    selected: Option<T>,
    value: impl Fn(T) -> &'static str,
    label: impl Fn(T) -> &'static str,
) -> Vec<SelectOption> {
    all.iter()
        .map(|&item| SelectOption {
            value: value(item),
            label: label(item),
            selected: selected == Some(item),
        })
        .collect()
}

/// Filter panel state.
#[derive(Debug, Clone)]
pub struct FilterPanel {
    pub status: Vec<SelectOption>,
    pub package: Vec<SelectOption>,
    pub payment: Vec<SelectOption>,
    pub size: Vec<SelectOption>,
    pub experience: Vec<SelectOption>,
    pub age: Vec<SelectOption>,
    pub notes: Vec<SelectOption>,
    pub from: String,
    pub to: String,
    pub q: String,
    pub sort: &'static str,
    pub dir: &'static str,
    pub active_count: usize,
}

impl FilterPanel {
    fn new(filter: &RegistrationFilter) -> Self {
        let mut payment = vec![SelectOption {
            value: PaymentFilter::Outstanding.as_str(),
            label: "Balance due",
            selected: filter.payment == Some(PaymentFilter::Outstanding),
        }];
        payment.extend(PaymentStatus::ALL.iter().map(|&status| SelectOption {
            value: status.as_str(),
            label: status.label(),
            selected: filter.payment == Some(PaymentFilter::Status(status)),
        }));

        Self {
            status: select_options(
                RegistrationStatus::ALL,
                filter.status,
                RegistrationStatus::as_str,
                RegistrationStatus::label,
            ),
            package: select_options(
                Package::ALL,
                filter.package,
                Package::as_str,
                Package::label,
            ),
            payment,
            size: select_options(
                ShirtSize::ALL,
                filter.size,
                ShirtSize::as_str,
                ShirtSize::label,
            ),
            experience: select_options(
                ExperienceLevel::ALL,
                filter.experience,
                ExperienceLevel::as_str,
                ExperienceLevel::label,
            ),
            age: select_options(
                AgeBucket::ALL,
                filter.age_bucket,
                AgeBucket::as_str,
                AgeBucket::label,
            ),
            notes: vec![
                SelectOption {
                    value: "yes",
                    label: "With notes",
                    selected: filter.has_notes == Some(true),
                },
                SelectOption {
                    value: "no",
                    label: "Without notes",
                    selected: filter.has_notes == Some(false),
                },
            ],
            from: filter
                .created_from
                .map(|d| d.to_string())
                .unwrap_or_default(),
            to: filter.created_to.map(|d| d.to_string()).unwrap_or_default(),
            q: filter.search.clone().unwrap_or_default(),
            sort: filter.sort.as_str(),
            dir: filter.direction.as_str(),
            active_count: filter.active_count(),
        }
    }
}

/// Clickable column header.
#[derive(Debug, Clone)]
pub struct SortHeader {
    pub label: &'static str,
    pub url: String,
    /// Arrow for the active column, empty otherwise.
    pub indicator: &'static str,
}

fn sort_headers(filter: &RegistrationFilter) -> Vec<SortHeader> {
    SortKey::ALL
        .iter()
        .map(|&key| {
            let active = filter.sort == key;
            let direction = if active {
                filter.direction.toggled()
            } else {
                SortDirection::Asc
            };
            let mut params = filter_params(filter);
            params.push(("sort", key.as_str().to_string()));
            params.push(("dir", direction.as_str().to_string()));
            SortHeader {
                label: key.label(),
                url: registrations_url(&params),
                indicator: match (active, filter.direction) {
                    (false, _) => "",
                    (true, SortDirection::Asc) => "▲",
                    (true, SortDirection::Desc) => "▼",
                },
            }
        })
        .collect()
}

/// Registration row for the table.
#[derive(Debug, Clone)]
pub struct RegistrationRow {
    pub id: RegistrationId,
    pub camper_name: String,
    pub age: u32,
    pub parent_name: String,
    pub parent_email: String,
    pub package: &'static str,
    pub status: RegistrationStatus,
    pub payment: &'static str,
    pub amount_due: Decimal,
    pub has_notes: bool,
    pub created_at: chrono::DateTime<Utc>,
}

impl RegistrationRow {
    fn new(registration: &Registration, today: NaiveDate) -> Self {
        Self {
            id: registration.id,
            camper_name: registration.camper_name(),
            age: registration.age_on(today),
            parent_name: registration.parent_name(),
            parent_email: registration.parent_email.to_string(),
            package: registration.package.label(),
            status: registration.status,
            payment: registration.payment_status.label(),
            amount_due: registration.amount_due(),
            has_notes: registration.has_notes(),
            created_at: registration.created_at,
        }
    }
}

/// Registrations table template.
#[derive(Template, WebTemplate)]
#[template(path = "registrations/index.html")]
pub struct RegistrationsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub page: Page<RegistrationRow>,
    pub filters: FilterPanel,
    pub headers: Vec<SortHeader>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    /// Registrations before filtering.
    pub grand_total: usize,
}

/// Registration detail template.
#[derive(Template, WebTemplate)]
#[template(path = "registrations/show.html")]
pub struct RegistrationShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub registration: Registration,
    pub age: u32,
    pub total_price: Decimal,
    pub amount_due: Decimal,
    pub status_options: Vec<SelectOption>,
    pub can_remind: bool,
    pub can_delete: bool,
}

// =============================================================================
// Page Handlers
// =============================================================================

/// Filterable, sortable, paginated registrations table.
///
/// # Errors
///
/// Returns an error if registrations cannot be loaded.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RegistrationsQuery>,
) -> Result<impl IntoResponse> {
    let registrations = state.data().registrations.list().await?;
    let today = Utc::now().date_naive();
    let filter = query.to_filter();

    let rows: Vec<RegistrationRow> = apply(&registrations, &filter, today)
        .into_iter()
        .map(|r| RegistrationRow::new(r, today))
        .collect();
    let page = paginate(rows, query.page(), DEFAULT_PER_PAGE);

    let mut params = filter_params(&filter);
    params.push(("sort", filter.sort.as_str().to_string()));
    params.push(("dir", filter.direction.as_str().to_string()));
    let page_url = |number: usize| {
        let mut params = params.clone();
        params.push(("page", number.to_string()));
        registrations_url(&params)
    };

    Ok(RegistrationsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/registrations".to_string(),
        flash: take_flash(&session).await,
        prev_url: page.has_previous().then(|| page_url(page.page - 1)),
        next_url: page.has_next().then(|| page_url(page.page + 1)),
        page,
        filters: FilterPanel::new(&filter),
        headers: sort_headers(&filter),
        grand_total: registrations.len(),
    })
}

async fn load(state: &AppState, id: RegistrationId) -> Result<Registration> {
    state
        .data()
        .registrations
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Registration {id} not found")))
}

/// Registration detail with admin actions.
///
/// # Errors
///
/// Returns 404 for an unknown registration.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RegistrationId>,
) -> Result<impl IntoResponse> {
    let registration = load(&state, id).await?;
    let amount_due = registration.amount_due();

    Ok(RegistrationShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/registrations".to_string(),
        flash: take_flash(&session).await,
        age: registration.age_on(Utc::now().date_naive()),
        total_price: registration.total_price(),
        status_options: select_options(
            RegistrationStatus::ALL,
            Some(registration.status),
            RegistrationStatus::as_str,
            RegistrationStatus::label,
        ),
        can_remind: can_remind(&registration),
        can_delete: admin.is_full_admin(),
        amount_due,
        registration,
    })
}

/// A reminder only makes sense for an active registration that still owes money.
fn can_remind(registration: &Registration) -> bool {
    registration.is_active() && registration.amount_due() > Decimal::ZERO
}

// =============================================================================
// Action Handlers
// =============================================================================

fn detail_url(id: RegistrationId) -> String {
    format!("/registrations/{id}")
}

/// Input for changing status.
#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

/// Change the lifecycle status.
///
/// # Errors
///
/// Returns 400 for an unknown status, 404 for an unknown registration.
#[instrument(skip(admin, state, session))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RegistrationId>,
    Form(input): Form<StatusInput>,
) -> Result<impl IntoResponse> {
    let status = input
        .status
        .parse::<RegistrationStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let registration = state.data().registrations.update_status(id, status).await?;
    tracing::info!(
        admin = %admin.email,
        registration = %id,
        %status,
        "Registration status changed"
    );

    set_flash(
        &session,
        Flash::success(format!(
            "{} is now {}.",
            registration.camper_name(),
            status.label().to_lowercase()
        )),
    )
    .await;
    Ok(Redirect::to(&detail_url(id)))
}

/// Input for updating notes.
#[derive(Debug, Deserialize)]
pub struct NotesInput {
    #[serde(default)]
    pub notes: String,
}

/// Replace the admin notes; a blank value clears them.
///
/// # Errors
///
/// Returns 404 for an unknown registration.
#[instrument(skip(admin, state, session, input))]
pub async fn update_notes(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RegistrationId>,
    Form(input): Form<NotesInput>,
) -> Result<impl IntoResponse> {
    let notes = Some(input.notes.trim().to_string()).filter(|n| !n.is_empty());
    state.data().registrations.update_notes(id, notes).await?;
    tracing::info!(admin = %admin.email, registration = %id, "Registration notes updated");

    set_flash(&session, Flash::success("Notes saved.")).await;
    Ok(Redirect::to(&detail_url(id)))
}

/// Input for a manual payment.
#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub amount: String,
}

/// Parse an amount typed by an admin.
///
/// When a comma is present it is the decimal separator and dots group
/// thousands (`1.234,50`); otherwise a dot is the decimal point.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_start_matches('€').trim();
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_owned()
    };
    Decimal::from_str(&normalized).ok().map(|d| d.round_dp(2))
}

/// Record a payment received outside Stripe, e.g. a bank transfer.
///
/// # Errors
///
/// Returns 400 for a malformed or negative amount, 404 for an unknown
/// registration.
#[instrument(skip(admin, state, session))]
pub async fn record_payment(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RegistrationId>,
    Form(input): Form<PaymentInput>,
) -> Result<impl IntoResponse> {
    let amount = parse_amount(&input.amount)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid amount: {}", input.amount)))?;
    if amount < Decimal::ZERO {
        return Err(AppError::BadRequest("Amount cannot be negative".to_string()));
    }

    let recorded = state
        .data()
        .registrations
        .record_payment(id, amount, None)
        .await?;
    tracing::info!(
        admin = %admin.email,
        registration = %id,
        %amount,
        payment_status = %recorded.registration.payment_status,
        "Manual payment recorded"
    );

    set_flash(
        &session,
        Flash::success(format!(
            "Recorded {}. Balance due: {}.",
            summer_camp_core::format_eur(amount),
            summer_camp_core::format_eur(recorded.registration.amount_due())
        )),
    )
    .await;
    Ok(Redirect::to(&detail_url(id)))
}

/// Send a payment reminder and stamp `reminder_sent_at`.
///
/// Without SMTP the reminder is only logged but still stamped.
///
/// # Errors
///
/// Returns 404 for an unknown registration, 502 if the mail server refuses
/// the message.
#[instrument(skip(admin, state, session))]
pub async fn send_reminder(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RegistrationId>,
) -> Result<impl IntoResponse> {
    let registration = load(&state, id).await?;

    if !can_remind(&registration) {
        set_flash(
            &session,
            Flash::error("There is no balance due for this registration."),
        )
        .await;
        return Ok(Redirect::to(&detail_url(id)));
    }

    let outcome =
        deliver_payment_reminder(state.email(), &registration, &state.config().site_url).await?;
    state
        .data()
        .registrations
        .mark_reminder_sent(id, Utc::now())
        .await?;
    tracing::info!(admin = %admin.email, registration = %id, ?outcome, "Payment reminder handled");

    let message = match outcome {
        ReminderOutcome::Sent => format!("Reminder sent to {}.", registration.parent_email),
        ReminderOutcome::Logged => {
            "E-mail is not configured, the reminder was logged instead.".to_string()
        }
    };
    set_flash(&session, Flash::success(message)).await;
    Ok(Redirect::to(&detail_url(id)))
}

/// Delete a registration (admin role only).
///
/// # Errors
///
/// Returns 404 for an unknown registration.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireFullAdmin(admin): RequireFullAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RegistrationId>,
) -> Result<impl IntoResponse> {
    let registration = load(&state, id).await?;
    state.data().registrations.delete(id).await?;
    tracing::warn!(admin = %admin.email, registration = %id, "Registration deleted");

    set_flash(
        &session,
        Flash::success(format!(
            "Registration for {} deleted.",
            registration.camper_name()
        )),
    )
    .await;
    Ok(Redirect::to("/registrations"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> RegistrationsQuery {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/registrations?{encoded}").parse().unwrap();
        Query::<RegistrationsQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_query_to_filter() {
        let filter = query(&[
            ("status", "confirmed"),
            ("payment", "outstanding"),
            ("age", "12-14"),
            ("from", "2026-01-01"),
            ("notes", "yes"),
            ("q", "  rossi "),
            ("sort", "amount_due"),
            ("dir", "asc"),
        ])
        .to_filter();

        assert_eq!(filter.status, Some(RegistrationStatus::Confirmed));
        assert_eq!(filter.payment, Some(PaymentFilter::Outstanding));
        assert_eq!(filter.age_bucket, Some(AgeBucket::TwelveToFourteen));
        assert_eq!(filter.created_from, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.has_notes, Some(true));
        assert_eq!(filter.search.as_deref(), Some("rossi"));
        assert_eq!(filter.sort, SortKey::AmountDue);
        assert_eq!(filter.direction, SortDirection::Asc);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let q = query(&[("status", "bogus"), ("from", "yesterday"), ("page", "x")]);
        let filter = q.to_filter();

        assert_eq!(filter, RegistrationFilter::default());
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn test_filter_params_round_trip_through_url() {
        let filter = query(&[("package", "standard"), ("q", "maria rossi")]).to_filter();
        let url = registrations_url(&filter_params(&filter));

        assert_eq!(url, "/registrations?package=standard&q=maria%20rossi");
    }

    #[test]
    fn test_sort_header_toggles_active_column() {
        let filter = query(&[("sort", "camper_name"), ("dir", "asc")]).to_filter();
        let headers = sort_headers(&filter);
        let camper = headers.iter().find(|h| h.label == "Camper").unwrap();

        assert!(camper.url.contains("sort=camper_name&dir=desc"));
        assert_eq!(camper.indicator, "▲");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150"), Some(Decimal::new(150, 0)));
        assert_eq!(parse_amount(" 99,50 "), Some(Decimal::new(9950, 2)));
        assert_eq!(parse_amount("€ 10.004"), Some(Decimal::new(1000, 2)));
        assert_eq!(parse_amount("1.234,50"), Some(Decimal::new(123_450, 2)));
        assert_eq!(parse_amount("€1.250,00"), Some(Decimal::new(1250, 0)));
        assert_eq!(parse_amount("ten"), None);
    }
}
