//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use summer_camp_core::DashboardStats;

use crate::{
    error::Result,
    filters,
    middleware::{RequireAdminAuth, take_flash},
    models::{CurrentAdmin, Flash},
    state::AppState,
};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub email: String,
    pub role: String,
    pub is_full_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            email: admin.email.to_string(),
            role: admin.role.label().to_string(),
            is_full_admin: admin.is_full_admin(),
        }
    }
}

/// One row of a breakdown table.
#[derive(Debug, Clone)]
pub struct BreakdownRow {
    pub label: String,
    pub count: usize,
    /// Percentage of active registrations.
    pub share: usize,
}

/// A titled breakdown of active registrations.
#[derive(Debug, Clone)]
pub struct Breakdown {
    pub title: &'static str,
    pub rows: Vec<BreakdownRow>,
}

fn breakdown<K>(
    title: &'static str,
    counts: &std::collections::BTreeMap<K, usize>,
    stats: &DashboardStats,
    label: impl Fn(&K) -> String,
) -> Breakdown {
    Breakdown {
        title,
        rows: counts
            .iter()
            .map(|(key, &count)| BreakdownRow {
                label: label(key),
                count,
                share: stats.share_of_active(count),
            })
            .collect(),
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub stats: DashboardStats,
    pub breakdowns: Vec<Breakdown>,
}

/// Statistics overview.
///
/// Breakdowns count active registrations only; ages are computed as of
/// today.
///
/// # Errors
///
/// Returns an error if registrations cannot be loaded.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let registrations = state.data().registrations.list().await?;
    let stats = DashboardStats::compute(&registrations, Utc::now().date_naive());

    let breakdowns = vec![
        breakdown("Status", &stats.by_status, &stats, |k| k.label().to_string()),
        breakdown("Package", &stats.by_package, &stats, |k| k.label().to_string()),
        breakdown("Payment", &stats.by_payment, &stats, |k| k.label().to_string()),
        breakdown("Age group", &stats.by_age, &stats, |k| k.label().to_string()),
        breakdown("Experience", &stats.by_experience, &stats, |k| {
            k.label().to_string()
        }),
        breakdown("T-shirt size", &stats.by_size, &stats, |k| k.label().to_string()),
    ];

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        stats,
        breakdowns,
    })
}
