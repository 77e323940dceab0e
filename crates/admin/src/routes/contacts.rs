//! Contact form submissions.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use summer_camp_core::ContactSubmission;

use crate::{
    error::Result,
    filters,
    middleware::{RequireAdminAuth, take_flash},
    models::Flash,
    state::AppState,
};

use super::dashboard::AdminUserView;

/// How many submissions the page shows.
const RECENT_LIMIT: usize = 100;

/// Contact submissions template.
#[derive(Template, WebTemplate)]
#[template(path = "contacts/index.html")]
pub struct ContactsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub contacts: Vec<ContactSubmission>,
}

/// Most recent contact form submissions, newest first.
///
/// # Errors
///
/// Returns an error if submissions cannot be loaded.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let contacts = state.data().contacts.list_recent(RECENT_LIMIT).await?;

    Ok(ContactsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/contacts".to_string(),
        flash: take_flash(&session).await,
        contacts,
    })
}
