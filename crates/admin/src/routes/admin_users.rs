//! Admin users management route handlers.
//!
//! Only the `admin` role reaches these pages. Nobody can change their own
//! role or delete themselves.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use summer_camp_core::admin_user::check_can_modify;
use summer_camp_core::{AdminPermissionError, AdminRole, AdminUserId, Email, NewAdminUser};
use summer_camp_data::RepositoryError;

use crate::{
    error::{AppError, Result},
    filters,
    middleware::{RequireFullAdmin, set_flash, take_flash},
    models::{CurrentAdmin, Flash},
    state::AppState,
};

use super::dashboard::AdminUserView;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserListItem {
    pub id: AdminUserId,
    pub email: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub is_self: bool,
}

/// Admin users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin_users/index.html")]
pub struct AdminUsersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub users: Vec<AdminUserListItem>,
    pub roles: &'static [AdminRole],
}

/// Admin users list page handler (`admin` only).
///
/// # Errors
///
/// Returns an error if the list cannot be loaded.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireFullAdmin(admin): RequireFullAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let users = state
        .data()
        .admin_users
        .list()
        .await?
        .into_iter()
        .map(|u| AdminUserListItem {
            is_self: u.id == admin.id,
            id: u.id,
            email: u.email.to_string(),
            role: u.role,
            created_at: u.created_at,
            created_by: u.created_by.map(|e| e.to_string()),
        })
        .collect();

    Ok(AdminUsersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/admin-users".to_string(),
        flash: take_flash(&session).await,
        users,
        roles: AdminRole::ALL,
    })
}

/// Input for inviting an admin.
#[derive(Debug, Deserialize)]
pub struct InviteInput {
    pub email: String,
    pub role: String,
}

/// Add an `admin_users` row and send a Supabase invite.
///
/// An invite that fails to send leaves the row in place.
///
/// # Errors
///
/// Returns 400 for an unknown role.
#[instrument(skip(admin, state, session))]
pub async fn invite(
    RequireFullAdmin(admin): RequireFullAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<InviteInput>,
) -> Result<impl IntoResponse> {
    let role = input
        .role
        .parse::<AdminRole>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let email = match Email::parse(&input.email) {
        Ok(email) => email,
        Err(e) => {
            set_flash(&session, Flash::error(format!("Invalid email: {e}"))).await;
            return Ok(Redirect::to("/admin-users"));
        }
    };

    let created = state
        .data()
        .admin_users
        .create(NewAdminUser {
            email: email.clone(),
            role,
            created_by: Some(admin.email.clone()),
        })
        .await;

    let flash = match created {
        Ok(user) => {
            tracing::info!(
                admin = %admin.email,
                invited = %user.email,
                %role,
                "Admin user created"
            );
            match state.auth().invite(&email, &state.config().base_url).await {
                Ok(()) => Flash::success(format!("Invitation sent to {email}.")),
                Err(e) => {
                    tracing::warn!(error = %e, invited = %email, "Failed to send admin invite");
                    Flash::error(format!(
                        "{email} was added, but the invitation e-mail could not be sent."
                    ))
                }
            }
        }
        Err(RepositoryError::Conflict(_)) => {
            Flash::error(format!("{email} is already an admin user."))
        }
        Err(e) => return Err(e.into()),
    };

    set_flash(&session, flash).await;
    Ok(Redirect::to("/admin-users"))
}

/// Apply the modification rules, turning a self-modification attempt into a
/// flash message.
async fn permit(session: &Session, admin: &CurrentAdmin, target: AdminUserId) -> Result<bool> {
    match check_can_modify(admin.id, admin.role, target) {
        Ok(()) => Ok(true),
        Err(AdminPermissionError::SelfModification) => {
            let message = AdminPermissionError::SelfModification.to_string();
            set_flash(session, Flash::error(message)).await;
            Ok(false)
        }
        Err(e @ AdminPermissionError::NotAllowed) => Err(AppError::Forbidden(e.to_string())),
    }
}

/// Input for changing a role.
#[derive(Debug, Deserialize)]
pub struct RoleInput {
    pub role: String,
}

/// Change another admin's role.
///
/// # Errors
///
/// Returns 400 for an unknown role, 404 for an unknown admin user.
#[instrument(skip(admin, state, session))]
pub async fn update_role(
    RequireFullAdmin(admin): RequireFullAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdminUserId>,
    Form(input): Form<RoleInput>,
) -> Result<impl IntoResponse> {
    let role = input
        .role
        .parse::<AdminRole>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if permit(&session, &admin, id).await? {
        let user = state.data().admin_users.update_role(id, role).await?;
        tracing::info!(admin = %admin.email, target = %user.email, %role, "Admin role changed");
        set_flash(
            &session,
            Flash::success(format!("{} is now {}.", user.email, role.label())),
        )
        .await;
    }

    Ok(Redirect::to("/admin-users"))
}

/// Remove another admin.
///
/// # Errors
///
/// Returns 404 for an unknown admin user.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireFullAdmin(admin): RequireFullAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdminUserId>,
) -> Result<impl IntoResponse> {
    if permit(&session, &admin, id).await? {
        state.data().admin_users.delete(id).await?;
        tracing::warn!(admin = %admin.email, target = %id, "Admin user deleted");
        set_flash(&session, Flash::success("Admin user removed.")).await;
    }

    Ok(Redirect::to("/admin-users"))
}
