//! Authentication route handlers for admin.
//!
//! Email and password sign-in against Supabase Auth, followed by a lookup in
//! `admin_users`. Without Supabase the demo accounts are accepted.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use summer_camp_data::mock::data::{DEMO_ADMIN_EMAIL, DEMO_SUBADMIN_EMAIL};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub email: String,
    pub error: Option<String>,
    /// Demo accounts to show when Supabase is not configured.
    pub demo_accounts: Vec<&'static str>,
}

impl LoginPageTemplate {
    fn new(state: &AppState, email: String, error: Option<String>) -> Self {
        let demo_accounts = if state.auth().is_demo() {
            vec![DEMO_ADMIN_EMAIL, DEMO_SUBADMIN_EMAIL]
        } else {
            Vec::new()
        };
        Self {
            email,
            error,
            demo_accounts,
        }
    }
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page, or go to the dashboard when already signed in.
///
/// GET /auth/login
async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    let signed_in = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .is_some();
    if signed_in {
        return Redirect::to("/").into_response();
    }

    LoginPageTemplate::new(&state, String::new(), None).into_response()
}

/// Verify credentials and start an admin session.
///
/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let password = SecretString::from(form.password);

    match state
        .auth()
        .sign_in(state.data(), &form.email, &password)
        .await
    {
        Ok(user) => {
            let admin = CurrentAdmin::from(&user);
            set_current_admin(&session, &admin).await?;
            set_sentry_user(admin.id.as_i32(), admin.email.as_str());
            tracing::info!(admin = %admin.email, role = %admin.role, "Admin signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_facing() => {
            tracing::info!(email = %form.email, error = %e, "Admin sign-in refused");
            let page = LoginPageTemplate::new(&state, form.email, Some(e.to_string()));
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Admin sign-in failed");
            let page = LoginPageTemplate::new(
                &state,
                form.email,
                Some("Sign-in is temporarily unavailable, try again shortly.".to_string()),
            );
            Ok((StatusCode::SERVICE_UNAVAILABLE, page).into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}
