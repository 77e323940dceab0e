//! Contact form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use summer_camp_core::{ContactForm, FieldErrors};

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub form: ContactForm,
    pub errors: FieldErrors,
    pub sent: bool,
}

/// Display the contact form.
#[instrument]
pub async fn show() -> impl IntoResponse {
    ContactTemplate {
        form: ContactForm::default(),
        errors: FieldErrors::new(),
        sent: false,
    }
}

/// Store a contact request.
///
/// Invalid input re-renders the form with inline errors (422).
///
/// # Errors
///
/// Returns an error if the submission cannot be stored.
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(errors) => {
            let template = ContactTemplate {
                form,
                errors,
                sent: false,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    let stored = state.data().contacts.create(submission).await?;
    tracing::info!(contact_id = %stored.id, "Contact request stored");

    Ok(ContactTemplate {
        form: ContactForm::default(),
        errors: FieldErrors::new(),
        sent: true,
    }
    .into_response())
}
