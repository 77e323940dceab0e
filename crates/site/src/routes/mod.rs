//! HTTP route handlers for the public site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /program /staff /faq       - Markdown content pages
//! GET  /privacy /regulations
//! GET  /contact                   - Contact form
//! POST /contact                   - Store a contact request
//!
//! # Registration wizard
//! GET  /register                  - Redirect to the current step
//! GET  /register/step/{n}         - Render step n
//! POST /register/step/{n}         - Save and validate step n
//! POST /register/submit           - Create the registration and start checkout
//! GET  /register/success          - Payment confirmation
//! GET  /register/cancelled        - Payment cancelled
//!
//! # API
//! POST /api/checkout                    - Start a checkout (JSON)
//! GET  /api/registrations/{id}/status   - Payment status (JSON)
//! POST /api/webhooks/stripe             - Stripe webhook
//!
//! # Gallery
//! GET  /gallery                   - Collections with photo counts
//! GET  /gallery/{slug}            - Photos of one collection
//! ```

pub mod checkout;
pub mod contact;
pub mod gallery;
pub mod home;
pub mod pages;
pub mod register;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the registration wizard router.
pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(register::start))
        .route(
            "/step/{step}",
            get(register::show_step).post(register::save_step),
        )
        .route("/submit", post(register::submit))
        .route("/success", get(register::success))
        .route("/cancelled", get(register::cancelled))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::create))
        .route("/registrations/{id}/status", get(checkout::status))
        .route("/webhooks/stripe", post(webhook::stripe))
}

/// Create the gallery router.
pub fn gallery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery::index))
        .route("/{slug}", get(gallery::show))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(pages::router())
        .route("/contact", get(contact::show).post(contact::submit))
        .nest("/register", register_routes())
        .nest("/api", api_routes())
        .nest("/gallery", gallery_routes())
}
