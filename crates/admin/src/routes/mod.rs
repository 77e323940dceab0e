//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET  /auth/login                       - Login page
//! POST /auth/login                       - Sign in
//! POST /auth/logout                      - Sign out
//!
//! # Dashboard
//! GET  /                                 - Statistics overview
//!
//! # Registrations
//! GET  /registrations                    - Filterable, paginated table
//! GET  /registrations/{id}               - Detail
//! POST /registrations/{id}/status        - Change lifecycle status
//! POST /registrations/{id}/notes         - Update notes
//! POST /registrations/{id}/payment       - Record a manual payment
//! POST /registrations/{id}/reminder      - Send a payment reminder
//! POST /registrations/{id}/delete        - Delete (admin role only)
//!
//! # Gallery
//! GET  /gallery                          - Collections and photos
//! POST /gallery/collections              - Create collection
//! POST /gallery/photos                   - Upload photo (multipart)
//! POST /gallery/photos/{id}/featured     - Toggle featured flag
//! POST /gallery/photos/{id}/delete       - Delete photo
//!
//! # Admin Users (admin role only)
//! GET  /admin-users                      - List admin users
//! POST /admin-users                      - Invite admin user
//! POST /admin-users/{id}/role            - Change role
//! POST /admin-users/{id}/delete          - Remove admin user
//!
//! # Contact form
//! GET  /contacts                         - Recent submissions
//! ```

pub mod admin_users;
pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod gallery;
pub mod registrations;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .route("/", get(dashboard::index))
        .nest("/registrations", registration_routes())
        .nest("/gallery", gallery_routes())
        .nest("/admin-users", admin_user_routes())
        .route("/contacts", get(contacts::index))
}

fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(registrations::index))
        .route("/{id}", get(registrations::show))
        .route("/{id}/status", post(registrations::update_status))
        .route("/{id}/notes", post(registrations::update_notes))
        .route("/{id}/payment", post(registrations::record_payment))
        .route("/{id}/reminder", post(registrations::send_reminder))
        .route("/{id}/delete", post(registrations::delete))
}

fn gallery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery::index))
        .route("/collections", post(gallery::create_collection))
        .route(
            "/photos",
            post(gallery::upload_photo).layer(DefaultBodyLimit::max(gallery::MAX_UPLOAD_BYTES)),
        )
        .route("/photos/{id}/featured", post(gallery::set_featured))
        .route("/photos/{id}/delete", post(gallery::delete_photo))
}

fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_users::index).post(admin_users::invite))
        .route("/{id}/role", post(admin_users::update_role))
        .route("/{id}/delete", post(admin_users::delete))
}
