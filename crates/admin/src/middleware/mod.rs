//! HTTP middleware and extractors for admin.
//!
//! - `auth` - extractors gating handlers on the signed-in admin and role
//! - `session` - cookie session layer (`SameSite=Strict`, 24h inactivity)

pub mod auth;
pub mod session;

pub use auth::{
    RequireAdminAuth, RequireFullAdmin, clear_current_admin, set_current_admin, take_flash,
    set_flash,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
