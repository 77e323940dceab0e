//! HTTP middleware for the public site.

pub mod session;

pub use session::{SESSION_COOKIE_NAME, create_session_layer};
