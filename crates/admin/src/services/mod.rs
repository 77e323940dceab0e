//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password sign-in through Supabase Auth, or demo accounts
//! - `email` - Payment reminder delivery via SMTP

pub mod auth;
pub mod email;

pub use auth::{AdminAuthError, Authenticator};
pub use email::{EmailError, EmailService, ReminderOutcome};
