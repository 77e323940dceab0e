//! Admin sign-in error types.

use thiserror::Error;

use summer_camp_data::RepositoryError;
use summer_camp_data::supabase::AuthError;

/// Errors that can occur while signing an admin in.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] summer_camp_core::EmailError),

    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account exists in Supabase Auth but has no `admin_users` row.
    #[error("this account has no admin access")]
    NotAnAdmin,

    /// Supabase Auth request failed.
    #[error("auth service error: {0}")]
    Auth(AuthError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for AdminAuthError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::Auth(other),
        }
    }
}

impl AdminAuthError {
    /// Whether the message can be shown on the login form as-is.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_) | Self::InvalidCredentials | Self::NotAnAdmin
        )
    }
}
