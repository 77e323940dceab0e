//! Admin authentication service.
//!
//! Live mode checks the password with Supabase Auth and then requires a row
//! in `admin_users`, which carries the role. Demo mode accepts any password
//! for the two demo accounts.

mod error;

pub use error::AdminAuthError;

use secrecy::{ExposeSecret, SecretString};

use summer_camp_core::{AdminUser, Email};
use summer_camp_data::Datastore;
use summer_camp_data::mock::data::{DEMO_ADMIN_EMAIL, DEMO_SUBADMIN_EMAIL};
use summer_camp_data::supabase::AuthClient;

/// How admin passwords are checked.
#[derive(Clone)]
pub enum Authenticator {
    Supabase(AuthClient),
    Demo,
}

impl Authenticator {
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self, Self::Demo)
    }

    /// Verify credentials and load the matching admin user.
    ///
    /// # Errors
    ///
    /// Returns [`AdminAuthError::InvalidCredentials`] for a wrong password
    /// (or a non-demo account in demo mode) and [`AdminAuthError::NotAnAdmin`]
    /// when the account has no `admin_users` row.
    #[tracing::instrument(skip(self, data, password))]
    pub async fn sign_in(
        &self,
        data: &Datastore,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email)?;

        match self {
            Self::Supabase(client) => {
                client.sign_in_with_password(email.as_str(), password).await?;
            }
            Self::Demo => {
                let is_demo_account =
                    [DEMO_ADMIN_EMAIL, DEMO_SUBADMIN_EMAIL].contains(&email.as_str());
                if !is_demo_account || password.expose_secret().is_empty() {
                    return Err(AdminAuthError::InvalidCredentials);
                }
            }
        }

        data.admin_users
            .get_by_email(&email)
            .await?
            .ok_or(AdminAuthError::NotAnAdmin)
    }

    /// Send a Supabase invite so a new admin can set a password.
    ///
    /// In demo mode nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if Supabase rejects the invite.
    pub async fn invite(&self, email: &Email, redirect_to: &str) -> Result<(), AdminAuthError> {
        match self {
            Self::Supabase(client) => {
                client.invite_user(email.as_str(), Some(redirect_to)).await?;
            }
            Self::Demo => {
                tracing::info!(email = %email, "Demo mode, invite e-mail not sent");
            }
        }
        Ok(())
    }
}
