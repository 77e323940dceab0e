//! Supabase Auth client for admin sign-in and invites.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SupabaseConfig;

/// Errors that can occur when talking to Supabase Auth.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Email or password rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// The user part of a successful sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// A successful password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct InviteRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<&'a str>,
}

/// Supabase Auth REST client.
#[derive(Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl AuthClient {
    /// Create a new Auth client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Sign in with email and password using the anon key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when Supabase rejects the
    /// credentials, or another error if the request fails.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let url = self.config.endpoint("auth/v1/token?grant_type=password");
        let key = self.config.anon_key.expose_secret();

        let response = self
            .client
            .post(&url)
            .header("apikey", key)
            .json(&PasswordGrant {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))
    }

    /// Send an invite e-mail so a new admin can set a password.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Supabase rejects the invite.
    #[tracing::instrument(skip(self))]
    pub async fn invite_user(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        let url = self.config.endpoint("auth/v1/invite");
        let key = self.config.service_role_key.expose_secret();

        let response = self
            .client
            .post(&url)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&InviteRequest { email, redirect_to })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(email, "Admin invite sent");
        Ok(())
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
