//! Supabase REST clients.
//!
//! The database itself is reached through sqlx; these clients cover the two
//! Supabase services that have no SQL surface:
//!
//! - [`StorageClient`] - gallery image uploads
//! - [`AuthClient`] - admin password sign-in and invites

mod auth;
mod storage;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub use auth::{AuthClient, AuthError, AuthSession, AuthUser};
pub use storage::{StorageClient, StorageError};

/// Default bucket for gallery images.
pub const DEFAULT_STORAGE_BUCKET: &str = "gallery";

/// Errors raised while reading the Supabase settings.
#[derive(Debug, Error)]
pub enum SupabaseConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid SUPABASE_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Supabase project settings.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: Url,
    /// Public anon key, used for password sign-in.
    pub anon_key: SecretString,
    /// Service role key, used for storage writes and invites.
    pub service_role_key: SecretString,
    /// Bucket gallery images are uploaded to.
    pub storage_bucket: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("service_role_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}

impl SupabaseConfig {
    /// Load from `SUPABASE_*` environment variables.
    ///
    /// Returns `Ok(None)` when `SUPABASE_URL` is unset, which puts the
    /// caller in demo mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is set but invalid or a key is missing.
    pub fn from_env() -> Result<Option<Self>, SupabaseConfigError> {
        let Some(url) = env_var("SUPABASE_URL") else {
            return Ok(None);
        };

        let anon_key = env_var("SUPABASE_ANON_KEY")
            .ok_or(SupabaseConfigError::MissingEnv("SUPABASE_ANON_KEY"))?;
        let service_role_key = env_var("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or(SupabaseConfigError::MissingEnv("SUPABASE_SERVICE_ROLE_KEY"))?;

        Ok(Some(Self {
            url: Url::parse(&url)?,
            anon_key: SecretString::from(anon_key),
            service_role_key: SecretString::from(service_role_key),
            storage_bucket: env_var("SUPABASE_STORAGE_BUCKET")
                .unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_owned()),
        }))
    }

    /// Join a REST path onto the project URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_config() -> SupabaseConfig {
        SupabaseConfig {
            url: Url::parse("https://project.supabase.co/").unwrap(),
            anon_key: SecretString::from("anon-key"),
            service_role_key: SecretString::from("service-key"),
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_owned(),
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = sample_config();
        assert_eq!(
            config.endpoint("/storage/v1/object/gallery/a.jpg"),
            "https://project.supabase.co/storage/v1/object/gallery/a.jpg"
        );
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", sample_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("service-key"));
        assert!(!debug.contains("anon-key"));
    }
}
