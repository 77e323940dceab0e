//! Application state shared across handlers.

use std::sync::Arc;

use summer_camp_data::Datastore;
use summer_camp_data::supabase::{AuthClient, StorageClient};

use crate::config::AdminConfig;
use crate::error::AppError;
use crate::services::{Authenticator, EmailService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    data: Datastore,
    auth: Authenticator,
    storage: Option<StorageClient>,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Supabase and SMTP clients are built only when configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be built.
    pub fn new(config: AdminConfig, data: Datastore) -> Result<Self, AppError> {
        let (auth, storage) = match &config.supabase {
            Some(supabase) => (
                Authenticator::Supabase(AuthClient::new(supabase)?),
                Some(StorageClient::new(supabase)?),
            ),
            None => {
                tracing::warn!("SUPABASE_URL not set, demo sign-in enabled and uploads disabled");
                (Authenticator::Demo, None)
            }
        };

        let email = match &config.email {
            Some(email) => Some(
                EmailService::new(email)
                    .map_err(|e| AppError::Internal(format!("SMTP setup failed: {e}")))?,
            ),
            None => {
                tracing::warn!("SMTP_HOST not set, payment reminders are only logged");
                None
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                data,
                auth,
                storage,
                email,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn data(&self) -> &Datastore {
        &self.inner.data
    }

    #[must_use]
    pub fn auth(&self) -> &Authenticator {
        &self.inner.auth
    }

    /// Storage client, `None` when Supabase is not configured.
    #[must_use]
    pub fn storage(&self) -> Option<&StorageClient> {
        self.inner.storage.as_ref()
    }

    /// Bucket gallery uploads go to.
    #[must_use]
    pub fn storage_bucket(&self) -> &str {
        self.inner
            .config
            .supabase
            .as_ref()
            .map_or(summer_camp_data::supabase::DEFAULT_STORAGE_BUCKET, |s| {
                s.storage_bucket.as_str()
            })
    }

    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
