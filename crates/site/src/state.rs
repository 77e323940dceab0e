//! Application state shared across handlers.

use std::sync::Arc;

use summer_camp_data::Datastore;

use crate::config::SiteConfig;
use crate::content::ContentStore;
use crate::payments::{PaymentError, PaymentGateway, StripeClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    data: Datastore,
    payments: PaymentGateway,
    content: ContentStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Uses Stripe when it is configured, simulated payments otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe HTTP client cannot be built.
    pub fn new(
        config: SiteConfig,
        data: Datastore,
        content: ContentStore,
    ) -> Result<Self, PaymentError> {
        let payments = match &config.stripe {
            Some(stripe) => PaymentGateway::Stripe(StripeClient::new(stripe.clone())?),
            None => {
                tracing::warn!("STRIPE_SECRET_KEY not set, payments are simulated");
                PaymentGateway::Demo
            }
        };

        Ok(Self::with_gateway(config, data, content, payments))
    }

    /// Create state with an explicit payment gateway.
    #[must_use]
    pub fn with_gateway(
        config: SiteConfig,
        data: Datastore,
        content: ContentStore,
        payments: PaymentGateway,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                data,
                payments,
                content,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn data(&self) -> &Datastore {
        &self.inner.data
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentGateway {
        &self.inner.payments
    }

    /// Get a reference to the markdown content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }
}
