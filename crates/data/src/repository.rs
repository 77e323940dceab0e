//! Repository traits shared by the Postgres and in-memory stores.
//!
//! Every method is async so handlers can hold an `Arc<dyn Trait>` without
//! knowing which backend is behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use summer_camp_core::{
    AdminRole, AdminUser, AdminUserId, CollectionId, ContactSubmission, Email, GalleryCollection,
    GalleryPhoto, NewAdminUser, NewCollection, NewContactSubmission, NewPhoto, NewRegistration,
    PhotoId, Registration, RegistrationId, RegistrationStatus,
};

use crate::RepositoryError;

/// Result of recording a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPayment {
    pub registration: Registration,
    /// `false` when the checkout session had already been recorded.
    pub applied: bool,
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// All registrations, newest first.
    async fn list(&self) -> Result<Vec<Registration>, RepositoryError>;

    async fn get(&self, id: RegistrationId) -> Result<Option<Registration>, RepositoryError>;

    /// Store a new pending, unpaid registration.
    async fn create(&self, new: NewRegistration) -> Result<Registration, RepositoryError>;

    async fn update_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> Result<Registration, RepositoryError>;

    /// Replace admin notes; `None` or blank clears them.
    async fn update_notes(
        &self,
        id: RegistrationId,
        notes: Option<String>,
    ) -> Result<Registration, RepositoryError>;

    /// Add a payment, idempotent per checkout session.
    ///
    /// Returns `RepositoryError::Rejected` for negative amounts.
    async fn record_payment(
        &self,
        id: RegistrationId,
        amount: Decimal,
        session_id: Option<&str>,
    ) -> Result<RecordedPayment, RepositoryError>;

    /// Remember (or clear) the checkout session currently open for a
    /// registration.
    async fn set_checkout_session(
        &self,
        id: RegistrationId,
        session_id: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn mark_reminder_sent(
        &self,
        id: RegistrationId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RepositoryError>;

    async fn delete(&self, id: RegistrationId) -> Result<(), RepositoryError>;

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Registration>, RepositoryError>;
}

#[async_trait]
pub trait GalleryRepository: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<GalleryCollection>, RepositoryError>;

    async fn get_collection_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<GalleryCollection>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the slug is taken.
    async fn create_collection(
        &self,
        new: NewCollection,
    ) -> Result<GalleryCollection, RepositoryError>;

    async fn list_photos(&self) -> Result<Vec<GalleryPhoto>, RepositoryError>;

    /// Photos of one collection ordered by `sort_order`.
    async fn list_photos_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<GalleryPhoto>, RepositoryError>;

    /// Featured photos ordered by `sort_order`, at most `limit`.
    async fn featured_photos(&self, limit: usize) -> Result<Vec<GalleryPhoto>, RepositoryError>;

    async fn create_photo(&self, new: NewPhoto) -> Result<GalleryPhoto, RepositoryError>;

    async fn set_featured(
        &self,
        id: PhotoId,
        featured: bool,
    ) -> Result<GalleryPhoto, RepositoryError>;

    /// Delete a photo row, returning it so the caller can remove the file.
    async fn delete_photo(&self, id: PhotoId) -> Result<GalleryPhoto, RepositoryError>;

    /// One past the highest `sort_order` in a collection (0 when empty).
    async fn next_sort_order(
        &self,
        collection_id: Option<CollectionId>,
    ) -> Result<i32, RepositoryError>;
}

#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    /// All admin users, oldest first.
    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError>;

    async fn get(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the email already exists.
    async fn create(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError>;

    async fn update_role(
        &self,
        id: AdminUserId,
        role: AdminRole,
    ) -> Result<AdminUser, RepositoryError>;

    async fn delete(&self, id: AdminUserId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(
        &self,
        new: NewContactSubmission,
    ) -> Result<ContactSubmission, RepositoryError>;

    /// Newest submissions first, at most `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ContactSubmission>, RepositoryError>;
}
