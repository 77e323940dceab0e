//! In-memory repositories for demo mode.
//!
//! All tables live behind a single `tokio::sync::RwLock`, seeded from
//! [`data`]. Writes are kept for the lifetime of the process so the demo
//! flows (registration, checkout, admin edits) behave like the real thing.

pub mod data;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use summer_camp_core::{
    AdminRole, AdminUser, AdminUserId, CollectionId, ContactSubmission, ContactSubmissionId, Email,
    GalleryCollection, GalleryPhoto, NewAdminUser, NewCollection, NewContactSubmission, NewPhoto,
    NewRegistration, PhotoId, Registration, RegistrationId, RegistrationStatus,
};

use crate::RepositoryError;
use crate::repository::{
    AdminUserRepository, ContactRepository, GalleryRepository, RecordedPayment,
    RegistrationRepository,
};

#[derive(Debug, Default)]
struct Tables {
    registrations: Vec<Registration>,
    collections: Vec<GalleryCollection>,
    photos: Vec<GalleryPhoto>,
    admin_users: Vec<AdminUser>,
    contacts: Vec<ContactSubmission>,
}

impl Tables {
    fn registration_mut(
        &mut self,
        id: RegistrationId,
    ) -> Result<&mut Registration, RepositoryError> {
        self.registrations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn photo_mut(&mut self, id: PhotoId) -> Result<&mut GalleryPhoto, RepositoryError> {
        self.photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn admin_mut(&mut self, id: AdminUserId) -> Result<&mut AdminUser, RepositoryError> {
        self.admin_users
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)
    }
}

/// Next serial ID for a table.
fn next_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().unwrap_or(0) + 1
}

/// In-memory store implementing every repository trait.
#[derive(Debug, Default)]
pub struct MockStore {
    tables: RwLock<Tables>,
}

impl MockStore {
    /// An empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store holding the demo dataset.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            tables: RwLock::new(Tables {
                registrations: data::registrations(),
                collections: data::collections(),
                photos: data::photos(),
                admin_users: data::admin_users(),
                contacts: data::contact_submissions(),
            }),
        }
    }
}

#[async_trait]
impl RegistrationRepository for MockStore {
    async fn list(&self) -> Result<Vec<Registration>, RepositoryError> {
        let mut rows = self.tables.read().await.registrations.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, id: RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.registrations.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, new: NewRegistration) -> Result<Registration, RepositoryError> {
        let registration = Registration::from_new(RegistrationId::generate(), new, Utc::now());
        self.tables
            .write()
            .await
            .registrations
            .push(registration.clone());
        Ok(registration)
    }

    async fn update_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> Result<Registration, RepositoryError> {
        let mut tables = self.tables.write().await;
        let registration = tables.registration_mut(id)?;
        registration.status = status;
        registration.updated_at = Utc::now();
        Ok(registration.clone())
    }

    async fn update_notes(
        &self,
        id: RegistrationId,
        notes: Option<String>,
    ) -> Result<Registration, RepositoryError> {
        let mut tables = self.tables.write().await;
        let registration = tables.registration_mut(id)?;
        registration.notes = notes.filter(|n| !n.trim().is_empty());
        registration.updated_at = Utc::now();
        Ok(registration.clone())
    }

    async fn record_payment(
        &self,
        id: RegistrationId,
        amount: Decimal,
        session_id: Option<&str>,
    ) -> Result<RecordedPayment, RepositoryError> {
        let mut tables = self.tables.write().await;
        let registration = tables.registration_mut(id)?;
        let applied = registration.record_payment(amount, session_id, Utc::now())?;
        Ok(RecordedPayment {
            registration: registration.clone(),
            applied,
        })
    }

    async fn set_checkout_session(
        &self,
        id: RegistrationId,
        session_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let registration = tables.registration_mut(id)?;
        registration.stripe_session_id = session_id.map(ToString::to_string);
        registration.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_reminder_sent(
        &self,
        id: RegistrationId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RepositoryError> {
        let mut tables = self.tables.write().await;
        let registration = tables.registration_mut(id)?;
        registration.reminder_sent_at = Some(at);
        registration.updated_at = at;
        Ok(registration.clone())
    }

    async fn delete(&self, id: RegistrationId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.registrations.len();
        tables.registrations.retain(|r| r.id != id);
        if tables.registrations.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Registration>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .find(|r| {
                r.stripe_session_id.as_deref() == Some(session_id)
                    || r.paid_session_ids.iter().any(|id| id == session_id)
            })
            .cloned())
    }
}

#[async_trait]
impl GalleryRepository for MockStore {
    async fn list_collections(&self) -> Result<Vec<GalleryCollection>, RepositoryError> {
        let mut rows = self.tables.read().await.collections.clone();
        rows.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn get_collection_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<GalleryCollection>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.collections.iter().find(|c| c.slug == slug).cloned())
    }

    async fn create_collection(
        &self,
        new: NewCollection,
    ) -> Result<GalleryCollection, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.collections.iter().any(|c| c.slug == new.slug) {
            return Err(RepositoryError::Conflict("slug already exists".to_owned()));
        }

        let collection = GalleryCollection {
            id: CollectionId::new(next_id(tables.collections.iter().map(|c| c.id.as_i32()))),
            name: new.name,
            slug: new.slug,
            year: new.year,
            collection_type: new.collection_type,
            description: new.description,
            created_at: Utc::now(),
        };
        tables.collections.push(collection.clone());
        Ok(collection)
    }

    async fn list_photos(&self) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        let mut rows = self.tables.read().await.photos.clone();
        rows.sort_by_key(|p| (p.collection_id, p.sort_order, p.id));
        Ok(rows)
    }

    async fn list_photos_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(summer_camp_core::gallery::photos_in_collection(
            &tables.photos,
            collection_id,
        ))
    }

    async fn featured_photos(&self, limit: usize) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<GalleryPhoto> =
            tables.photos.iter().filter(|p| p.featured).cloned().collect();
        rows.sort_by_key(|p| (p.sort_order, p.id));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn create_photo(&self, new: NewPhoto) -> Result<GalleryPhoto, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(collection_id) = new.collection_id
            && !tables.collections.iter().any(|c| c.id == collection_id)
        {
            return Err(RepositoryError::NotFound);
        }

        let photo = GalleryPhoto {
            id: PhotoId::new(next_id(tables.photos.iter().map(|p| p.id.as_i32()))),
            collection_id: new.collection_id,
            url: new.url,
            alt_text: new.alt_text,
            category: new.category,
            year: new.year,
            sort_order: new.sort_order,
            featured: new.featured,
            created_at: Utc::now(),
        };
        tables.photos.push(photo.clone());
        Ok(photo)
    }

    async fn set_featured(
        &self,
        id: PhotoId,
        featured: bool,
    ) -> Result<GalleryPhoto, RepositoryError> {
        let mut tables = self.tables.write().await;
        let photo = tables.photo_mut(id)?;
        photo.featured = featured;
        Ok(photo.clone())
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<GalleryPhoto, RepositoryError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .photos
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(tables.photos.remove(index))
    }

    async fn next_sort_order(
        &self,
        collection_id: Option<CollectionId>,
    ) -> Result<i32, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .photos
            .iter()
            .filter(|p| p.collection_id == collection_id)
            .map(|p| p.sort_order + 1)
            .max()
            .unwrap_or(0))
    }
}

#[async_trait]
impl AdminUserRepository for MockStore {
    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let mut rows = self.tables.read().await.admin_users.clone();
        rows.sort_by_key(|a| (a.created_at, a.id));
        Ok(rows)
    }

    async fn get(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.admin_users.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .admin_users
            .iter()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn create(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.admin_users.iter().any(|a| a.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let admin = AdminUser {
            id: AdminUserId::new(next_id(tables.admin_users.iter().map(|a| a.id.as_i32()))),
            email: new.email,
            role: new.role,
            created_at: Utc::now(),
            created_by: new.created_by,
        };
        tables.admin_users.push(admin.clone());
        Ok(admin)
    }

    async fn update_role(
        &self,
        id: AdminUserId,
        role: AdminRole,
    ) -> Result<AdminUser, RepositoryError> {
        let mut tables = self.tables.write().await;
        let admin = tables.admin_mut(id)?;
        admin.role = role;
        Ok(admin.clone())
    }

    async fn delete(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.admin_users.len();
        tables.admin_users.retain(|a| a.id != id);
        if tables.admin_users.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for MockStore {
    async fn create(
        &self,
        new: NewContactSubmission,
    ) -> Result<ContactSubmission, RepositoryError> {
        let mut tables = self.tables.write().await;
        let submission = ContactSubmission {
            id: ContactSubmissionId::new(next_id(tables.contacts.iter().map(|c| c.id.as_i32()))),
            name: new.name,
            email: new.email,
            phone: new.phone,
            message: new.message,
            created_at: Utc::now(),
        };
        tables.contacts.push(submission.clone());
        Ok(submission)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ContactSubmission>, RepositoryError> {
        let mut rows = self.tables.read().await.contacts.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use summer_camp_core::gallery::summarize_collections;
    use summer_camp_core::{CollectionType, PaymentStatus};

    use super::*;

    fn registrations(store: &MockStore) -> &dyn RegistrationRepository {
        store
    }

    fn gallery(store: &MockStore) -> &dyn GalleryRepository {
        store
    }

    fn admins(store: &MockStore) -> &dyn AdminUserRepository {
        store
    }

    fn contacts(store: &MockStore) -> &dyn ContactRepository {
        store
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MockStore::seeded();
        let rows = registrations(&store).list().await.unwrap();
        assert_eq!(rows.len(), 8);
        assert!(rows.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_payment_flow_is_idempotent() {
        let store = MockStore::seeded();
        let repo = registrations(&store);
        let pending = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.status == RegistrationStatus::Pending)
            .unwrap();

        repo.set_checkout_session(pending.id, Some("cs_test_1"))
            .await
            .unwrap();
        let found = repo.find_by_checkout_session("cs_test_1").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(pending.id));

        let amount = pending.next_checkout_amount();
        let first = repo
            .record_payment(pending.id, amount, Some("cs_test_1"))
            .await
            .unwrap();
        assert!(first.applied);
        assert_eq!(first.registration.status, RegistrationStatus::Confirmed);
        assert_ne!(first.registration.payment_status, PaymentStatus::Unpaid);

        let replay = repo
            .record_payment(pending.id, amount, Some("cs_test_1"))
            .await
            .unwrap();
        assert!(!replay.applied);
        assert_eq!(replay.registration.amount_paid, amount);
    }

    #[tokio::test]
    async fn test_deposit_session_replayed_after_balance() {
        let store = MockStore::seeded();
        let repo = registrations(&store);
        let luca = repo
            .find_by_checkout_session("cs_demo_luca")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(luca.amount_paid, Decimal::new(150, 0));

        let balance = repo
            .record_payment(luca.id, Decimal::new(240, 0), Some("cs_luca_balance"))
            .await
            .unwrap();
        assert!(balance.applied);
        assert_eq!(balance.registration.payment_status, PaymentStatus::Paid);

        let replay = repo
            .record_payment(luca.id, Decimal::new(150, 0), Some("cs_demo_luca"))
            .await
            .unwrap();
        assert!(!replay.applied);
        assert_eq!(replay.registration.amount_paid, Decimal::new(390, 0));

        // Both sessions still resolve to the registration
        for session in ["cs_demo_luca", "cs_luca_balance"] {
            let found = repo.find_by_checkout_session(session).await.unwrap();
            assert_eq!(found.map(|r| r.id), Some(luca.id));
        }
    }

    #[tokio::test]
    async fn test_negative_payment_is_rejected() {
        let store = MockStore::seeded();
        let repo = registrations(&store);
        let id = repo.list().await.unwrap()[0].id;
        let err = repo
            .record_payment(id, Decimal::new(-5, 0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_notes_and_delete() {
        let store = MockStore::seeded();
        let repo = registrations(&store);
        let id = repo.list().await.unwrap()[0].id;

        let updated = repo
            .update_notes(id, Some("  ".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.notes, None);

        repo.delete(id).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_gallery_writes() {
        let store = MockStore::seeded();
        let repo = gallery(&store);

        let collection = repo
            .create_collection(NewCollection::from_name("Camp 2026"))
            .await
            .unwrap();
        assert_eq!(collection.collection_type, CollectionType::Camp);
        assert!(matches!(
            repo.create_collection(NewCollection::from_name("camp 2026"))
                .await,
            Err(RepositoryError::Conflict(_))
        ));

        for expected in 0..3 {
            let sort_order = repo.next_sort_order(Some(collection.id)).await.unwrap();
            assert_eq!(sort_order, expected);
            repo.create_photo(NewPhoto {
                collection_id: Some(collection.id),
                url: format!("https://cdn.example.com/{expected}.jpg"),
                alt_text: String::new(),
                category: None,
                year: Some(2026),
                sort_order,
                featured: false,
            })
            .await
            .unwrap();
        }

        let collections = repo.list_collections().await.unwrap();
        let photos = repo.list_photos().await.unwrap();
        let summaries = summarize_collections(&collections, &photos);
        let new = summaries
            .iter()
            .find(|s| s.collection.id == collection.id)
            .unwrap();
        assert_eq!(new.photo_count, 3);

        let photo_id = repo.list_photos_in_collection(collection.id).await.unwrap()[0].id;
        assert!(repo.set_featured(photo_id, true).await.unwrap().featured);
        assert!(
            repo.featured_photos(50)
                .await
                .unwrap()
                .iter()
                .any(|p| p.id == photo_id)
        );
        repo.delete_photo(photo_id).await.unwrap();
        assert!(matches!(
            repo.set_featured(photo_id, false).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_photo_requires_existing_collection() {
        let store = MockStore::seeded();
        let result = gallery(&store)
            .create_photo(NewPhoto {
                collection_id: Some(CollectionId::new(999)),
                url: "https://cdn.example.com/x.jpg".to_string(),
                alt_text: String::new(),
                category: None,
                year: None,
                sort_order: 0,
                featured: false,
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_admin_users() {
        let store = MockStore::seeded();
        let repo = admins(&store);
        let email = Email::parse("coach@summercamp.example").unwrap();

        let created = repo
            .create(NewAdminUser {
                email: email.clone(),
                role: AdminRole::Subadmin,
                created_by: None,
            })
            .await
            .unwrap();
        assert_eq!(repo.get_by_email(&email).await.unwrap(), Some(created.clone()));
        assert!(matches!(
            repo.create(NewAdminUser {
                email,
                role: AdminRole::Admin,
                created_by: None,
            })
            .await,
            Err(RepositoryError::Conflict(_))
        ));

        let promoted = repo.update_role(created.id, AdminRole::Admin).await.unwrap();
        assert_eq!(promoted.role, AdminRole::Admin);
        repo.delete(created.id).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_contacts_newest_first() {
        let store = MockStore::empty();
        let repo = contacts(&store);
        for name in ["First", "Second"] {
            repo.create(NewContactSubmission {
                name: name.to_string(),
                email: Email::parse("parent@example.com").unwrap(),
                phone: None,
                message: "Hello".to_string(),
            })
            .await
            .unwrap();
        }
        let recent = repo.list_recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, ContactSubmissionId::new(2));
    }
}
