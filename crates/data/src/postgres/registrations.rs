//! `registrations` table.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use summer_camp_core::{NewRegistration, Registration, RegistrationId, RegistrationStatus};

use super::{PgStore, parse_column};
use crate::RepositoryError;
use crate::repository::{RecordedPayment, RegistrationRepository};

macro_rules! registration_columns {
    () => {
        "id, camper_first_name, camper_last_name, camper_birth_date, camper_birth_place, \
         camper_fiscal_code, camper_gender, shirt_size, experience, club, allergies, \
         medical_notes, parent_first_name, parent_last_name, parent_email, parent_phone, \
         parent_fiscal_code, address, city, postal_code, emergency_name, emergency_phone, \
         emergency_relationship, package, payment_option, privacy_consent, \
         regulations_consent, photo_consent, status, payment_status, amount_paid, \
         stripe_session_id, paid_session_ids, reminder_sent_at, notes, created_at, updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: Uuid,
    camper_first_name: String,
    camper_last_name: String,
    camper_birth_date: NaiveDate,
    camper_birth_place: String,
    camper_fiscal_code: String,
    camper_gender: String,
    shirt_size: String,
    experience: String,
    club: Option<String>,
    allergies: Option<String>,
    medical_notes: Option<String>,
    parent_first_name: String,
    parent_last_name: String,
    parent_email: String,
    parent_phone: String,
    parent_fiscal_code: String,
    address: String,
    city: String,
    postal_code: String,
    emergency_name: String,
    emergency_phone: String,
    emergency_relationship: String,
    package: String,
    payment_option: String,
    privacy_consent: bool,
    regulations_consent: bool,
    photo_consent: bool,
    status: String,
    payment_status: String,
    amount_paid: Decimal,
    stripe_session_id: Option<String>,
    paid_session_ids: Vec<String>,
    reminder_sent_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = RepositoryError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RegistrationId::from_uuid(row.id),
            camper_first_name: row.camper_first_name,
            camper_last_name: row.camper_last_name,
            camper_birth_date: row.camper_birth_date,
            camper_birth_place: row.camper_birth_place,
            camper_fiscal_code: parse_column("camper_fiscal_code", &row.camper_fiscal_code)?,
            camper_gender: parse_column("camper_gender", &row.camper_gender)?,
            shirt_size: parse_column("shirt_size", &row.shirt_size)?,
            experience: parse_column("experience", &row.experience)?,
            club: row.club,
            allergies: row.allergies,
            medical_notes: row.medical_notes,
            parent_first_name: row.parent_first_name,
            parent_last_name: row.parent_last_name,
            parent_email: parse_column("parent_email", &row.parent_email)?,
            parent_phone: parse_column("parent_phone", &row.parent_phone)?,
            parent_fiscal_code: parse_column("parent_fiscal_code", &row.parent_fiscal_code)?,
            address: row.address,
            city: row.city,
            postal_code: row.postal_code,
            emergency_name: row.emergency_name,
            emergency_phone: parse_column("emergency_phone", &row.emergency_phone)?,
            emergency_relationship: row.emergency_relationship,
            package: parse_column("package", &row.package)?,
            payment_option: parse_column("payment_option", &row.payment_option)?,
            privacy_consent: row.privacy_consent,
            regulations_consent: row.regulations_consent,
            photo_consent: row.photo_consent,
            status: parse_column("status", &row.status)?,
            payment_status: parse_column("payment_status", &row.payment_status)?,
            amount_paid: row.amount_paid,
            stripe_session_id: row.stripe_session_id,
            paid_session_ids: row.paid_session_ids,
            reminder_sent_at: row.reminder_sent_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

impl PgStore {
    async fn fetch_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<Registration>, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            "SELECT ",
            registration_columns!(),
            " FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl RegistrationRepository for PgStore {
    async fn list(&self) -> Result<Vec<Registration>, RepositoryError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(concat!(
            "SELECT ",
            registration_columns!(),
            " FROM registrations ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        self.fetch_registration(id).await
    }

    async fn create(&self, new: NewRegistration) -> Result<Registration, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            r"
            INSERT INTO registrations (
                id, camper_first_name, camper_last_name, camper_birth_date, camper_birth_place,
                camper_fiscal_code, camper_gender, shirt_size, experience, club, allergies,
                medical_notes, parent_first_name, parent_last_name, parent_email, parent_phone,
                parent_fiscal_code, address, city, postal_code, emergency_name, emergency_phone,
                emergency_relationship, package, payment_option, privacy_consent,
                regulations_consent, photo_consent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
            RETURNING ",
            registration_columns!()
        ))
        .bind(RegistrationId::generate())
        .bind(&new.camper_first_name)
        .bind(&new.camper_last_name)
        .bind(new.camper_birth_date)
        .bind(&new.camper_birth_place)
        .bind(new.camper_fiscal_code.as_str())
        .bind(new.camper_gender.as_str())
        .bind(new.shirt_size.as_str())
        .bind(new.experience.as_str())
        .bind(&new.club)
        .bind(&new.allergies)
        .bind(&new.medical_notes)
        .bind(&new.parent_first_name)
        .bind(&new.parent_last_name)
        .bind(new.parent_email.as_str())
        .bind(new.parent_phone.as_str())
        .bind(new.parent_fiscal_code.as_str())
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.postal_code)
        .bind(&new.emergency_name)
        .bind(new.emergency_phone.as_str())
        .bind(&new.emergency_relationship)
        .bind(new.package.as_str())
        .bind(new.payment_option.as_str())
        .bind(new.privacy_consent)
        .bind(new.regulations_consent)
        .bind(new.photo_consent)
        .fetch_one(self.pool())
        .await?;

        row.try_into()
    }

    async fn update_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> Result<Registration, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            "UPDATE registrations SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING ",
            registration_columns!()
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn update_notes(
        &self,
        id: RegistrationId,
        notes: Option<String>,
    ) -> Result<Registration, RepositoryError> {
        let notes = notes.filter(|n| !n.trim().is_empty());
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            "UPDATE registrations SET notes = $2, updated_at = NOW() WHERE id = $1 RETURNING ",
            registration_columns!()
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn record_payment(
        &self,
        id: RegistrationId,
        amount: Decimal,
        session_id: Option<&str>,
    ) -> Result<RecordedPayment, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Lock the row so concurrent webhook deliveries apply one at a time
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            "SELECT ",
            registration_columns!(),
            " FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut registration: Registration = row.try_into()?;
        let applied = registration.record_payment(amount, session_id, Utc::now())?;
        if !applied {
            tx.rollback().await?;
            return Ok(RecordedPayment {
                registration,
                applied,
            });
        }

        sqlx::query(
            r"
            UPDATE registrations
            SET amount_paid = $2, payment_status = $3, status = $4,
                paid_session_ids = $5, updated_at = $6
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(registration.amount_paid)
        .bind(registration.payment_status.as_str())
        .bind(registration.status.as_str())
        .bind(&registration.paid_session_ids)
        .bind(registration.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RecordedPayment {
            registration,
            applied,
        })
    }

    async fn set_checkout_session(
        &self,
        id: RegistrationId,
        session_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE registrations SET stripe_session_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(session_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_reminder_sent(
        &self,
        id: RegistrationId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            "UPDATE registrations SET reminder_sent_at = $2, updated_at = $2 \
             WHERE id = $1 RETURNING ",
            registration_columns!()
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete(&self, id: RegistrationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Registration>, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(concat!(
            "SELECT ",
            registration_columns!(),
            " FROM registrations \
             WHERE stripe_session_id = $1 OR paid_session_ids @> ARRAY[$1]::text[] LIMIT 1"
        ))
        .bind(session_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
