//! `contact_submissions` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use summer_camp_core::{ContactSubmission, ContactSubmissionId, NewContactSubmission, PhoneNumber};

use super::{PgStore, parse_column, sql_limit};
use crate::RepositoryError;
use crate::repository::ContactRepository;

const CONTACT_COLUMNS: &str = "id, name, email, phone, message, created_at";

#[derive(Debug, FromRow)]
struct ContactRow {
    id: ContactSubmissionId,
    name: String,
    email: String,
    phone: Option<String>,
    message: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for ContactSubmission {
    type Error = RepositoryError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: parse_column("email", &row.email)?,
            phone: row
                .phone
                .as_deref()
                .map(|p| parse_column::<PhoneNumber>("phone", p))
                .transpose()?,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ContactRepository for PgStore {
    async fn create(
        &self,
        new: NewContactSubmission,
    ) -> Result<ContactSubmission, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "INSERT INTO contact_submissions (name, email, phone, message) \
             VALUES ($1, $2, $3, $4) RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.email.as_str())
        .bind(new.phone.as_ref().map(PhoneNumber::as_str))
        .bind(&new.message)
        .fetch_one(self.pool())
        .await?;

        row.try_into()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ContactSubmission>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_submissions \
             ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
