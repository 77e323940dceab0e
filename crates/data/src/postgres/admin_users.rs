//! `admin_users` role lookup table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use summer_camp_core::{AdminRole, AdminUser, AdminUserId, Email, NewAdminUser};

use super::{PgStore, parse_column};
use crate::RepositoryError;
use crate::repository::AdminUserRepository;

const ADMIN_COLUMNS: &str = "id, email, role, created_at, created_by";

#[derive(Debug, FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: parse_column("email", &row.email)?,
            role: parse_column("role", &row.role)?,
            created_at: row.created_at,
            created_by: row
                .created_by
                .as_deref()
                .map(|e| parse_column("created_by", e))
                .transpose()?,
        })
    }
}

#[async_trait]
impl AdminUserRepository for PgStore {
    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users ORDER BY created_at, id"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "INSERT INTO admin_users (email, role, created_by) VALUES ($1, $2, $3) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(new.email.as_str())
        .bind(new.role.as_str())
        .bind(new.created_by.as_ref().map(Email::as_str))
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email already exists"))?;

        row.try_into()
    }

    async fn update_role(
        &self,
        id: AdminUserId,
        role: AdminRole,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "UPDATE admin_users SET role = $2 WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
