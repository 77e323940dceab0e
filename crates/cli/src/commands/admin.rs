//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Bootstrap the first admin
//! camp-cli admin create -e admin@example.com -r admin
//! ```
//!
//! The row only grants a role. The person still needs a Supabase Auth
//! account with the same e-mail, e.g. through an invite from the dashboard.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use secrecy::SecretString;
use thiserror::Error;

use summer_camp_core::{AdminRole, AdminUserId, Email, NewAdminUser};
use summer_camp_data::{Datastore, RepositoryError};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, subadmin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// User already exists.
    #[error("Admin user already exists with email: {0}")]
    UserExists(String),
}

/// Validate the arguments before touching the database.
fn parse_args(email: &str, role: &str) -> Result<(Email, AdminRole), AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    Ok((email, role))
}

/// Insert the row through any datastore.
async fn insert(
    data: &Datastore,
    email: Email,
    role: AdminRole,
) -> Result<AdminUserId, AdminError> {
    let display = email.to_string();
    let user = data
        .admin_users
        .create(NewAdminUser {
            email,
            role,
            created_by: None,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(display),
            other => AdminError::Repository(other),
        })?;
    Ok(user.id)
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `role` - Admin's role (`admin` or `subadmin`)
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(email: &str, role: &str) -> Result<AdminUserId, AdminError> {
    dotenvy::dotenv().ok();

    let (email, role) = parse_args(email, role)?;

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| AdminError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = summer_camp_data::create_pool(&database_url).await?;
    let data = Datastore::postgres(pool);

    tracing::info!("Creating admin user: {} ({})", email, role);
    let id = insert(&data, email.clone(), role).await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        id,
        email,
        role
    );
    tracing::warn!(
        "Note: {email} also needs a Supabase Auth account. \
         Invite them from the dashboard if they have none."
    );

    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use summer_camp_data::mock::data::DEMO_ADMIN_EMAIL;

    use super::*;

    #[test]
    fn test_parse_args_validates_role_and_email() {
        let (email, role) = parse_args("Coach@Example.com", "subadmin").unwrap();
        assert_eq!(email.as_str(), "coach@example.com");
        assert_eq!(role, AdminRole::Subadmin);

        assert!(matches!(
            parse_args("coach@example.com", "super_admin"),
            Err(AdminError::InvalidRole(_))
        ));
        assert!(matches!(
            parse_args("not-an-email", "admin"),
            Err(AdminError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_reports_existing_user() {
        let data = Datastore::demo();

        let (email, role) = parse_args("coach@example.com", "admin").unwrap();
        let id = insert(&data, email, role).await.unwrap();
        let user = data.admin_users.get(id).await.unwrap().unwrap();
        assert!(user.created_by.is_none());

        let (email, role) = parse_args(DEMO_ADMIN_EMAIL, "admin").unwrap();
        let err = insert(&data, email, role).await.unwrap_err();
        assert!(matches!(err, AdminError::UserExists(_)));
    }
}
