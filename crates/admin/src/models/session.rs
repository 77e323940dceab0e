//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use summer_camp_core::{AdminRole, AdminUser, AdminUserId, Email};

/// Session-stored admin identity.
///
/// Copied from the `admin_users` row at sign-in; role changes take effect
/// on the next sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: Email,
    pub role: AdminRole,
}

impl CurrentAdmin {
    #[must_use]
    pub const fn is_full_admin(&self) -> bool {
        self.role.can_manage_admins()
    }
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// `success` or `error`, used as a CSS class.
    pub kind: String,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success".to_string(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Session keys for admin data.
pub mod keys {
    /// The signed-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Pending [`super::Flash`] message.
    pub const FLASH: &str = "flash";
}
