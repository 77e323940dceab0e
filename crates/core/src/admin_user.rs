//! Admin user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AdminRole, AdminUserId, Email};

/// A row of the `admin_users` role lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    /// Email of the admin who sent the invite, `None` for bootstrap users.
    pub created_by: Option<Email>,
}

/// Data for inviting a new admin user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminUser {
    pub email: Email,
    pub role: AdminRole,
    pub created_by: Option<Email>,
}

/// Reasons an admin management action is refused.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum AdminPermissionError {
    /// The acting user is not allowed to manage admin users.
    #[error("only admins can manage admin users")]
    NotAllowed,
    /// Admins cannot delete or demote themselves.
    #[error("you cannot change your own account")]
    SelfModification,
}

/// Check whether `actor` may change or remove `target`.
///
/// # Errors
///
/// Returns [`AdminPermissionError::NotAllowed`] when the actor is a
/// sub-admin and [`AdminPermissionError::SelfModification`] when the actor
/// targets their own account.
pub fn check_can_modify(
    actor_id: AdminUserId,
    actor_role: AdminRole,
    target_id: AdminUserId,
) -> Result<(), AdminPermissionError> {
    if !actor_role.can_manage_admins() {
        return Err(AdminPermissionError::NotAllowed);
    }
    if actor_id == target_id {
        return Err(AdminPermissionError::SelfModification);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subadmin_cannot_modify() {
        assert_eq!(
            check_can_modify(AdminUserId::new(1), AdminRole::Subadmin, AdminUserId::new(2)),
            Err(AdminPermissionError::NotAllowed)
        );
    }

    #[test]
    fn test_admin_cannot_modify_self() {
        assert_eq!(
            check_can_modify(AdminUserId::new(1), AdminRole::Admin, AdminUserId::new(1)),
            Err(AdminPermissionError::SelfModification)
        );
    }

    #[test]
    fn test_admin_can_modify_other() {
        assert_eq!(
            check_can_modify(AdminUserId::new(1), AdminRole::Admin, AdminUserId::new(2)),
            Ok(())
        );
    }
}
