/*!
 * Authorization Matrix
 *
 * A static role → resource → action membership table. This is
 * deliberately NOT a general-purpose policy engine: no nested tables, no
 * dynamic rule loading, just one pure function the compiler can check
 * exhaustively. Casbin-style dynamic policy loading was considered and
 * dropped in favor of this.
 */

use serde::{Deserialize, Serialize};

use crate::models::UserRole;
use crate::utils::{AppError, Result};

/// A protected resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Users,
    Customers,
    Products,
    Orders,
    Sales,
    Analytics,
    Audit,
    Qr,
    Inventory,
    Suppliers,
    Services,
}

/// An action that can be performed on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Refund,
    Scan,
}

/// Pure lookup: does `role` have `action` on `resource`?
///
/// - admin: every resource, every action.
/// - manager: everything except `users:create`, `users:delete`, `audit:read`.
/// - pharmacist: the narrow working set a dispensing pharmacist needs.
/// - assistant: read-only, plus `orders:create` and `qr:scan`.
pub fn has_permission(role: UserRole, resource: Resource, action: Action) -> bool {
    use Action::*;
    use Resource::*;

    match role {
        UserRole::Admin => true,

        UserRole::Manager => !matches!(
            (resource, action),
            (Users, Create) | (Users, Delete) | (Audit, Read)
        ),

        UserRole::Pharmacist => matches!(
            (resource, action),
            (Customers, Create)
                | (Customers, Read)
                | (Customers, Update)
                | (Products, Read)
                | (Products, Update)
                | (Sales, Create)
                | (Sales, Read)
                | (Qr, Read)
                | (Qr, Scan)
                | (Inventory, Read)
                | (Inventory, Update)
        ),

        UserRole::Assistant => {
            action == Read || matches!((resource, action), (Orders, Create) | (Qr, Scan))
        }
    }
}

/// Sugar for `role == admin`, used where a route is administratively gated
/// rather than resource/action-gated (e.g. `GET /audit/logs`).
pub fn is_admin(role: UserRole) -> bool {
    role == UserRole::Admin
}

/// The per-route permission check, called as the first
/// line of every protected handler after authentication has populated
/// `AuthUser`.
pub fn ensure_permission(role: UserRole, resource: Resource, action: Action) -> Result<()> {
    if has_permission(role, resource, action) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Sugar for admin-only routes.
pub fn ensure_admin(role: UserRole) -> Result<()> {
    if is_admin(role) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        assert!(has_permission(UserRole::Admin, Resource::Users, Action::Delete));
        assert!(has_permission(UserRole::Admin, Resource::Audit, Action::Read));
        assert!(has_permission(UserRole::Admin, Resource::Qr, Action::Scan));
    }

    #[test]
    fn test_manager_denied_user_create_delete_and_audit_read() {
        assert!(!has_permission(UserRole::Manager, Resource::Users, Action::Create));
        assert!(!has_permission(UserRole::Manager, Resource::Users, Action::Delete));
        assert!(!has_permission(UserRole::Manager, Resource::Audit, Action::Read));
    }

    #[test]
    fn test_manager_allowed_everything_else() {
        assert!(has_permission(UserRole::Manager, Resource::Users, Action::Read));
        assert!(has_permission(UserRole::Manager, Resource::Users, Action::Update));
        assert!(has_permission(UserRole::Manager, Resource::Sales, Action::Refund));
        assert!(has_permission(UserRole::Manager, Resource::Orders, Action::Create));
    }

    #[test]
    fn test_pharmacist_working_set() {
        assert!(has_permission(UserRole::Pharmacist, Resource::Customers, Action::Create));
        assert!(has_permission(UserRole::Pharmacist, Resource::Products, Action::Update));
        assert!(has_permission(UserRole::Pharmacist, Resource::Sales, Action::Create));
        assert!(has_permission(UserRole::Pharmacist, Resource::Qr, Action::Scan));
        assert!(!has_permission(UserRole::Pharmacist, Resource::Customers, Action::Delete));
        assert!(!has_permission(UserRole::Pharmacist, Resource::Users, Action::Read));
        assert!(!has_permission(UserRole::Pharmacist, Resource::Audit, Action::Read));
    }

    #[test]
    fn test_assistant_read_only_plus_extras() {
        assert!(has_permission(UserRole::Assistant, Resource::Products, Action::Read));
        assert!(has_permission(UserRole::Assistant, Resource::Customers, Action::Read));
        assert!(has_permission(UserRole::Assistant, Resource::Orders, Action::Create));
        assert!(has_permission(UserRole::Assistant, Resource::Qr, Action::Scan));
        assert!(!has_permission(UserRole::Assistant, Resource::Products, Action::Update));
        assert!(!has_permission(UserRole::Assistant, Resource::Sales, Action::Create));
    }

    #[test]
    fn test_is_admin() {
        assert!(is_admin(UserRole::Admin));
        assert!(!is_admin(UserRole::Manager));
    }
}
