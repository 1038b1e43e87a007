/// Access-control policy
///
/// This module is the single place where ownership and self-protection
/// rules are decided. Task and admin handlers consult these functions
/// instead of branching on roles inline, so the whole authorization
/// contract is auditable here.
///
/// # Rules
///
/// - Admins may read, update, and delete any task.
/// - Everyone else may only touch tasks they own.
/// - Task creation is unconditionally allowed for authenticated users.
/// - An admin may not demote themself to `user` and may not delete their
///   own account through the admin paths.
/// - Any other admin action on a *different* user is allowed, including
///   demoting another admin. There is no last-admin protection.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::policy::{check_task_access, PolicyError};
/// use taskdeck_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let stranger = Uuid::new_v4();
///
/// assert!(check_task_access(owner, owner, Role::User).is_ok());
/// assert!(check_task_access(owner, stranger, Role::Admin).is_ok());
/// assert!(matches!(
///     check_task_access(owner, stranger, Role::User),
///     Err(PolicyError::NotTaskOwner)
/// ));
/// ```

use uuid::Uuid;

use crate::models::user::Role;

/// Error type for policy denials
///
/// Every variant is an authorization failure: the caller is authenticated
/// but forbidden. The API layer maps these to HTTP 403.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Caller is not the task owner and not an admin
    #[error("You do not have access to this task")]
    NotTaskOwner,

    /// Admin tried to demote their own account
    #[error("Cannot demote yourself")]
    SelfDemotion,

    /// Admin tried to delete their own account
    #[error("Cannot delete yourself")]
    SelfDeletion,
}

/// An intended change to a user record, checked by [`check_user_change`]
///
/// Role values are parsed and validated *before* constructing this, so an
/// unrecognized role never reaches the guard checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChange {
    /// Set the target's role
    SetRole(Role),

    /// Delete the target and cascade their tasks
    Delete,
}

/// Decides whether `caller` may read, update, or delete a task
///
/// Admins are always allowed with no further checks; everyone else is
/// allowed only on tasks they own. The same predicate governs all three
/// operations; create is not guarded at all.
pub fn check_task_access(
    task_owner: Uuid,
    caller_id: Uuid,
    caller_role: Role,
) -> Result<(), PolicyError> {
    if caller_role == Role::Admin {
        return Ok(());
    }

    if task_owner == caller_id {
        Ok(())
    } else {
        Err(PolicyError::NotTaskOwner)
    }
}

/// Decides whether an admin `caller` may apply `change` to `target`
///
/// Self-demotion and self-deletion are rejected; a no-op self-promotion
/// (`SetRole(Admin)` on oneself) passes, as does any change to a
/// different user.
pub fn check_user_change(
    target_id: Uuid,
    caller_id: Uuid,
    change: UserChange,
) -> Result<(), PolicyError> {
    match change {
        UserChange::SetRole(Role::User) if target_id == caller_id => {
            Err(PolicyError::SelfDemotion)
        }
        UserChange::Delete if target_id == caller_id => Err(PolicyError::SelfDeletion),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_can_access_own_task() {
        let owner = Uuid::new_v4();
        assert!(check_task_access(owner, owner, Role::User).is_ok());
    }

    #[test]
    fn test_non_owner_denied_for_any_operation() {
        // One predicate governs read, update, and delete alike.
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        assert_eq!(
            check_task_access(owner, stranger, Role::User),
            Err(PolicyError::NotTaskOwner)
        );
    }

    #[test]
    fn test_admin_always_allowed() {
        let owner = Uuid::new_v4();
        let admin = Uuid::new_v4();

        assert!(check_task_access(owner, admin, Role::Admin).is_ok());
        // Admins accessing their own tasks are also fine
        assert!(check_task_access(admin, admin, Role::Admin).is_ok());
    }

    #[test]
    fn test_self_demotion_denied() {
        let admin = Uuid::new_v4();

        assert_eq!(
            check_user_change(admin, admin, UserChange::SetRole(Role::User)),
            Err(PolicyError::SelfDemotion)
        );
    }

    #[test]
    fn test_self_promotion_noop_allowed() {
        // Setting your own role to admin when you already are one is a
        // no-op and passes the guard.
        let admin = Uuid::new_v4();

        assert!(check_user_change(admin, admin, UserChange::SetRole(Role::Admin)).is_ok());
    }

    #[test]
    fn test_self_deletion_denied() {
        let caller = Uuid::new_v4();

        assert_eq!(
            check_user_change(caller, caller, UserChange::Delete),
            Err(PolicyError::SelfDeletion)
        );
    }

    #[test]
    fn test_admin_may_change_other_users() {
        let caller = Uuid::new_v4();
        let target = Uuid::new_v4();

        assert!(check_user_change(target, caller, UserChange::SetRole(Role::User)).is_ok());
        assert!(check_user_change(target, caller, UserChange::SetRole(Role::Admin)).is_ok());
        assert!(check_user_change(target, caller, UserChange::Delete).is_ok());
    }

    #[test]
    fn test_no_last_admin_protection() {
        // A different admin may demote any admin; the guard only protects
        // against acting on oneself.
        let admin_a = Uuid::new_v4();
        let admin_b = Uuid::new_v4();

        assert!(check_user_change(admin_b, admin_a, UserChange::SetRole(Role::User)).is_ok());
    }

    #[test]
    fn test_policy_error_messages() {
        assert_eq!(
            PolicyError::NotTaskOwner.to_string(),
            "You do not have access to this task"
        );
        assert_eq!(PolicyError::SelfDemotion.to_string(), "Cannot demote yourself");
        assert_eq!(PolicyError::SelfDeletion.to_string(), "Cannot delete yourself");
    }
}
