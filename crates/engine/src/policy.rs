//! Permission policy.
//!
//! Pure decision functions over roles and memberships. Nothing here touches
//! the database: callers resolve the memberships (and, where needed, the
//! current owner count) and ask the policy whether the action is allowed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EngineError, memberships::Membership};

/// Role of a user inside an account.
///
/// - `OWNER`: full access, manages members, deletes the account.
/// - `ADMIN`: updates the account and edits/deletes transactions.
/// - `MEMBER`: reads and creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountRole {
    Owner,
    Admin,
    Member,
}

impl AccountRole {
    /// Canonical role string used by the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for AccountRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(EngineError::InvalidRole("Invalid role.".to_string())),
        }
    }
}

/// Why a membership change was refused.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("Only OWNER can manage account members.")]
    NotOwner,
    #[error("Owner cannot change their own role.")]
    SelfRoleChange,
    #[error("Owner cannot remove themselves.")]
    SelfRemoval,
    #[error("Account must have at least one owner.")]
    LastOwner,
}

impl From<PolicyViolation> for EngineError {
    fn from(value: PolicyViolation) -> Self {
        match value {
            PolicyViolation::NotOwner => EngineError::Forbidden(value.to_string()),
            PolicyViolation::SelfRoleChange
            | PolicyViolation::SelfRemoval
            | PolicyViolation::LastOwner => EngineError::Conflict(value.to_string()),
        }
    }
}

pub fn can_manage_members(role: AccountRole) -> bool {
    role == AccountRole::Owner
}

pub fn can_mutate_transaction(role: AccountRole) -> bool {
    matches!(role, AccountRole::Admin | AccountRole::Owner)
}

pub fn can_update_account(role: AccountRole) -> bool {
    matches!(role, AccountRole::Admin | AccountRole::Owner)
}

pub fn can_delete_account(role: AccountRole) -> bool {
    role == AccountRole::Owner
}

/// Invites grant roles, so sending one is a member-management action.
pub fn can_send_invite(role: AccountRole) -> bool {
    can_manage_members(role)
}

/// Decide whether `actor` may set `target`'s role to `new_role`.
///
/// `owner_count` is the number of OWNER memberships on the account at
/// decision time.
pub fn can_change_role(
    actor: &Membership,
    target: &Membership,
    new_role: AccountRole,
    owner_count: u64,
) -> Result<(), PolicyViolation> {
    if !can_manage_members(actor.role) {
        return Err(PolicyViolation::NotOwner);
    }
    // Self role changes are refused outright, OWNER -> OWNER included.
    if target.user_id == actor.user_id {
        return Err(PolicyViolation::SelfRoleChange);
    }
    if target.role == AccountRole::Owner && new_role != AccountRole::Owner && owner_count <= 1 {
        return Err(PolicyViolation::LastOwner);
    }
    Ok(())
}

/// Decide whether `actor` may remove `target` from the account.
pub fn can_remove_member(
    actor: &Membership,
    target: &Membership,
    owner_count: u64,
) -> Result<(), PolicyViolation> {
    if !can_manage_members(actor.role) {
        return Err(PolicyViolation::NotOwner);
    }
    if target.user_id == actor.user_id {
        return Err(PolicyViolation::SelfRemoval);
    }
    if target.role == AccountRole::Owner && owner_count <= 1 {
        return Err(PolicyViolation::LastOwner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn member(user_id: &str, role: AccountRole) -> Membership {
        Membership {
            id: format!("m-{user_id}"),
            user_id: user_id.to_string(),
            account_id: "acc".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn role_predicates() {
        assert!(can_manage_members(AccountRole::Owner));
        assert!(!can_manage_members(AccountRole::Admin));
        assert!(!can_manage_members(AccountRole::Member));

        assert!(can_mutate_transaction(AccountRole::Owner));
        assert!(can_mutate_transaction(AccountRole::Admin));
        assert!(!can_mutate_transaction(AccountRole::Member));

        assert!(can_update_account(AccountRole::Admin));
        assert!(!can_update_account(AccountRole::Member));
        assert!(can_delete_account(AccountRole::Owner));
        assert!(!can_delete_account(AccountRole::Admin));
    }

    #[test]
    fn parse_roles() {
        assert_eq!(AccountRole::try_from("OWNER").unwrap(), AccountRole::Owner);
        assert_eq!(AccountRole::try_from("admin").unwrap(), AccountRole::Admin);
        assert_eq!(
            AccountRole::try_from("superuser").unwrap_err(),
            EngineError::InvalidRole("Invalid role.".to_string())
        );
    }

    #[test]
    fn only_owner_changes_roles() {
        let admin = member("admin", AccountRole::Admin);
        let target = member("bob", AccountRole::Member);
        assert_eq!(
            can_change_role(&admin, &target, AccountRole::Admin, 1),
            Err(PolicyViolation::NotOwner)
        );
    }

    #[test]
    fn owner_promotes_member_to_owner() {
        let owner = member("alice", AccountRole::Owner);
        let target = member("bob", AccountRole::Member);
        assert_eq!(can_change_role(&owner, &target, AccountRole::Owner, 1), Ok(()));
    }

    #[test]
    fn self_role_change_is_refused_even_as_noop() {
        let owner = member("alice", AccountRole::Owner);
        assert_eq!(
            can_change_role(&owner, &owner, AccountRole::Owner, 2),
            Err(PolicyViolation::SelfRoleChange)
        );
        assert_eq!(
            can_change_role(&owner, &owner, AccountRole::Member, 2),
            Err(PolicyViolation::SelfRoleChange)
        );
    }

    #[test]
    fn sole_owner_cannot_be_demoted_or_removed() {
        let sole = member("alice", AccountRole::Owner);
        // A second user acting as owner on a stale read still hits the guard.
        let other_owner = member("carol", AccountRole::Owner);
        assert_eq!(
            can_change_role(&other_owner, &sole, AccountRole::Admin, 1),
            Err(PolicyViolation::LastOwner)
        );
        assert_eq!(
            can_remove_member(&other_owner, &sole, 1),
            Err(PolicyViolation::LastOwner)
        );
        // The sole owner acting on themselves is stopped by the self guard first.
        assert_eq!(
            can_remove_member(&sole, &sole, 1),
            Err(PolicyViolation::SelfRemoval)
        );
    }

    #[test]
    fn owner_demoted_when_another_owner_remains() {
        let alice = member("alice", AccountRole::Owner);
        let bob = member("bob", AccountRole::Owner);
        assert_eq!(can_change_role(&alice, &bob, AccountRole::Member, 2), Ok(()));
        assert_eq!(can_remove_member(&alice, &bob, 2), Ok(()));
    }

    #[test]
    fn violations_map_to_engine_errors() {
        assert!(matches!(
            EngineError::from(PolicyViolation::NotOwner),
            EngineError::Forbidden(_)
        ));
        assert_eq!(
            EngineError::from(PolicyViolation::LastOwner),
            EngineError::Conflict("Account must have at least one owner.".to_string())
        );
    }
}
