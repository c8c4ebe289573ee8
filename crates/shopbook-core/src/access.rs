//! # Access Module
//!
//! Identity rules: account expiry, the login decision, and the single
//! capability check applied before every component operation.
//!
//! ## Role / Ownership Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   superadmin ──manages──► admin ──manages──► employee                   │
//! │                             │                    │                      │
//! │                             │ owns               │ parent_id            │
//! │                             ▼                    ▼                      │
//! │                          products ◄──── effective owner                 │
//! │                                                                         │
//! │   Capability { roles, scope }                                           │
//! │     roles : exact membership, no hierarchy inference                    │
//! │     scope : Unscoped | OwnedBy(owner_id)                                │
//! │             admin passes if it IS the owner                             │
//! │             employee passes if its parent IS the owner                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Login Sequence
//! ```text
//! credentials match?
//!      │ no ──► InvalidCredentials
//!      ▼ yes
//! expired? ── yes ──► mark blocked (persisted)
//!      │                    │
//!      ▼                    ▼
//! blocked? ── yes ──► AccountBlocked
//!      │ no
//!      ▼
//! session issued
//! ```

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AccessError, CoreResult, ValidationError};
use crate::types::{Account, Role, StoreCategory};
use crate::ACCOUNT_LIFETIME_DAYS;

// =============================================================================
// Role Sets
// =============================================================================

/// Account administration (each role manages the level below it).
pub const MANAGE_ACCOUNTS: &[Role] = &[Role::SuperAdmin, Role::Admin];
/// Creating and editing products.
pub const EDIT_CATALOG: &[Role] = &[Role::Admin];
/// Viewing the catalog and recording or viewing sales.
pub const STORE_FLOOR: &[Role] = &[Role::Admin, Role::Employee];
/// Credit ledger and sales export.
pub const STORE_BACK_OFFICE: &[Role] = &[Role::Admin];

// =============================================================================
// Expiry
// =============================================================================

/// True when a non-super-admin account is older than its lifetime.
///
/// Super-admins never expire.
pub fn is_expired(account: &Account, now: DateTime<Utc>) -> bool {
    if account.role == Role::SuperAdmin {
        return false;
    }
    now - account.created_at > Duration::days(ACCOUNT_LIFETIME_DAYS)
}

// =============================================================================
// Login Decision
// =============================================================================

/// What authentication must do once the password has matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginDecision {
    /// Persist `is_blocked = true` before answering, whatever the outcome.
    pub mark_blocked: bool,
    pub outcome: Result<(), AccessError>,
}

/// Decides a login for an account whose credentials were verified.
///
/// An expired account is blocked as a side effect and then rejected, the
/// same as an account that was blocked manually.
pub fn evaluate_login(account: &Account, now: DateTime<Utc>) -> LoginDecision {
    let mark_blocked = !account.is_blocked && is_expired(account, now);
    let blocked = account.is_blocked || mark_blocked;

    LoginDecision {
        mark_blocked,
        outcome: if blocked {
            Err(AccessError::AccountBlocked)
        } else {
            Ok(())
        },
    }
}

/// Per-request check for an already authenticated account.
///
/// Does not write anything; an expired account is simply refused until its
/// next login attempt blocks it.
pub fn ensure_active(account: &Account, now: DateTime<Utc>) -> Result<(), AccessError> {
    if account.is_blocked || is_expired(account, now) {
        return Err(AccessError::AccountBlocked);
    }
    Ok(())
}

// =============================================================================
// Capability Check
// =============================================================================

/// Ownership requirement of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Role membership alone is enough.
    Unscoped,
    /// The caller must own the resource (admin) or work for its owner (employee).
    OwnedBy(&'a str),
}

/// Roles plus ownership an operation requires.
#[derive(Debug, Clone, Copy)]
pub struct Capability<'a> {
    pub roles: &'a [Role],
    pub scope: Scope<'a>,
}

impl<'a> Capability<'a> {
    pub const fn any_of(roles: &'a [Role]) -> Self {
        Capability {
            roles,
            scope: Scope::Unscoped,
        }
    }

    pub const fn owned_by(roles: &'a [Role], owner_id: &'a str) -> Self {
        Capability {
            roles,
            scope: Scope::OwnedBy(owner_id),
        }
    }
}

/// Exact role membership. An admin is not implicitly an employee.
#[inline]
pub fn authorize(account: &Account, required: &[Role]) -> bool {
    required.contains(&account.role)
}

/// True when the account is the owner, or an employee of the owner.
pub fn acts_for(account: &Account, owner_id: &str) -> bool {
    match account.role {
        Role::Admin => account.id == owner_id,
        Role::Employee => account.parent_id.as_deref() == Some(owner_id),
        Role::SuperAdmin => false,
    }
}

/// The one capability check every operation goes through.
pub fn check(account: &Account, capability: &Capability<'_>) -> Result<(), AccessError> {
    if !authorize(account, capability.roles) {
        return Err(AccessError::Forbidden);
    }
    match capability.scope {
        Scope::Unscoped => Ok(()),
        Scope::OwnedBy(owner_id) if acts_for(account, owner_id) => Ok(()),
        Scope::OwnedBy(_) => Err(AccessError::Forbidden),
    }
}

// =============================================================================
// Account Hierarchy
// =============================================================================

/// True when `actor` administers `target`.
///
/// Super-admins manage admin accounts; admins manage their own employees.
pub fn manages(actor: &Account, target: &Account) -> bool {
    match actor.role {
        Role::SuperAdmin => target.role == Role::Admin,
        Role::Admin => {
            target.role == Role::Employee && target.parent_id.as_deref() == Some(actor.id.as_str())
        }
        Role::Employee => false,
    }
}

/// Fields supplied when provisioning an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub handle: String,
    pub display_name: String,
    pub password_hash: String,
    /// Required when a super-admin creates an admin; ignored for employees.
    pub store_category: Option<StoreCategory>,
}

/// Builds the account `actor` is allowed to create.
///
/// A super-admin creates admins in the requested category. An admin creates
/// employees that inherit the admin's category and point back to the admin.
pub fn provision(actor: &Account, new: NewAccount, now: DateTime<Utc>) -> CoreResult<Account> {
    let (role, store_category, parent_id) = match actor.role {
        Role::SuperAdmin => {
            let category = new.store_category.ok_or_else(|| ValidationError::Required {
                field: "store_category".to_string(),
            })?;
            (Role::Admin, Some(category), None)
        }
        Role::Admin => (Role::Employee, actor.store_category, Some(actor.id.clone())),
        Role::Employee => {
            return Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![Role::SuperAdmin.to_string(), Role::Admin.to_string()],
            }
            .into())
        }
    };

    Ok(Account {
        id: Uuid::new_v4().to_string(),
        handle: new.handle.trim().to_string(),
        password_hash: new.password_hash,
        display_name: new.display_name.trim().to_string(),
        role,
        store_category,
        parent_id,
        is_blocked: false,
        created_at: now,
    })
}

/// Where the dashboard sends an account after login.
pub fn home_path(account: &Account) -> String {
    match (account.role, account.store_category) {
        (Role::SuperAdmin, _) => "/superadmin".to_string(),
        (Role::Admin, Some(category)) => format!("/dashboard/{}", category),
        (Role::Employee, Some(category)) => format!("/employee/{}", category),
        _ => "/".to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, role: Role, parent_id: Option<&str>, age_days: i64) -> Account {
        let now = Utc::now();
        Account {
            id: id.to_string(),
            handle: id.to_string(),
            password_hash: String::new(),
            display_name: id.to_string(),
            role,
            store_category: match role {
                Role::SuperAdmin => None,
                _ => Some(StoreCategory::Furniture),
            },
            parent_id: parent_id.map(str::to_string),
            is_blocked: false,
            created_at: now - Duration::days(age_days),
        }
    }

    #[test]
    fn test_expiry_threshold() {
        let now = Utc::now();
        let mut admin = account("a", Role::Admin, None, 0);

        admin.created_at = now - Duration::days(30);
        assert!(!is_expired(&admin, now));

        admin.created_at = now - Duration::days(30) - Duration::seconds(1);
        assert!(is_expired(&admin, now));
    }

    #[test]
    fn test_superadmin_never_expires() {
        let root = account("root", Role::SuperAdmin, None, 3650);
        assert!(!is_expired(&root, Utc::now()));
        assert_eq!(evaluate_login(&root, Utc::now()).outcome, Ok(()));
    }

    #[test]
    fn test_login_blocks_expired_account() {
        let admin = account("a", Role::Admin, None, 31);
        let decision = evaluate_login(&admin, Utc::now());
        assert!(decision.mark_blocked);
        assert_eq!(decision.outcome, Err(AccessError::AccountBlocked));
    }

    #[test]
    fn test_login_rejects_manually_blocked_account() {
        let mut employee = account("e", Role::Employee, Some("a"), 1);
        employee.is_blocked = true;
        let decision = evaluate_login(&employee, Utc::now());
        assert!(!decision.mark_blocked);
        assert_eq!(decision.outcome, Err(AccessError::AccountBlocked));
    }

    #[test]
    fn test_login_admits_fresh_account() {
        let employee = account("e", Role::Employee, Some("a"), 29);
        let decision = evaluate_login(&employee, Utc::now());
        assert!(!decision.mark_blocked);
        assert_eq!(decision.outcome, Ok(()));
    }

    #[test]
    fn test_authorize_is_exact_membership() {
        let admin = account("a", Role::Admin, None, 0);
        let root = account("root", Role::SuperAdmin, None, 0);

        assert!(authorize(&admin, EDIT_CATALOG));
        assert!(!authorize(&admin, &[Role::Employee]));
        assert!(!authorize(&admin, &[Role::SuperAdmin]));
        assert!(!authorize(&root, STORE_FLOOR));
    }

    #[test]
    fn test_scoped_check() {
        let admin = account("a", Role::Admin, None, 0);
        let other_admin = account("b", Role::Admin, None, 0);
        let employee = account("e", Role::Employee, Some("a"), 0);

        let cap = Capability::owned_by(STORE_FLOOR, "a");
        assert_eq!(check(&admin, &cap), Ok(()));
        assert_eq!(check(&employee, &cap), Ok(()));
        assert_eq!(check(&other_admin, &cap), Err(AccessError::Forbidden));

        let back_office = Capability::owned_by(STORE_BACK_OFFICE, "a");
        assert_eq!(check(&employee, &back_office), Err(AccessError::Forbidden));
    }

    #[test]
    fn test_manages() {
        let root = account("root", Role::SuperAdmin, None, 0);
        let admin = account("a", Role::Admin, None, 0);
        let employee = account("e", Role::Employee, Some("a"), 0);
        let stranger = account("x", Role::Employee, Some("b"), 0);

        assert!(manages(&root, &admin));
        assert!(!manages(&root, &employee));
        assert!(manages(&admin, &employee));
        assert!(!manages(&admin, &stranger));
        assert!(!manages(&employee, &employee));
    }

    #[test]
    fn test_admin_provisions_employee_in_own_category() {
        let admin = account("a", Role::Admin, None, 0);
        let new = NewAccount {
            handle: " clerk ".to_string(),
            display_name: "Clerk".to_string(),
            password_hash: "hash".to_string(),
            store_category: Some(StoreCategory::Beverage),
        };

        let employee = provision(&admin, new, Utc::now()).unwrap();
        assert_eq!(employee.role, Role::Employee);
        assert_eq!(employee.store_category, Some(StoreCategory::Furniture));
        assert_eq!(employee.parent_id.as_deref(), Some("a"));
        assert_eq!(employee.handle, "clerk");
    }

    #[test]
    fn test_superadmin_provision_requires_category() {
        let root = account("root", Role::SuperAdmin, None, 0);
        let new = NewAccount {
            handle: "store".to_string(),
            display_name: "Store".to_string(),
            password_hash: "hash".to_string(),
            store_category: None,
        };
        assert!(provision(&root, new, Utc::now()).is_err());
    }

    #[test]
    fn test_home_path() {
        assert_eq!(home_path(&account("root", Role::SuperAdmin, None, 0)), "/superadmin");
        assert_eq!(home_path(&account("a", Role::Admin, None, 0)), "/dashboard/furniture");
        assert_eq!(
            home_path(&account("e", Role::Employee, Some("a"), 0)),
            "/employee/furniture"
        );
    }
}
