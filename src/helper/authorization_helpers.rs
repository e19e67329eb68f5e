//! Access policy shared by every mutating route.
//!
//! The caller's role and status are read from the users store on each call.
//! Nothing is cached and no role is trusted from the credential, so an admin
//! blocking or promoting someone takes effect on that user's next request.

use crate::error::ApiError;
use crate::models::db_operations::users_db_operations;
use crate::models::{Role, User};
use crate::DbPool;

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ADMIN_OR_VOLUNTEER: &[Role] = &[Role::Admin, Role::Volunteer];

/// How a caller relates to the resource it is acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerClass {
    Anonymous,
    /// Authenticated, but never checked in through `/add-user`.
    Unregistered,
    Owner,
    Blocked,
    Role(Role),
}

/// Classifies a caller. Ownership wins over a blocked status, and a blocked
/// status wins over any role.
pub fn classify(
    principal_email: Option<&str>,
    caller: Option<&User>,
    resource_owner: Option<&str>,
) -> CallerClass {
    let Some(email) = principal_email else {
        return CallerClass::Anonymous;
    };
    if resource_owner == Some(email) {
        return CallerClass::Owner;
    }
    match caller {
        None => CallerClass::Unregistered,
        Some(user) if user.is_blocked() => CallerClass::Blocked,
        Some(user) => CallerClass::Role(user.role),
    }
}

pub fn load_caller(pool: &DbPool, email: &str) -> Result<Option<User>, ApiError> {
    let conn = pool.get()?;
    Ok(users_db_operations::read_user_by_email(&conn, email)?)
}

fn deny(email: &str, action: &str) -> ApiError {
    log::warn!("Denied '{}' for {}", action, email);
    ApiError::forbidden()
}

/// Pure owner-or-role check against an already loaded caller. Used inside
/// store transactions, where the owner is only known once the record is read.
pub fn check_owner_or_role(
    principal_email: &str,
    caller: Option<&User>,
    owner_email: &str,
    allowed: &[Role],
) -> Result<(), ApiError> {
    match classify(Some(principal_email), caller, Some(owner_email)) {
        CallerClass::Owner => Ok(()),
        CallerClass::Role(role) if allowed.contains(&role) => Ok(()),
        _ => Err(deny(principal_email, "owner-or-role")),
    }
}

pub fn require_role(pool: &DbPool, principal_email: &str, allowed: &[Role]) -> Result<User, ApiError> {
    let caller = load_caller(pool, principal_email)?;
    match (classify(Some(principal_email), caller.as_ref(), None), caller) {
        (CallerClass::Role(role), Some(user)) if allowed.contains(&role) => Ok(user),
        _ => Err(deny(principal_email, "role")),
    }
}

pub fn require_owner_or_role(
    pool: &DbPool,
    principal_email: &str,
    owner_email: &str,
    allowed: &[Role],
) -> Result<(), ApiError> {
    if principal_email == owner_email {
        return Ok(());
    }
    let caller = load_caller(pool, principal_email)?;
    check_owner_or_role(principal_email, caller.as_ref(), owner_email, allowed)
}

/// Gate for creating donation requests. Returns the caller's stored record.
pub fn require_not_blocked(pool: &DbPool, principal_email: &str) -> Result<User, ApiError> {
    match load_caller(pool, principal_email)? {
        Some(user) if !user.is_blocked() => Ok(user),
        Some(_) => {
            log::warn!("Blocked user {} attempted a restricted action", principal_email);
            Err(ApiError::Forbidden("Your account is blocked.".to_string()))
        }
        None => Err(deny(principal_email, "not-blocked")),
    }
}
