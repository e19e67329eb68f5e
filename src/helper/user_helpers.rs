use crate::error::ApiError;
use crate::helper::authorization_helpers::{self, ADMIN_ONLY};
use crate::helper::validation_helpers::{optional_text, parse_record_id, require_email, require_text};
use crate::models::db_operations::users_db_operations;
use crate::models::{DonorSearchQuery, DonorSummary, NewUser, Role, User, UserProfileUpdate, UserStatus};
use crate::DbPool;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CheckInOutcome {
    pub inserted: bool,
    pub user: User,
}

pub fn check_in_user(pool: &DbPool, payload: NewUser) -> Result<CheckInOutcome, ApiError> {
    let new_user = NewUser {
        email: require_email("email", &payload.email)?,
        name: require_text("name", &payload.name)?,
        photo_url: optional_text("photoUrl", payload.photo_url)?,
        blood_group: payload.blood_group,
        district: optional_text("district", payload.district)?,
        upazila: optional_text("upazila", payload.upazila)?,
        phone: optional_text("phone", payload.phone)?,
    };

    let conn = pool.get()?;
    let (user, inserted) = users_db_operations::upsert_user_on_login(&conn, &new_user)?;
    if inserted {
        log::info!("Registered new user {}", user.email);
    }
    Ok(CheckInOutcome { inserted, user })
}

pub fn fetch_user_profile(pool: &DbPool, caller_email: &str, target_email: &str) -> Result<User, ApiError> {
    authorization_helpers::require_owner_or_role(pool, caller_email, target_email, ADMIN_ONLY)?;
    let conn = pool.get()?;
    users_db_operations::read_user_by_email(&conn, target_email)?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}

pub fn update_own_profile(
    pool: &DbPool,
    caller_email: &str,
    target_email: &str,
    update: UserProfileUpdate,
) -> Result<User, ApiError> {
    if caller_email != target_email {
        log::warn!("{} attempted to edit the profile of {}", caller_email, target_email);
        return Err(ApiError::forbidden());
    }
    let update = UserProfileUpdate {
        name: optional_text("name", update.name)?,
        photo_url: optional_text("photoUrl", update.photo_url)?,
        blood_group: update.blood_group,
        district: optional_text("district", update.district)?,
        upazila: optional_text("upazila", update.upazila)?,
        phone: optional_text("phone", update.phone)?,
    };

    let conn = pool.get()?;
    if users_db_operations::update_profile(&conn, target_email, &update)? == 0 {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }
    users_db_operations::read_user_by_email(&conn, target_email)?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}

pub fn fetch_all_users(
    pool: &DbPool,
    caller_email: &str,
    status: Option<UserStatus>,
) -> Result<Vec<User>, ApiError> {
    authorization_helpers::require_role(pool, caller_email, ADMIN_ONLY)?;
    let conn = pool.get()?;
    Ok(users_db_operations::read_all_users(&conn, status)?)
}

fn reload_user(pool: &DbPool, id: &uuid::Uuid) -> Result<User, ApiError> {
    let conn = pool.get()?;
    users_db_operations::read_user_by_id(&conn, id)?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}

pub fn set_user_status(
    pool: &DbPool,
    caller_email: &str,
    raw_id: &str,
    status: UserStatus,
) -> Result<User, ApiError> {
    let id = parse_record_id(raw_id)?;
    authorization_helpers::require_role(pool, caller_email, ADMIN_ONLY)?;
    let touched = users_db_operations::update_status(&*pool.get()?, &id, status)?;
    if touched == 0 {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }
    log::info!("User {} set to {} by {}", id, status, caller_email);
    reload_user(pool, &id)
}

pub fn set_user_role(pool: &DbPool, caller_email: &str, raw_id: &str, role: Role) -> Result<User, ApiError> {
    let id = parse_record_id(raw_id)?;
    authorization_helpers::require_role(pool, caller_email, ADMIN_ONLY)?;
    let touched = users_db_operations::update_role(&*pool.get()?, &id, role)?;
    if touched == 0 {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }
    log::info!("User {} given role {} by {}", id, role, caller_email);
    reload_user(pool, &id)
}

pub fn search_donors(pool: &DbPool, query: &DonorSearchQuery) -> Result<Vec<DonorSummary>, ApiError> {
    let conn = pool.get()?;
    let donors = users_db_operations::search_donors(&conn, query)?;
    Ok(donors.into_iter().map(DonorSummary::from).collect())
}
