use crate::error::ApiError;
use crate::helper::authorization_helpers::{self, ADMIN_ONLY, ADMIN_OR_VOLUNTEER};
use crate::helper::validation_helpers::{
    normalize_donation_time, optional_text, parse_record_id, public_page_size, require_email, require_text,
};
use crate::models::db_operations::records_db_operations;
use crate::models::{
    ConfirmDonation, DonationRequest, DonationRequestQuery, DonationRequestUpdate, DonationStatus, DonorInfo,
    NewDonationRequest, PageQuery,
};
use crate::DbPool;
use chrono::Utc;
use redb::Database;
use uuid::Uuid;

pub fn create_donation_request(
    pool: &DbPool,
    db: &Database,
    requester_email: &str,
    payload: NewDonationRequest,
) -> Result<DonationRequest, ApiError> {
    let requester = authorization_helpers::require_not_blocked(pool, requester_email)?;

    let request = DonationRequest {
        id: Uuid::now_v7(),
        requester_name: requester.name,
        requester_email: requester.email,
        recipient_name: require_text("recipientName", &payload.recipient_name)?,
        recipient_district: require_text("recipientDistrict", &payload.recipient_district)?,
        recipient_upazila: require_text("recipientUpazila", &payload.recipient_upazila)?,
        hospital_name: require_text("hospitalName", &payload.hospital_name)?,
        full_address: require_text("fullAddress", &payload.full_address)?,
        blood_group: payload.blood_group,
        donation_date: payload.donation_date,
        donation_time: normalize_donation_time(&payload.donation_time)?,
        request_message: payload.request_message.trim().to_string(),
        status: DonationStatus::Pending,
        donor: None,
        created_at: Utc::now(),
        updated_at: None,
    };

    records_db_operations::insert(db, &request)?;
    log::info!("Donation request {} created by {}", request.id, request.requester_email);
    Ok(request)
}

pub fn fetch_donation_request(db: &Database, raw_id: &str) -> Result<DonationRequest, ApiError> {
    let id = parse_record_id(raw_id)?;
    records_db_operations::find_by_id(db, &id)?
        .ok_or_else(|| ApiError::NotFound("Donation request not found.".to_string()))
}

/// Attaches the caller's chosen donor to a pending request. The pending check
/// and the write share one store transaction, so of two concurrent confirms
/// only the first one succeeds.
pub fn confirm_donation_request(
    db: &Database,
    raw_id: &str,
    caller_email: &str,
    payload: ConfirmDonation,
) -> Result<DonationRequest, ApiError> {
    let id = parse_record_id(raw_id)?;
    let donor = DonorInfo {
        name: require_text("donorName", &payload.donor_name)?,
        email: require_email("donorEmail", &payload.donor_email)?,
    };

    let confirmed = records_db_operations::modify(db, &id, |request: &mut DonationRequest| {
        request.confirm(donor, caller_email).map_err(ApiError::from)
    })?;
    log::info!("Donation request {} confirmed by {}", confirmed.id, caller_email);
    Ok(confirmed)
}

fn validate_update(update: DonationRequestUpdate) -> Result<DonationRequestUpdate, ApiError> {
    Ok(DonationRequestUpdate {
        status: update.status,
        recipient_name: optional_text("recipientName", update.recipient_name)?,
        recipient_district: optional_text("recipientDistrict", update.recipient_district)?,
        recipient_upazila: optional_text("recipientUpazila", update.recipient_upazila)?,
        hospital_name: optional_text("hospitalName", update.hospital_name)?,
        full_address: optional_text("fullAddress", update.full_address)?,
        blood_group: update.blood_group,
        donation_date: update.donation_date,
        donation_time: update.donation_time.as_deref().map(normalize_donation_time).transpose()?,
        request_message: update.request_message.map(|m| m.trim().to_string()),
    })
}

/// A status-only payload is open to the owner, admins and volunteers. Any
/// other payload is open to the owner and admins.
pub fn update_donation_request(
    pool: &DbPool,
    db: &Database,
    raw_id: &str,
    caller_email: &str,
    update: DonationRequestUpdate,
) -> Result<DonationRequest, ApiError> {
    let id = parse_record_id(raw_id)?;
    let update = validate_update(update)?;
    let allowed = if update.is_status_only() { ADMIN_OR_VOLUNTEER } else { ADMIN_ONLY };
    let caller = authorization_helpers::load_caller(pool, caller_email)?;

    let updated = records_db_operations::modify(db, &id, |request: &mut DonationRequest| -> Result<(), ApiError> {
        authorization_helpers::check_owner_or_role(
            caller_email,
            caller.as_ref(),
            &request.requester_email,
            allowed,
        )?;
        let before = request.status;
        request.apply_update(update)?;
        if before != request.status {
            log::info!("Donation request {} moved from {} to {}", request.id, before, request.status);
        }
        Ok(())
    })?;
    Ok(updated)
}

pub fn delete_donation_request(
    pool: &DbPool,
    db: &Database,
    raw_id: &str,
    caller_email: &str,
) -> Result<DonationRequest, ApiError> {
    let id = parse_record_id(raw_id)?;
    let caller = authorization_helpers::load_caller(pool, caller_email)?;

    let removed = records_db_operations::remove(db, &id, |request: &DonationRequest| {
        authorization_helpers::check_owner_or_role(
            caller_email,
            caller.as_ref(),
            &request.requester_email,
            ADMIN_ONLY,
        )
    })?;
    log::info!("Donation request {} deleted by {}", removed.id, caller_email);
    Ok(removed)
}

/// The caller's own requests, newest first. A limit of 0 means unbounded.
pub fn list_my_requests(
    db: &Database,
    requester_email: &str,
    query: &DonationRequestQuery,
) -> Result<Vec<DonationRequest>, ApiError> {
    let status = query.status;
    Ok(records_db_operations::find_newest_first(
        db,
        |request: &DonationRequest| {
            request.requester_email == requester_email && status.map_or(true, |s| request.status == s)
        },
        query.offset.unwrap_or(0),
        query.limit,
    )?)
}

pub fn list_all_requests(
    pool: &DbPool,
    db: &Database,
    caller_email: &str,
    query: &DonationRequestQuery,
) -> Result<Vec<DonationRequest>, ApiError> {
    authorization_helpers::require_role(pool, caller_email, ADMIN_OR_VOLUNTEER)?;
    let status = query.status;
    Ok(records_db_operations::find_newest_first(
        db,
        |request: &DonationRequest| status.map_or(true, |s| request.status == s),
        query.offset.unwrap_or(0),
        query.limit,
    )?)
}

pub fn list_pending_requests(db: &Database, page: &PageQuery) -> Result<Vec<DonationRequest>, ApiError> {
    Ok(records_db_operations::find_newest_first(
        db,
        |request: &DonationRequest| request.status == DonationStatus::Pending,
        page.offset.unwrap_or(0),
        Some(public_page_size(page.limit)),
    )?)
}
