use crate::error::ApiError;
use crate::helper::authorization_helpers;
use crate::helper::validation_helpers::{amount_to_minor_units, optional_text, require_text};
use crate::middleware::AuthenticatedPrincipal;
use crate::models::db_operations::records_db_operations;
use crate::models::{FundingRecord, NewFunding, PageQuery};
use crate::services::payments::{PaymentGateway, PaymentIntent};
use crate::DbPool;
use chrono::Utc;
use redb::Database;
use uuid::Uuid;

pub async fn create_payment_intent(
    gateway: &dyn PaymentGateway,
    currency: &str,
    amount: f64,
) -> Result<PaymentIntent, ApiError> {
    let minor_units = amount_to_minor_units(amount)?;
    gateway
        .create_payment_intent(minor_units, currency)
        .await
        .map_err(ApiError::upstream)
}

/// Appends a funding record. Payer details come from the caller's identity,
/// falling back to the stored user name and then to the email.
pub fn record_funding(
    pool: &DbPool,
    db: &Database,
    principal: &AuthenticatedPrincipal,
    currency: &str,
    payload: NewFunding,
) -> Result<FundingRecord, ApiError> {
    let amount_cents = amount_to_minor_units(payload.amount)?;
    let transaction_id = require_text("transactionId", &payload.transaction_id)?;

    let payer_name = match optional_text("payerName", payload.payer_name)? {
        Some(name) => name,
        None => authorization_helpers::load_caller(pool, &principal.email)?
            .map(|user| user.name)
            .unwrap_or_else(|| principal.email.clone()),
    };

    let record = FundingRecord {
        id: Uuid::now_v7(),
        amount_cents,
        currency: currency.to_string(),
        transaction_id,
        payer_name,
        payer_email: principal.email.clone(),
        created_at: Utc::now(),
    };
    records_db_operations::insert(db, &record)?;
    log::info!("Funding {} of {} {} recorded for {}", record.id, record.amount_cents, record.currency, record.payer_email);
    Ok(record)
}

pub fn list_funding(db: &Database, page: &PageQuery) -> Result<Vec<FundingRecord>, ApiError> {
    Ok(records_db_operations::find_newest_first(
        db,
        |_: &FundingRecord| true,
        page.offset.unwrap_or(0),
        page.limit,
    )?)
}
