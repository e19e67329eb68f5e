use crate::error::ApiError;
use crate::helper::authorization_helpers::{self, ADMIN_ONLY, ADMIN_OR_VOLUNTEER};
use crate::models::db_operations::{records_db_operations, users_db_operations};
use crate::models::{BloodGroup, DonationRequest, DonationStatus, FundingRecord, Role};
use crate::DbPool;
use redb::Database;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub total_donors: i64,
    pub total_requests: usize,
    /// Sum of all funding in major units.
    pub total_funding: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(flatten)]
    pub totals: AdminStats,
    pub requests_by_status: BTreeMap<&'static str, usize>,
    pub requests_by_blood_group: BTreeMap<&'static str, usize>,
    /// Keyed by `YYYY-MM` of the creation time.
    pub requests_by_month: BTreeMap<String, usize>,
}

fn collect_totals(pool: &DbPool, db: &Database) -> Result<AdminStats, ApiError> {
    let conn = pool.get()?;
    let total_users = users_db_operations::count_users(&conn, None)?;
    let total_donors = users_db_operations::count_users(&conn, Some(Role::Donor))?;
    drop(conn);

    let total_requests = records_db_operations::count(db, |_: &DonationRequest| true)?;
    let funding_cents: i64 = records_db_operations::find_newest_first(db, |_: &FundingRecord| true, 0, None)?
        .iter()
        .map(|record| record.amount_cents)
        .sum();

    Ok(AdminStats {
        total_users,
        total_donors,
        total_requests,
        total_funding: funding_cents as f64 / 100.0,
    })
}

pub fn admin_stats(pool: &DbPool, db: &Database, caller_email: &str) -> Result<AdminStats, ApiError> {
    authorization_helpers::require_role(pool, caller_email, ADMIN_OR_VOLUNTEER)?;
    collect_totals(pool, db)
}

fn breakdown(requests: &[DonationRequest]) -> (
    BTreeMap<&'static str, usize>,
    BTreeMap<&'static str, usize>,
    BTreeMap<String, usize>,
) {
    let mut by_status: BTreeMap<&'static str, usize> =
        DonationStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    let mut by_blood_group: BTreeMap<&'static str, usize> =
        BloodGroup::ALL.iter().map(|g| (g.as_str(), 0)).collect();
    let mut by_month = BTreeMap::new();

    for request in requests {
        *by_status.entry(request.status.as_str()).or_default() += 1;
        *by_blood_group.entry(request.blood_group.as_str()).or_default() += 1;
        *by_month.entry(request.created_at.format("%Y-%m").to_string()).or_default() += 1;
    }
    (by_status, by_blood_group, by_month)
}

pub fn dashboard_stats(pool: &DbPool, db: &Database, caller_email: &str) -> Result<DashboardStats, ApiError> {
    authorization_helpers::require_role(pool, caller_email, ADMIN_ONLY)?;
    let totals = collect_totals(pool, db)?;
    let requests = records_db_operations::find_newest_first(db, |_: &DonationRequest| true, 0, None)?;
    let (requests_by_status, requests_by_blood_group, requests_by_month) = breakdown(&requests);

    Ok(DashboardStats {
        totals,
        requests_by_status,
        requests_by_blood_group,
        requests_by_month,
    })
}
