//! State machine of a donation request.
//!
//! `pending` is the only state a request is created in. It leaves `pending`
//! through [`DonationRequest::confirm`], which attaches the donor and moves to
//! `inprogress` in the same step, or through an explicit status edit towards a
//! terminal state. `done` and `canceled` have no outgoing transitions.

use super::{DonationRequest, DonationRequestUpdate, DonationStatus, DonorInfo};
use chrono::Utc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Donation request is already {0}; only pending requests can be confirmed")]
    NotPending(DonationStatus),
    #[error("You cannot confirm your own donation request")]
    SelfConfirmation,
    #[error("Cannot change donation request status from {from} to {to}")]
    InvalidTransition {
        from: DonationStatus,
        to: DonationStatus,
    },
    #[error("A donation request cannot be inprogress without donor information")]
    MissingDonor,
}

impl DonationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Done | DonationStatus::Canceled)
    }
}

impl DonationRequestUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && !self.touches_fields()
    }

    /// True when the payload carries the status field and nothing else.
    pub fn is_status_only(&self) -> bool {
        self.status.is_some() && !self.touches_fields()
    }

    fn touches_fields(&self) -> bool {
        self.recipient_name.is_some()
            || self.recipient_district.is_some()
            || self.recipient_upazila.is_some()
            || self.hospital_name.is_some()
            || self.full_address.is_some()
            || self.blood_group.is_some()
            || self.donation_date.is_some()
            || self.donation_time.is_some()
            || self.request_message.is_some()
    }
}

impl DonationRequest {
    /// Attaches a donor to a pending request.
    ///
    /// Checks, in order: the request is `pending`, then neither the caller
    /// nor the named donor is the requester.
    pub fn confirm(&mut self, donor: DonorInfo, caller_email: &str) -> Result<(), LifecycleError> {
        if self.status != DonationStatus::Pending {
            return Err(LifecycleError::NotPending(self.status));
        }
        if self.requester_email == caller_email || self.requester_email == donor.email {
            return Err(LifecycleError::SelfConfirmation);
        }
        self.status = DonationStatus::InProgress;
        self.donor = Some(donor);
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn transition_to(&mut self, next: DonationStatus) -> Result<(), LifecycleError> {
        use DonationStatus::*;

        match (self.status, next) {
            (current, next) if current == next => return Ok(()),
            (Pending | InProgress, Done | Canceled) => {}
            (Pending, InProgress) if self.donor.is_some() => {}
            (Pending, InProgress) => return Err(LifecycleError::MissingDonor),
            (from, to) => return Err(LifecycleError::InvalidTransition { from, to }),
        }
        self.status = next;
        Ok(())
    }

    /// Merges a validated partial update. An empty update leaves the record untouched.
    pub fn apply_update(&mut self, update: DonationRequestUpdate) -> Result<(), LifecycleError> {
        if update.is_empty() {
            return Ok(());
        }
        if let Some(status) = update.status {
            self.transition_to(status)?;
        }
        if let Some(v) = update.recipient_name { self.recipient_name = v; }
        if let Some(v) = update.recipient_district { self.recipient_district = v; }
        if let Some(v) = update.recipient_upazila { self.recipient_upazila = v; }
        if let Some(v) = update.hospital_name { self.hospital_name = v; }
        if let Some(v) = update.full_address { self.full_address = v; }
        if let Some(v) = update.blood_group { self.blood_group = v; }
        if let Some(v) = update.donation_date { self.donation_date = v; }
        if let Some(v) = update.donation_time { self.donation_time = v; }
        if let Some(v) = update.request_message { self.request_message = v; }
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}
