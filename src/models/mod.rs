use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed string enum that serializes, displays and parses with
/// the same spelling it is stored under.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

string_enum!(
    /// Capability tier of a user. Checked fresh from the users store on every request.
    Role, "role", {
        Donor => "donor",
        Volunteer => "volunteer",
        Admin => "admin",
    }
);

string_enum!(UserStatus, "user status", {
    Active => "active",
    Blocked => "blocked",
});

string_enum!(
    /// pending -> inprogress (donor attached) -> done | canceled.
    DonationStatus, "donation status", {
        Pending => "pending",
        InProgress => "inprogress",
        Done => "done",
        Canceled => "canceled",
    }
);

string_enum!(BlogStatus, "blog status", {
    Draft => "draft",
    Published => "published",
});

string_enum!(BloodGroup, "blood group", {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
});

// --- Users ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_login_time: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }
}

/// Body of the login check-in. Role and status are never taken from the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserStatusUpdate {
    pub status: UserStatus,
}

/// Query strings decode `+` as a space, so an unescaped `?bloodGroup=A+`
/// arrives as `"A "`.
fn blood_group_query_param<'de, D>(deserializer: D) -> Result<Option<BloodGroup>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let restored = match raw.strip_suffix(' ') {
        Some(group) if !group.ends_with(|c: char| c == '+' || c == '-') => format!("{}+", group),
        _ => raw,
    };
    restored.parse().map(Some).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSearchQuery {
    #[serde(default, deserialize_with = "blood_group_query_param")]
    pub blood_group: Option<BloodGroup>,
    pub district: Option<String>,
    pub upazila: Option<String>,
}

/// Public projection of a donor returned by the search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub district: Option<String>,
    pub upazila: Option<String>,
}

impl From<User> for DonorSummary {
    fn from(user: User) -> Self {
        DonorSummary {
            name: user.name,
            email: user.email,
            photo_url: user.photo_url,
            blood_group: user.blood_group,
            district: user.district,
            upazila: user.upazila,
        }
    }
}

// --- Donation requests ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorInfo {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: Uuid,
    pub requester_name: String,
    pub requester_email: String,
    pub recipient_name: String,
    pub recipient_district: String,
    pub recipient_upazila: String,
    pub hospital_name: String,
    pub full_address: String,
    pub blood_group: BloodGroup,
    pub donation_date: NaiveDate,
    pub donation_time: String,
    pub request_message: String,
    pub status: DonationStatus,
    pub donor: Option<DonorInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonationRequest {
    pub recipient_name: String,
    pub recipient_district: String,
    pub recipient_upazila: String,
    pub hospital_name: String,
    pub full_address: String,
    pub blood_group: BloodGroup,
    pub donation_date: NaiveDate,
    pub donation_time: String,
    #[serde(default)]
    pub request_message: String,
}

/// Every field a PATCH on a donation request may touch. Requester and donor
/// fields are not editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DonationRequestUpdate {
    pub status: Option<DonationStatus>,
    pub recipient_name: Option<String>,
    pub recipient_district: Option<String>,
    pub recipient_upazila: Option<String>,
    pub hospital_name: Option<String>,
    pub full_address: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub donation_date: Option<NaiveDate>,
    pub donation_time: Option<String>,
    pub request_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmDonation {
    pub donor_name: String,
    pub donor_email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationRequestQuery {
    pub status: Option<DonationStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// --- Blog ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub thumbnail: Option<String>,
    pub content: String,
    pub status: BlogStatus,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    pub title: String,
    pub thumbnail: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlogStatusUpdate {
    pub status: BlogStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogQuery {
    pub status: Option<BlogStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// --- Funding ---

/// Append-only record of a confirmed payment. Amounts are kept in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    pub id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub transaction_id: String,
    pub payer_name: String,
    pub payer_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewFunding {
    pub amount: f64,
    pub transaction_id: String,
    pub payer_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentIntentRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub mod db_operations;
pub mod lifecycle;
