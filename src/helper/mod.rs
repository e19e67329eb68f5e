pub mod authorization_helpers;
pub mod blog_helpers;
pub mod donation_request_helpers;
pub mod funding_helpers;
pub mod sanitization_helpers;
pub mod stats_helpers;
pub mod user_helpers;
pub mod validation_helpers;
