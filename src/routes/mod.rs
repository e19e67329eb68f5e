use crate::error::ApiError;
use actix_web::{error, web, HttpRequest};

pub mod admin;
pub mod blogs;
pub mod donation_requests;
pub mod funding;
pub mod public;
pub mod users;

const MAX_JSON_BODY_BYTES: usize = 256 * 1024;

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidInput(format!("Invalid request body: {}", err)).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidInput(format!("Invalid query string: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidInput(format!("Invalid path parameter: {}", err)).into()
}

/// Registers every route plus the extractor error handlers. The server and the
/// integration tests build their apps from this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_JSON_BODY_BYTES)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .configure(public::config_public)
    .configure(users::config_users)
    .configure(donation_requests::config_donation_requests)
    .configure(blogs::config_blogs)
    .configure(admin::config_admin)
    .configure(funding::config_funding);
}
