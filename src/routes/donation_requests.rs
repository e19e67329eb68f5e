use crate::error::ApiError;
use crate::helper::donation_request_helpers;
use crate::middleware::AuthenticatedPrincipal;
use crate::models::{ConfirmDonation, DonationRequestQuery, DonationRequestUpdate, NewDonationRequest, PageQuery};
use crate::DbPool;
use actix_web::{web, HttpResponse};
use redb::Database;
use serde_json::json;

/// The fixed paths are registered ahead of `/{id}` so they are never read as ids.
pub fn config_donation_requests(cfg: &mut web::ServiceConfig) {
    cfg.route("/donation-requests/pending", web::get().to(list_pending))
        .route("/donation-requests/my-requests", web::get().to(list_mine))
        .route("/donation-requests/confirm/{id}", web::patch().to(confirm_request))
        .service(
            web::resource("/donation-requests")
                .route(web::get().to(list_all))
                .route(web::post().to(create_request)),
        )
        .service(
            web::resource("/donation-requests/{id}")
                .route(web::get().to(get_request))
                .route(web::patch().to(update_request))
                .route(web::delete().to(delete_request)),
        );
}

async fn list_pending(
    db: web::Data<Database>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let requests = donation_request_helpers::list_pending_requests(&db, &page)?;
    Ok(HttpResponse::Ok().json(requests))
}

async fn list_mine(
    principal: AuthenticatedPrincipal,
    db: web::Data<Database>,
    query: web::Query<DonationRequestQuery>,
) -> Result<HttpResponse, ApiError> {
    let requests = donation_request_helpers::list_my_requests(&db, &principal.email, &query)?;
    Ok(HttpResponse::Ok().json(requests))
}

async fn list_all(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    query: web::Query<DonationRequestQuery>,
) -> Result<HttpResponse, ApiError> {
    let requests = donation_request_helpers::list_all_requests(&pool, &db, &principal.email, &query)?;
    Ok(HttpResponse::Ok().json(requests))
}

async fn create_request(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    payload: web::Json<NewDonationRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = donation_request_helpers::create_donation_request(
        &pool,
        &db,
        &principal.email,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Created().json(request))
}

async fn get_request(
    _principal: AuthenticatedPrincipal,
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let request = donation_request_helpers::fetch_donation_request(&db, &id)?;
    Ok(HttpResponse::Ok().json(request))
}

async fn confirm_request(
    principal: AuthenticatedPrincipal,
    db: web::Data<Database>,
    id: web::Path<String>,
    payload: web::Json<ConfirmDonation>,
) -> Result<HttpResponse, ApiError> {
    let request = donation_request_helpers::confirm_donation_request(
        &db,
        &id,
        &principal.email,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(request))
}

async fn update_request(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    id: web::Path<String>,
    payload: web::Json<DonationRequestUpdate>,
) -> Result<HttpResponse, ApiError> {
    let request = donation_request_helpers::update_donation_request(
        &pool,
        &db,
        &id,
        &principal.email,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(request))
}

async fn delete_request(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let removed = donation_request_helpers::delete_donation_request(&pool, &db, &id, &principal.email)?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Donation request deleted.",
        "id": removed.id,
    })))
}
