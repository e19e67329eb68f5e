use crate::config::Config;
use crate::error::ApiError;
use crate::helper::funding_helpers;
use crate::middleware::AuthenticatedPrincipal;
use crate::models::{NewFunding, PageQuery, PaymentIntentRequest};
use crate::services::payments::PaymentGateway;
use crate::DbPool;
use actix_web::{web, HttpResponse};
use redb::Database;

pub fn config_funding(cfg: &mut web::ServiceConfig) {
    cfg.route("/create-payment-intent", web::post().to(create_payment_intent))
        .service(
            web::resource("/funding")
                .route(web::get().to(list_funding))
                .route(web::post().to(record_funding)),
        );
}

async fn create_payment_intent(
    principal: AuthenticatedPrincipal,
    gateway: web::Data<dyn PaymentGateway>,
    config: web::Data<Config>,
    payload: web::Json<PaymentIntentRequest>,
) -> Result<HttpResponse, ApiError> {
    let intent = funding_helpers::create_payment_intent(
        gateway.get_ref(),
        &config.payment_currency,
        payload.amount,
    )
    .await?;
    log::info!("Payment intent created for {}", principal.email);
    Ok(HttpResponse::Ok().json(intent))
}

async fn record_funding(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    config: web::Data<Config>,
    payload: web::Json<NewFunding>,
) -> Result<HttpResponse, ApiError> {
    let record = funding_helpers::record_funding(
        &pool,
        &db,
        &principal,
        &config.payment_currency,
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Created().json(record))
}

async fn list_funding(
    _principal: AuthenticatedPrincipal,
    db: web::Data<Database>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(funding_helpers::list_funding(&db, &page)?))
}
