use crate::error::ApiError;
use crate::helper::user_helpers;
use crate::models::DonorSearchQuery;
use crate::DbPool;
use actix_web::{web, HttpResponse, Responder};

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root_handler))
        .route("/search-donors", web::get().to(search_donors));
}

async fn root_handler() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("BloodLink server is running")
}

async fn search_donors(
    pool: web::Data<DbPool>,
    query: web::Query<DonorSearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let donors = user_helpers::search_donors(&pool, &query)?;
    Ok(HttpResponse::Ok().json(donors))
}
