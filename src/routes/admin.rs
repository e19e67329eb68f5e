use crate::error::ApiError;
use crate::helper::{stats_helpers, user_helpers};
use crate::middleware::AuthenticatedPrincipal;
use crate::models::{RoleUpdate, UserStatus, UserStatusUpdate};
use crate::DbPool;
use actix_web::{web, HttpResponse};
use redb::Database;
use serde::Deserialize;

#[derive(Deserialize)]
struct UserListQuery {
    status: Option<UserStatus>,
}

pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.route("/get-users", web::get().to(get_users))
        .route("/update-users/status/{id}", web::patch().to(update_user_status))
        .route("/update-users/role/{id}", web::patch().to(update_user_role))
        .route("/admin-stats", web::get().to(admin_stats))
        .route("/dashboard-stats", web::get().to(dashboard_stats));
}

async fn get_users(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    let users = user_helpers::fetch_all_users(&pool, &principal.email, query.status)?;
    Ok(HttpResponse::Ok().json(users))
}

async fn update_user_status(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    id: web::Path<String>,
    payload: web::Json<UserStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let user = user_helpers::set_user_status(&pool, &principal.email, &id, payload.status)?;
    Ok(HttpResponse::Ok().json(user))
}

async fn update_user_role(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    id: web::Path<String>,
    payload: web::Json<RoleUpdate>,
) -> Result<HttpResponse, ApiError> {
    let user = user_helpers::set_user_role(&pool, &principal.email, &id, payload.role)?;
    Ok(HttpResponse::Ok().json(user))
}

async fn admin_stats(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(stats_helpers::admin_stats(&pool, &db, &principal.email)?))
}

async fn dashboard_stats(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(stats_helpers::dashboard_stats(&pool, &db, &principal.email)?))
}
