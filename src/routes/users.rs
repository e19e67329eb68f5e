use crate::error::ApiError;
use crate::helper::user_helpers;
use crate::helper::validation_helpers::normalize_email;
use crate::middleware::AuthenticatedPrincipal;
use crate::models::{NewUser, UserProfileUpdate};
use crate::DbPool;
use actix_web::{web, HttpResponse};

pub fn config_users(cfg: &mut web::ServiceConfig) {
    cfg.route("/add-user", web::post().to(add_user))
        .service(
            web::resource("/users/{email}")
                .route(web::get().to(get_user))
                .route(web::patch().to(update_user)),
        );
}

/// Login check-in. Unauthenticated, and can never set role or status.
async fn add_user(pool: web::Data<DbPool>, payload: web::Json<NewUser>) -> Result<HttpResponse, ApiError> {
    let outcome = user_helpers::check_in_user(&pool, payload.into_inner())?;
    if outcome.inserted {
        Ok(HttpResponse::Created().json(outcome))
    } else {
        Ok(HttpResponse::Ok().json(outcome))
    }
}

async fn get_user(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    email: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = user_helpers::fetch_user_profile(&pool, &principal.email, &normalize_email(&email))?;
    Ok(HttpResponse::Ok().json(user))
}

async fn update_user(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    email: web::Path<String>,
    payload: web::Json<UserProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let user = user_helpers::update_own_profile(
        &pool,
        &principal.email,
        &normalize_email(&email),
        payload.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(user))
}
