use crate::error::ApiError;
use crate::helper::blog_helpers;
use crate::middleware::AuthenticatedPrincipal;
use crate::models::{BlogQuery, BlogStatusUpdate, BlogUpdate, NewBlogPost, PageQuery};
use crate::DbPool;
use actix_web::{web, HttpResponse};
use redb::Database;
use serde_json::json;

pub fn config_blogs(cfg: &mut web::ServiceConfig) {
    cfg.route("/blogs/published", web::get().to(list_published))
        .route("/blogs/public/{id}", web::get().to(get_published))
        .service(
            web::resource("/blogs")
                .route(web::get().to(list_posts))
                .route(web::post().to(create_post)),
        )
        .route("/blogs/{id}/status", web::patch().to(set_status))
        .service(
            web::resource("/blogs/{id}")
                .route(web::get().to(get_post))
                .route(web::patch().to(update_post))
                .route(web::delete().to(delete_post)),
        );
}

async fn list_published(db: web::Data<Database>, page: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(blog_helpers::list_published_posts(&db, &page)?))
}

async fn get_published(db: web::Data<Database>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(blog_helpers::fetch_published_post(&db, &id)?))
}

async fn list_posts(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    query: web::Query<BlogQuery>,
) -> Result<HttpResponse, ApiError> {
    let posts = blog_helpers::list_blog_posts(&pool, &db, &principal.email, &query)?;
    Ok(HttpResponse::Ok().json(posts))
}

async fn create_post(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    payload: web::Json<NewBlogPost>,
) -> Result<HttpResponse, ApiError> {
    let post = blog_helpers::create_blog_post(&pool, &db, &principal.email, payload.into_inner())?;
    Ok(HttpResponse::Created().json(post))
}

async fn get_post(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(blog_helpers::fetch_blog_post(&pool, &db, &principal.email, &id)?))
}

async fn update_post(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    id: web::Path<String>,
    payload: web::Json<BlogUpdate>,
) -> Result<HttpResponse, ApiError> {
    let post = blog_helpers::update_blog_post(&pool, &db, &principal.email, &id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(post))
}

async fn set_status(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    id: web::Path<String>,
    payload: web::Json<BlogStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let post = blog_helpers::set_blog_status(&pool, &db, &principal.email, &id, payload.status)?;
    Ok(HttpResponse::Ok().json(post))
}

async fn delete_post(
    principal: AuthenticatedPrincipal,
    pool: web::Data<DbPool>,
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let removed = blog_helpers::delete_blog_post(&pool, &db, &principal.email, &id)?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Blog post deleted.", "id": removed.id })))
}
