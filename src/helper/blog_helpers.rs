use crate::error::ApiError;
use crate::helper::authorization_helpers::{self, ADMIN_ONLY, ADMIN_OR_VOLUNTEER};
use crate::helper::sanitization_helpers::{sanitize_post_content, strip_all_html};
use crate::helper::validation_helpers::{optional_text, parse_record_id, public_page_size, require_text};
use crate::models::db_operations::records_db_operations;
use crate::models::{BlogPost, BlogQuery, BlogStatus, BlogUpdate, NewBlogPost, PageQuery};
use crate::DbPool;
use chrono::Utc;
use redb::Database;
use uuid::Uuid;

fn clean_title(raw: &str) -> Result<String, ApiError> {
    require_text("title", &strip_all_html(raw))
}

fn clean_content(raw: &str) -> Result<String, ApiError> {
    require_text("content", &sanitize_post_content(raw))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Blog post not found.".to_string())
}

pub fn create_blog_post(
    pool: &DbPool,
    db: &Database,
    caller_email: &str,
    payload: NewBlogPost,
) -> Result<BlogPost, ApiError> {
    let author = authorization_helpers::require_role(pool, caller_email, ADMIN_OR_VOLUNTEER)?;

    let post = BlogPost {
        id: Uuid::now_v7(),
        title: clean_title(&payload.title)?,
        thumbnail: optional_text("thumbnail", payload.thumbnail)?,
        content: clean_content(&payload.content)?,
        status: BlogStatus::Draft,
        author_email: author.email,
        created_at: Utc::now(),
        updated_at: None,
    };
    records_db_operations::insert(db, &post)?;
    log::info!("Blog post {} drafted by {}", post.id, post.author_email);
    Ok(post)
}

pub fn list_blog_posts(
    pool: &DbPool,
    db: &Database,
    caller_email: &str,
    query: &BlogQuery,
) -> Result<Vec<BlogPost>, ApiError> {
    authorization_helpers::require_role(pool, caller_email, ADMIN_OR_VOLUNTEER)?;
    let status = query.status;
    Ok(records_db_operations::find_newest_first(
        db,
        |post: &BlogPost| status.map_or(true, |s| post.status == s),
        query.offset.unwrap_or(0),
        query.limit,
    )?)
}

pub fn fetch_blog_post(pool: &DbPool, db: &Database, caller_email: &str, raw_id: &str) -> Result<BlogPost, ApiError> {
    let id = parse_record_id(raw_id)?;
    authorization_helpers::require_role(pool, caller_email, ADMIN_OR_VOLUNTEER)?;
    records_db_operations::find_by_id(db, &id)?.ok_or_else(not_found)
}

pub fn update_blog_post(
    pool: &DbPool,
    db: &Database,
    caller_email: &str,
    raw_id: &str,
    update: BlogUpdate,
) -> Result<BlogPost, ApiError> {
    let id = parse_record_id(raw_id)?;
    authorization_helpers::require_role(pool, caller_email, ADMIN_OR_VOLUNTEER)?;

    let title = update.title.as_deref().map(clean_title).transpose()?;
    let content = update.content.as_deref().map(clean_content).transpose()?;
    let thumbnail = optional_text("thumbnail", update.thumbnail)?;

    Ok(records_db_operations::modify(db, &id, |post: &mut BlogPost| -> Result<(), ApiError> {
        if title.is_none() && content.is_none() && thumbnail.is_none() {
            return Ok(());
        }
        if let Some(title) = title { post.title = title; }
        if let Some(content) = content { post.content = content; }
        if let Some(thumbnail) = thumbnail { post.thumbnail = Some(thumbnail); }
        post.updated_at = Some(Utc::now());
        Ok(())
    })?)
}

pub fn set_blog_status(
    pool: &DbPool,
    db: &Database,
    caller_email: &str,
    raw_id: &str,
    status: BlogStatus,
) -> Result<BlogPost, ApiError> {
    let id = parse_record_id(raw_id)?;
    authorization_helpers::require_role(pool, caller_email, ADMIN_ONLY)?;

    let post = records_db_operations::modify(db, &id, |post: &mut BlogPost| -> Result<(), ApiError> {
        if post.status != status {
            post.status = status;
            post.updated_at = Some(Utc::now());
        }
        Ok(())
    })?;
    log::info!("Blog post {} is now {}", post.id, post.status);
    Ok(post)
}

pub fn delete_blog_post(pool: &DbPool, db: &Database, caller_email: &str, raw_id: &str) -> Result<BlogPost, ApiError> {
    let id = parse_record_id(raw_id)?;
    authorization_helpers::require_role(pool, caller_email, ADMIN_ONLY)?;
    let removed = records_db_operations::remove(db, &id, |_: &BlogPost| -> Result<(), ApiError> { Ok(()) })?;
    log::info!("Blog post {} deleted by {}", removed.id, caller_email);
    Ok(removed)
}

pub fn list_published_posts(db: &Database, page: &PageQuery) -> Result<Vec<BlogPost>, ApiError> {
    Ok(records_db_operations::find_newest_first(
        db,
        |post: &BlogPost| post.status == BlogStatus::Published,
        page.offset.unwrap_or(0),
        Some(public_page_size(page.limit)),
    )?)
}

/// Drafts are indistinguishable from missing posts for the public.
pub fn fetch_published_post(db: &Database, raw_id: &str) -> Result<BlogPost, ApiError> {
    let id = parse_record_id(raw_id)?;
    records_db_operations::find_by_id::<BlogPost>(db, &id)?
        .filter(|post| post.status == BlogStatus::Published)
        .ok_or_else(not_found)
}
