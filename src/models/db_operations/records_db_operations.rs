//! JSON document collections stored in redb.
//!
//! Every collection is a pair of tables: the documents keyed by their UUID
//! bytes, and a chronological index keyed by `(-created_at_micros, id)`. A
//! forward scan of the index therefore yields newest-first, and because ids
//! are UUIDv7 two documents created in the same microsecond keep their
//! insertion order.

use super::DbError;
use crate::models::{BlogPost, DonationRequest, FundingRecord};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub struct Collection {
    pub name: &'static str,
    pub documents: TableDefinition<'static, &'static [u8; 16], &'static str>,
    pub chronological_index: TableDefinition<'static, (i64, &'static [u8; 16]), ()>,
}

pub const DONATION_REQUESTS: Collection = Collection {
    name: "donation_requests",
    documents: TableDefinition::new("donation_requests"),
    chronological_index: TableDefinition::new("donation_requests_chronological_index"),
};

pub const BLOG_POSTS: Collection = Collection {
    name: "blog_posts",
    documents: TableDefinition::new("blog_posts"),
    chronological_index: TableDefinition::new("blog_posts_chronological_index"),
};

pub const FUNDING: Collection = Collection {
    name: "funding",
    documents: TableDefinition::new("funding"),
    chronological_index: TableDefinition::new("funding_chronological_index"),
};

/// A record that lives in one of the collections above.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;

    /// Must never change after insertion, the index key is derived from it.
    fn created_at(&self) -> DateTime<Utc>;
}

impl Document for DonationRequest {
    const COLLECTION: Collection = DONATION_REQUESTS;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Document for BlogPost {
    const COLLECTION: Collection = BLOG_POSTS;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Document for FundingRecord {
    const COLLECTION: Collection = FUNDING;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

fn index_timestamp<D: Document>(document: &D) -> i64 {
    -document.created_at().timestamp_micros()
}

/// Creates both tables of a collection. Safe to call on an existing database.
pub fn create_tables<D: Document>(db: &Database) -> Result<(), DbError> {
    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(D::COLLECTION.documents)?;
        write_txn.open_table(D::COLLECTION.chronological_index)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn insert<D: Document>(db: &Database, document: &D) -> Result<(), DbError> {
    let id_bytes = document.id().into_bytes();
    let document_json = serde_json::to_string(document)?;

    let write_txn = db.begin_write()?;
    {
        let mut documents = write_txn.open_table(D::COLLECTION.documents)?;
        let mut chrono_index = write_txn.open_table(D::COLLECTION.chronological_index)?;

        documents.insert(&id_bytes, document_json.as_str())?;
        chrono_index.insert((index_timestamp(document), &id_bytes), ())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn find_by_id<D: Document>(db: &Database, id: &Uuid) -> Result<Option<D>, DbError> {
    let read_txn = db.begin_read()?;
    let documents = read_txn.open_table(D::COLLECTION.documents)?;

    let found = match documents.get(id.as_bytes())? {
        Some(guard) => Some(serde_json::from_str(guard.value())?),
        None => None,
    };
    Ok(found)
}

/// Scans a collection newest-first, keeping documents accepted by `filter`.
/// A `limit` of `None` or `Some(0)` means unbounded.
pub fn find_newest_first<D, F>(
    db: &Database,
    filter: F,
    offset: usize,
    limit: Option<usize>,
) -> Result<Vec<D>, DbError>
where
    D: Document,
    F: Fn(&D) -> bool,
{
    let read_txn = db.begin_read()?;
    let chrono_index = read_txn.open_table(D::COLLECTION.chronological_index)?;
    let documents = read_txn.open_table(D::COLLECTION.documents)?;
    let limit = limit.filter(|l| *l > 0).unwrap_or(usize::MAX);

    let mut matched = Vec::new();
    let mut skipped = 0usize;
    for item_result in chrono_index.iter()? {
        if matched.len() >= limit {
            break;
        }
        let (key, _value) = item_result?;
        let id_bytes: [u8; 16] = *key.value().1;

        let Some(document_guard) = documents.get(&id_bytes)? else {
            log::warn!(
                "Chronological index of '{}' points at missing document {}",
                D::COLLECTION.name,
                Uuid::from_bytes(id_bytes)
            );
            continue;
        };
        let document: D = serde_json::from_str(document_guard.value())?;

        if !filter(&document) {
            continue;
        }
        if skipped < offset {
            skipped += 1;
            continue;
        }
        matched.push(document);
    }
    Ok(matched)
}

pub fn count<D, F>(db: &Database, filter: F) -> Result<usize, DbError>
where
    D: Document,
    F: Fn(&D) -> bool,
{
    let read_txn = db.begin_read()?;
    let documents = read_txn.open_table(D::COLLECTION.documents)?;

    let mut total = 0usize;
    for item_result in documents.iter()? {
        let (_id, document_guard) = item_result?;
        let document: D = serde_json::from_str(document_guard.value())?;
        if filter(&document) {
            total += 1;
        }
    }
    Ok(total)
}

/// Reads, mutates and writes back one document inside a single write
/// transaction. redb admits one writer at a time, so whatever `mutate` checks
/// still holds when the new version is committed. If `mutate` rejects the
/// document, the transaction is aborted and nothing is written.
pub fn modify<D, E, F>(db: &Database, id: &Uuid, mutate: F) -> Result<D, E>
where
    D: Document,
    E: From<DbError>,
    F: FnOnce(&mut D) -> Result<(), E>,
{
    let id_bytes = id.into_bytes();
    let write_txn = db.begin_write().map_err(DbError::from)?;

    let outcome = (|| -> Result<Result<D, E>, DbError> {
        let mut documents = write_txn.open_table(D::COLLECTION.documents)?;
        let mut document: D = {
            let guard = documents
                .get(&id_bytes)?
                .ok_or_else(|| DbError::NotFound(id.to_string()))?;
            serde_json::from_str(guard.value())?
        };
        let created_at = document.created_at();

        if let Err(rejection) = mutate(&mut document) {
            return Ok(Err(rejection));
        }
        debug_assert_eq!(created_at, document.created_at());

        let document_json = serde_json::to_string(&document)?;
        documents.insert(&id_bytes, document_json.as_str())?;
        Ok(Ok(document))
    })();

    match outcome {
        Ok(Ok(document)) => {
            write_txn.commit().map_err(DbError::from)?;
            Ok(document)
        }
        Ok(Err(rejection)) => {
            write_txn.abort().map_err(DbError::from)?;
            Err(rejection)
        }
        // Dropping the uncommitted transaction rolls it back.
        Err(e) => Err(e.into()),
    }
}

/// Deletes one document after `guard` approves it, inside a single write
/// transaction. Returns the removed document.
pub fn remove<D, E, F>(db: &Database, id: &Uuid, guard: F) -> Result<D, E>
where
    D: Document,
    E: From<DbError>,
    F: FnOnce(&D) -> Result<(), E>,
{
    let id_bytes = id.into_bytes();
    let write_txn = db.begin_write().map_err(DbError::from)?;

    let outcome = (|| -> Result<Result<D, E>, DbError> {
        let mut documents = write_txn.open_table(D::COLLECTION.documents)?;
        let mut chrono_index = write_txn.open_table(D::COLLECTION.chronological_index)?;

        let document: D = {
            let document_guard = documents
                .get(&id_bytes)?
                .ok_or_else(|| DbError::NotFound(id.to_string()))?;
            serde_json::from_str(document_guard.value())?
        };

        if let Err(rejection) = guard(&document) {
            return Ok(Err(rejection));
        }

        documents.remove(&id_bytes)?;
        chrono_index.remove((index_timestamp(&document), &id_bytes))?;
        Ok(Ok(document))
    })();

    match outcome {
        Ok(Ok(document)) => {
            write_txn.commit().map_err(DbError::from)?;
            Ok(document)
        }
        Ok(Err(rejection)) => {
            write_txn.abort().map_err(DbError::from)?;
            Err(rejection)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlogStatus;
    use crate::setup::db_setup;
    use chrono::Duration;

    fn temp_records_db() -> Database {
        let dir = std::env::temp_dir().join(format!("bloodlink-records-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let db = Database::create(dir.join("records.db")).unwrap();
        db_setup::setup_records_db(&db).unwrap();
        db
    }

    fn post(title: &str, created_at: DateTime<Utc>) -> BlogPost {
        BlogPost {
            id: Uuid::now_v7(),
            title: title.to_string(),
            thumbnail: None,
            content: "body".to_string(),
            status: BlogStatus::Draft,
            author_email: "v@x.com".to_string(),
            created_at,
            updated_at: None,
        }
    }

    #[test]
    fn scans_newest_first_with_ties_in_insertion_order() {
        let db = temp_records_db();
        let base = Utc::now();
        insert(&db, &post("old", base - Duration::hours(1))).unwrap();
        insert(&db, &post("tie-first", base)).unwrap();
        insert(&db, &post("tie-second", base)).unwrap();
        insert(&db, &post("new", base + Duration::hours(1))).unwrap();

        let titles: Vec<String> = find_newest_first::<BlogPost, _>(&db, |_| true, 0, None)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["new", "tie-first", "tie-second", "old"]);
    }

    #[test]
    fn offset_and_limit_apply_after_filter() {
        let db = temp_records_db();
        let base = Utc::now();
        for i in 0..6 {
            let mut p = post(&format!("p{}", i), base + Duration::seconds(i));
            if i % 2 == 0 {
                p.status = BlogStatus::Published;
            }
            insert(&db, &p).unwrap();
        }

        let published = |p: &BlogPost| p.status == BlogStatus::Published;
        let page = find_newest_first::<BlogPost, _>(&db, published, 1, Some(1)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "p2");
        assert_eq!(count::<BlogPost, _>(&db, published).unwrap(), 3);
    }

    #[test]
    fn rejected_modification_writes_nothing() {
        let db = temp_records_db();
        let original = post("keep", Utc::now());
        insert(&db, &original).unwrap();

        let result: Result<BlogPost, DbError> = modify(&db, &original.id, |p: &mut BlogPost| {
            p.title = "changed".to_string();
            Err(DbError::NotFound("rejected".to_string()))
        });
        assert!(result.is_err());

        let stored: BlogPost = find_by_id(&db, &original.id).unwrap().unwrap();
        assert_eq!(stored.title, "keep");
    }

    #[test]
    fn modify_and_remove_report_missing_documents() {
        let db = temp_records_db();
        let missing = Uuid::now_v7();

        let modified: Result<BlogPost, DbError> = modify(&db, &missing, |_: &mut BlogPost| Ok(()));
        assert!(matches!(modified, Err(DbError::NotFound(_))));

        let removed: Result<BlogPost, DbError> = remove(&db, &missing, |_: &BlogPost| Ok(()));
        assert!(matches!(removed, Err(DbError::NotFound(_))));
    }

    #[test]
    fn remove_drops_document_and_index_entry() {
        let db = temp_records_db();
        let doomed = post("doomed", Utc::now());
        insert(&db, &doomed).unwrap();

        let removed: BlogPost = remove::<BlogPost, DbError, _>(&db, &doomed.id, |_| Ok(())).unwrap();
        assert_eq!(removed.title, "doomed");
        assert!(find_by_id::<BlogPost>(&db, &doomed.id).unwrap().is_none());
        assert!(find_newest_first::<BlogPost, _>(&db, |_| true, 0, None).unwrap().is_empty());
    }
}
