use crate::models::db_operations::records_db_operations;
use crate::models::db_operations::DbError;
use crate::models::{BlogPost, DonationRequest, FundingRecord};
use redb::Database;
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Records database error: {0}")]
    Records(#[from] DbError),
}

pub fn setup_users_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    println!("- Creating 'users' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            photo_url TEXT,
            blood_group TEXT CHECK(blood_group IN ('A+', 'A-', 'B+', 'B-', 'AB+', 'AB-', 'O+', 'O-')),
            district TEXT,
            upazila TEXT,
            phone TEXT,
            role TEXT NOT NULL DEFAULT 'donor' CHECK(role IN ('donor', 'volunteer', 'admin')),
            status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'blocked')),
            login_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_login_time TEXT
        )",
        [],
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_donor_search ON users (role, status, blood_group, district)",
        [],
    )?;

    tx.commit()?;
    Ok(())
}

pub fn setup_records_db(db: &Database) -> Result<(), SetupError> {
    println!("- Creating donation request tables...");
    records_db_operations::create_tables::<DonationRequest>(db)?;

    println!("- Creating blog post tables...");
    records_db_operations::create_tables::<BlogPost>(db)?;

    println!("- Creating funding tables...");
    records_db_operations::create_tables::<FundingRecord>(db)?;
    Ok(())
}
