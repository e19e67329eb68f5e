use crate::models::{
    BloodGroup, DonorSearchQuery, NewUser, ParseEnumError, Role, User, UserProfileUpdate, UserStatus,
};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension, Row};
use std::str::FromStr;
use uuid::Uuid;

fn parse_column<T>(value: ValueRef<'_>) -> FromSqlResult<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    value
        .as_str()?
        .parse()
        .map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
}

macro_rules! sql_text_enum {
    ($($name:ty),+) => {
        $(
            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    parse_column(value)
                }
            }

            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }
        )+
    };
}

sql_text_enum!(Role, UserStatus, BloodGroup);

const USER_COLUMNS: &str = "id, email, name, photo_url, blood_group, district, upazila, phone, role, status, login_count, created_at, last_login_time";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| RusqliteError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;
    Ok(User {
        id,
        email: row.get(1)?,
        name: row.get(2)?,
        photo_url: row.get(3)?,
        blood_group: row.get(4)?,
        district: row.get(5)?,
        upazila: row.get(6)?,
        phone: row.get(7)?,
        role: row.get(8)?,
        status: row.get(9)?,
        login_count: row.get(10)?,
        created_at: row.get::<_, DateTime<Utc>>(11)?,
        last_login_time: row.get(12)?,
    })
}

/// Check-in on login: inserts a new donor, or bumps the login counter of an
/// existing user. Returns the stored user and whether it was just created.
pub fn upsert_user_on_login(conn: &Connection, new_user: &NewUser) -> Result<(User, bool), RusqliteError> {
    let now = Utc::now();
    let login_count: i64 = conn.query_row(
        "INSERT INTO users (id, email, name, photo_url, blood_group, district, upazila, phone, role, status, login_count, created_at, last_login_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
         ON CONFLICT(email) DO UPDATE SET login_count = login_count + 1, last_login_time = excluded.last_login_time
         RETURNING login_count",
        params![
            Uuid::new_v4().to_string(),
            new_user.email,
            new_user.name,
            new_user.photo_url,
            new_user.blood_group,
            new_user.district,
            new_user.upazila,
            new_user.phone,
            Role::Donor,
            UserStatus::Active,
            now,
        ],
        |row| row.get(0),
    )?;

    let user = read_user_by_email(conn, &new_user.email)?
        .ok_or(RusqliteError::QueryReturnedNoRows)?;
    Ok((user, login_count == 1))
}

pub fn read_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, RusqliteError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
        [email],
        row_to_user,
    )
    .optional()
}

pub fn read_user_by_id(conn: &Connection, id: &Uuid) -> Result<Option<User>, RusqliteError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        [id.to_string()],
        row_to_user,
    )
    .optional()
}

pub fn read_all_users(conn: &Connection, status: Option<UserStatus>) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at, rowid",
        USER_COLUMNS
    ))?;
    let user_iter = stmt.query_map(params![status], row_to_user)?;

    let mut users = Vec::new();
    for user in user_iter {
        users.push(user?);
    }
    Ok(users)
}

pub fn read_users_by_role(conn: &Connection, role: Role) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE role = ?1 ORDER BY created_at, rowid",
        USER_COLUMNS
    ))?;
    let user_iter = stmt.query_map(params![role], row_to_user)?;

    let mut users = Vec::new();
    for user in user_iter {
        users.push(user?);
    }
    Ok(users)
}

/// Active donors matching every filter that is present.
pub fn search_donors(conn: &Connection, query: &DonorSearchQuery) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users
         WHERE role = ?1 AND status = ?2
           AND (?3 IS NULL OR blood_group = ?3)
           AND (?4 IS NULL OR district = ?4)
           AND (?5 IS NULL OR upazila = ?5)
         ORDER BY created_at, rowid",
        USER_COLUMNS
    ))?;
    let district = query.district.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let upazila = query.upazila.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let user_iter = stmt.query_map(
        params![Role::Donor, UserStatus::Active, query.blood_group, district, upazila],
        row_to_user,
    )?;

    let mut donors = Vec::new();
    for user in user_iter {
        donors.push(user?);
    }
    Ok(donors)
}

/// Applies the present profile fields. Returns the number of rows touched.
pub fn update_profile(conn: &Connection, email: &str, update: &UserProfileUpdate) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE users SET
            name = COALESCE(?1, name),
            photo_url = COALESCE(?2, photo_url),
            blood_group = COALESCE(?3, blood_group),
            district = COALESCE(?4, district),
            upazila = COALESCE(?5, upazila),
            phone = COALESCE(?6, phone)
         WHERE email = ?7",
        params![
            update.name,
            update.photo_url,
            update.blood_group,
            update.district,
            update.upazila,
            update.phone,
            email,
        ],
    )
}

pub fn update_role(conn: &Connection, id: &Uuid, role: Role) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE users SET role = ?1 WHERE id = ?2", params![role, id.to_string()])
}

pub fn update_role_by_email(conn: &Connection, email: &str, role: Role) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE users SET role = ?1 WHERE email = ?2", params![role, email])
}

pub fn update_status(conn: &Connection, id: &Uuid, status: UserStatus) -> Result<usize, RusqliteError> {
    conn.execute("UPDATE users SET status = ?1 WHERE id = ?2", params![status, id.to_string()])
}

pub fn count_users(conn: &Connection, role: Option<Role>) -> Result<i64, RusqliteError> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE (?1 IS NULL OR role = ?1)",
        params![role],
        |row| row.get(0),
    )
}
