//! # Database
//!
//! SQLite persistence for guilds, users, the counting game and birthdays.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! Every operation takes the connection lock, runs synchronously and returns;
//! statements never live across an `.await`.

mod birthday;
mod counting;
mod guild;
mod user;

pub use birthday::{GuildBirthday, UserBirthday, UserBirthdayUpdate};
pub use counting::{Counting, CountingUpdate};
pub use guild::Guild;
pub use user::User;

use log::info;
use sqlite::Connection;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} '{key}' already exists")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("stored {entity} '{key}' is corrupt: {reason}")]
    Corrupt {
        entity: &'static str,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Sqlite(#[from] sqlite::Error),
}

pub type DbResult<T> = Result<T, DatabaseError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS guilds (
        guild_id TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS counting (
        guild_id TEXT PRIMARY KEY,
        channel_id TEXT NOT NULL,
        reset_on_fail INTEGER NOT NULL DEFAULT 0,
        current_number INTEGER NOT NULL DEFAULT 0,
        current_number_by TEXT,
        current_number_at INTEGER,
        highest_number INTEGER NOT NULL DEFAULT 0,
        highest_number_by TEXT,
        highest_number_at INTEGER
    );
    CREATE TABLE IF NOT EXISTS guild_birthdays (
        guild_id TEXT PRIMARY KEY,
        channel_id TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS user_birthdays (
        user_id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        timezone TEXT NOT NULL,
        show_age INTEGER NOT NULL DEFAULT 0,
        announce_in_guilds_by_default INTEGER NOT NULL DEFAULT 1,
        announce_in_guild_ids TEXT NOT NULL DEFAULT '[]'
    );
";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and apply the schema
    ///
    /// `":memory:"` gives a private in-memory database.
    pub async fn new(path: &str) -> DbResult<Self> {
        let conn = sqlite::open(path)?;
        conn.execute(SCHEMA)?;
        info!("🗄️ Database ready at {}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> DbResult<T> + Send,
    ) -> DbResult<T> {
        let conn = self.conn.lock().await;
        f(&conn)
    }
}

/// Whether `sql` (a single-key SELECT) yields a row
fn row_exists(conn: &Connection, sql: &str, key: &str) -> DbResult<bool> {
    let mut statement = conn.prepare(sql)?;
    statement.bind((1, key))?;
    Ok(matches!(statement.next()?, sqlite::State::Row))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn to_flag(value: bool) -> i64 {
    i64::from(value)
}

fn from_flag(value: i64) -> bool {
    value != 0
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    Database::new(":memory:").await.unwrap()
}

/// In-memory database missing `table`, so every query against it fails
#[cfg(test)]
pub(crate) async fn test_database_without(table: &str) -> Database {
    let db = test_database().await;
    let sql = format!("DROP TABLE {table}");
    db.with_conn(|conn| Ok(conn.execute(sql)?)).await.unwrap();
    db
}
