use sqlite::{Connection, State};

use super::{now_millis, row_exists, Database, DatabaseError, DbResult};

const ENTITY: &str = "guild";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub guild_id: String,
    pub created_at: i64,
}

fn select(conn: &Connection, guild_id: &str) -> DbResult<Option<Guild>> {
    let mut statement = conn.prepare("SELECT guild_id, created_at FROM guilds WHERE guild_id = ?")?;
    statement.bind((1, guild_id))?;
    if let State::Row = statement.next()? {
        Ok(Some(Guild {
            guild_id: statement.read::<String, _>("guild_id")?,
            created_at: statement.read::<i64, _>("created_at")?,
        }))
    } else {
        Ok(None)
    }
}

fn insert(conn: &Connection, guild_id: &str) -> DbResult<Guild> {
    let guild = Guild {
        guild_id: guild_id.to_string(),
        created_at: now_millis(),
    };
    let mut statement = conn.prepare("INSERT INTO guilds (guild_id, created_at) VALUES (?, ?)")?;
    statement.bind((1, guild.guild_id.as_str()))?;
    statement.bind((2, guild.created_at))?;
    statement.next()?;
    Ok(guild)
}

impl Database {
    pub async fn get_guild(&self, guild_id: &str) -> DbResult<Option<Guild>> {
        self.with_conn(|conn| select(conn, guild_id)).await
    }

    pub async fn create_guild(&self, guild_id: &str) -> DbResult<Guild> {
        self.with_conn(|conn| {
            if row_exists(conn, "SELECT 1 FROM guilds WHERE guild_id = ?", guild_id)? {
                return Err(DatabaseError::AlreadyExists {
                    entity: ENTITY,
                    key: guild_id.to_string(),
                });
            }
            insert(conn, guild_id)
        })
        .await
    }

    /// Fetch the guild record, creating it when missing
    pub async fn get_or_create_guild(&self, guild_id: &str) -> DbResult<Guild> {
        self.with_conn(|conn| match select(conn, guild_id)? {
            Some(guild) => Ok(guild),
            None => insert(conn, guild_id),
        })
        .await
    }
}
