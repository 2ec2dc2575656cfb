use sqlite::{Connection, State, Statement};

use super::{from_flag, now_millis, to_flag, Database, DatabaseError, DbResult};

const ENTITY: &str = "counting";

/// Counting game configuration and progress for a guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counting {
    pub guild_id: String,
    pub channel_id: String,
    pub reset_on_fail: bool,
    pub current_number: i64,
    pub current_number_by: Option<String>,
    pub current_number_at: Option<i64>,
    pub highest_number: i64,
    pub highest_number_by: Option<String>,
    pub highest_number_at: Option<i64>,
}

impl Counting {
    fn new(guild_id: &str, channel_id: &str, reset_on_fail: bool) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            reset_on_fail,
            current_number: 0,
            current_number_by: None,
            current_number_at: None,
            highest_number: 0,
            highest_number_by: None,
            highest_number_at: None,
        }
    }

    /// Advance the count for `user_id`, moving the record when it is beaten
    fn advance(&mut self, user_id: &str, at: i64) {
        self.current_number += 1;
        self.current_number_by = Some(user_id.to_string());
        self.current_number_at = Some(at);
        if self.current_number > self.highest_number {
            self.highest_number = self.current_number;
            self.highest_number_by = Some(user_id.to_string());
            self.highest_number_at = Some(at);
        }
    }

    fn reset_count(&mut self) {
        self.current_number = 0;
        self.current_number_by = None;
        self.current_number_at = None;
    }
}

/// Fields changed by `update_counting`; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountingUpdate {
    pub channel_id: Option<String>,
    pub reset_on_fail: Option<bool>,
}

const COLUMNS: &str = "guild_id, channel_id, reset_on_fail, current_number, current_number_by, \
     current_number_at, highest_number, highest_number_by, highest_number_at";

fn read_row(statement: &Statement<'_>) -> DbResult<Counting> {
    Ok(Counting {
        guild_id: statement.read::<String, _>("guild_id")?,
        channel_id: statement.read::<String, _>("channel_id")?,
        reset_on_fail: from_flag(statement.read::<i64, _>("reset_on_fail")?),
        current_number: statement.read::<i64, _>("current_number")?,
        current_number_by: statement.read::<Option<String>, _>("current_number_by")?,
        current_number_at: statement.read::<Option<i64>, _>("current_number_at")?,
        highest_number: statement.read::<i64, _>("highest_number")?,
        highest_number_by: statement.read::<Option<String>, _>("highest_number_by")?,
        highest_number_at: statement.read::<Option<i64>, _>("highest_number_at")?,
    })
}

fn select(conn: &Connection, guild_id: &str) -> DbResult<Option<Counting>> {
    let mut statement = conn.prepare(format!("SELECT {COLUMNS} FROM counting WHERE guild_id = ?"))?;
    statement.bind((1, guild_id))?;
    match statement.next()? {
        State::Row => Ok(Some(read_row(&statement)?)),
        State::Done => Ok(None),
    }
}

fn select_existing(conn: &Connection, guild_id: &str) -> DbResult<Counting> {
    select(conn, guild_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity: ENTITY,
        key: guild_id.to_string(),
    })
}

/// Insert or overwrite the full row
fn write(conn: &Connection, counting: &Counting) -> DbResult<()> {
    let mut statement = conn.prepare(format!(
        "INSERT OR REPLACE INTO counting ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))?;
    statement.bind((1, counting.guild_id.as_str()))?;
    statement.bind((2, counting.channel_id.as_str()))?;
    statement.bind((3, to_flag(counting.reset_on_fail)))?;
    statement.bind((4, counting.current_number))?;
    statement.bind((5, counting.current_number_by.as_deref()))?;
    statement.bind((6, counting.current_number_at))?;
    statement.bind((7, counting.highest_number))?;
    statement.bind((8, counting.highest_number_by.as_deref()))?;
    statement.bind((9, counting.highest_number_at))?;
    statement.next()?;
    Ok(())
}

impl Database {
    pub async fn get_counting(&self, guild_id: &str) -> DbResult<Option<Counting>> {
        self.with_conn(|conn| select(conn, guild_id)).await
    }

    pub async fn create_counting(
        &self,
        guild_id: &str,
        channel_id: &str,
        reset_on_fail: bool,
    ) -> DbResult<Counting> {
        self.with_conn(|conn| {
            if select(conn, guild_id)?.is_some() {
                return Err(DatabaseError::AlreadyExists {
                    entity: ENTITY,
                    key: guild_id.to_string(),
                });
            }
            let counting = Counting::new(guild_id, channel_id, reset_on_fail);
            write(conn, &counting)?;
            Ok(counting)
        })
        .await
    }

    pub async fn update_counting(&self, guild_id: &str, update: CountingUpdate) -> DbResult<Counting> {
        self.with_conn(|conn| {
            let mut counting = select_existing(conn, guild_id)?;
            if let Some(channel_id) = update.channel_id {
                counting.channel_id = channel_id;
            }
            if let Some(reset_on_fail) = update.reset_on_fail {
                counting.reset_on_fail = reset_on_fail;
            }
            write(conn, &counting)?;
            Ok(counting)
        })
        .await
    }

    /// Remove the guild's counting configuration entirely
    pub async fn delete_counting(&self, guild_id: &str) -> DbResult<Counting> {
        self.with_conn(|conn| {
            let counting = select_existing(conn, guild_id)?;
            let mut statement = conn.prepare("DELETE FROM counting WHERE guild_id = ?")?;
            statement.bind((1, guild_id))?;
            statement.next()?;
            Ok(counting)
        })
        .await
    }

    /// Set the current number back to zero, keeping the configuration and record
    pub async fn reset_counting_count(&self, guild_id: &str) -> DbResult<Counting> {
        self.with_conn(|conn| {
            let mut counting = select_existing(conn, guild_id)?;
            counting.reset_count();
            write(conn, &counting)?;
            Ok(counting)
        })
        .await
    }

    pub async fn increment_counting_count(&self, guild_id: &str, user_id: &str) -> DbResult<Counting> {
        self.with_conn(|conn| {
            let mut counting = select_existing(conn, guild_id)?;
            counting.advance(user_id, now_millis());
            write(conn, &counting)?;
            Ok(counting)
        })
        .await
    }
}
