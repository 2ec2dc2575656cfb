use chrono::NaiveDate;
use sqlite::{Connection, State, Statement};

use super::{from_flag, to_flag, Database, DatabaseError, DbResult};

const GUILD_ENTITY: &str = "guild birthday configuration";
const USER_ENTITY: &str = "user birthday";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a guild's birthday announcements go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildBirthday {
    pub guild_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBirthday {
    pub user_id: String,
    pub date: NaiveDate,
    /// IANA timezone name
    pub timezone: String,
    pub show_age: bool,
    pub announce_in_guilds_by_default: bool,
    pub announce_in_guild_ids: Vec<String>,
}

impl UserBirthday {
    pub fn new(user_id: &str, date: NaiveDate, timezone: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
            timezone: timezone.to_string(),
            show_age: false,
            announce_in_guilds_by_default: true,
            announce_in_guild_ids: Vec::new(),
        }
    }
}

/// Fields changed by `update_user_birthday`; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserBirthdayUpdate {
    pub date: Option<NaiveDate>,
    pub timezone: Option<String>,
    pub show_age: Option<bool>,
    pub announce_in_guilds_by_default: Option<bool>,
    pub announce_in_guild_ids: Option<Vec<String>>,
}

impl UserBirthdayUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(self, birthday: &mut UserBirthday) {
        if let Some(date) = self.date {
            birthday.date = date;
        }
        if let Some(timezone) = self.timezone {
            birthday.timezone = timezone;
        }
        if let Some(show_age) = self.show_age {
            birthday.show_age = show_age;
        }
        if let Some(by_default) = self.announce_in_guilds_by_default {
            birthday.announce_in_guilds_by_default = by_default;
        }
        if let Some(guild_ids) = self.announce_in_guild_ids {
            birthday.announce_in_guild_ids = guild_ids;
        }
    }
}

fn select_guild(conn: &Connection, guild_id: &str) -> DbResult<Option<GuildBirthday>> {
    let mut statement =
        conn.prepare("SELECT guild_id, channel_id FROM guild_birthdays WHERE guild_id = ?")?;
    statement.bind((1, guild_id))?;
    match statement.next()? {
        State::Row => Ok(Some(GuildBirthday {
            guild_id: statement.read::<String, _>("guild_id")?,
            channel_id: statement.read::<String, _>("channel_id")?,
        })),
        State::Done => Ok(None),
    }
}

fn write_guild(conn: &Connection, config: &GuildBirthday) -> DbResult<()> {
    let mut statement = conn
        .prepare("INSERT OR REPLACE INTO guild_birthdays (guild_id, channel_id) VALUES (?, ?)")?;
    statement.bind((1, config.guild_id.as_str()))?;
    statement.bind((2, config.channel_id.as_str()))?;
    statement.next()?;
    Ok(())
}

fn guild_not_found(guild_id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: GUILD_ENTITY,
        key: guild_id.to_string(),
    }
}

fn read_user_row(statement: &Statement<'_>) -> DbResult<UserBirthday> {
    let user_id = statement.read::<String, _>("user_id")?;
    let corrupt = |reason: String| DatabaseError::Corrupt {
        entity: USER_ENTITY,
        key: user_id.clone(),
        reason,
    };

    let raw_date = statement.read::<String, _>("date")?;
    let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|e| corrupt(format!("date '{raw_date}': {e}")))?;
    let raw_guilds = statement.read::<String, _>("announce_in_guild_ids")?;
    let announce_in_guild_ids: Vec<String> = serde_json::from_str(&raw_guilds)
        .map_err(|e| corrupt(format!("guild list: {e}")))?;

    Ok(UserBirthday {
        date,
        timezone: statement.read::<String, _>("timezone")?,
        show_age: from_flag(statement.read::<i64, _>("show_age")?),
        announce_in_guilds_by_default: from_flag(
            statement.read::<i64, _>("announce_in_guilds_by_default")?,
        ),
        announce_in_guild_ids,
        user_id,
    })
}

fn select_user(conn: &Connection, user_id: &str) -> DbResult<Option<UserBirthday>> {
    let mut statement = conn.prepare(
        "SELECT user_id, date, timezone, show_age, announce_in_guilds_by_default, \
         announce_in_guild_ids FROM user_birthdays WHERE user_id = ?",
    )?;
    statement.bind((1, user_id))?;
    match statement.next()? {
        State::Row => Ok(Some(read_user_row(&statement)?)),
        State::Done => Ok(None),
    }
}

fn write_user(conn: &Connection, birthday: &UserBirthday) -> DbResult<()> {
    let guild_ids =
        serde_json::to_string(&birthday.announce_in_guild_ids).map_err(|e| DatabaseError::Corrupt {
            entity: USER_ENTITY,
            key: birthday.user_id.clone(),
            reason: e.to_string(),
        })?;
    let date = birthday.date.format(DATE_FORMAT).to_string();

    let mut statement = conn.prepare(
        "INSERT OR REPLACE INTO user_birthdays (user_id, date, timezone, show_age, \
         announce_in_guilds_by_default, announce_in_guild_ids) VALUES (?, ?, ?, ?, ?, ?)",
    )?;
    statement.bind((1, birthday.user_id.as_str()))?;
    statement.bind((2, date.as_str()))?;
    statement.bind((3, birthday.timezone.as_str()))?;
    statement.bind((4, to_flag(birthday.show_age)))?;
    statement.bind((5, to_flag(birthday.announce_in_guilds_by_default)))?;
    statement.bind((6, guild_ids.as_str()))?;
    statement.next()?;
    Ok(())
}

fn user_not_found(user_id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: USER_ENTITY,
        key: user_id.to_string(),
    }
}

impl Database {
    pub async fn get_guild_birthday(&self, guild_id: &str) -> DbResult<Option<GuildBirthday>> {
        self.with_conn(|conn| select_guild(conn, guild_id)).await
    }

    pub async fn create_guild_birthday(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> DbResult<GuildBirthday> {
        self.with_conn(|conn| {
            if select_guild(conn, guild_id)?.is_some() {
                return Err(DatabaseError::AlreadyExists {
                    entity: GUILD_ENTITY,
                    key: guild_id.to_string(),
                });
            }
            let config = GuildBirthday {
                guild_id: guild_id.to_string(),
                channel_id: channel_id.to_string(),
            };
            write_guild(conn, &config)?;
            Ok(config)
        })
        .await
    }

    pub async fn update_guild_birthday(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> DbResult<GuildBirthday> {
        self.with_conn(|conn| {
            let mut config = select_guild(conn, guild_id)?.ok_or_else(|| guild_not_found(guild_id))?;
            config.channel_id = channel_id.to_string();
            write_guild(conn, &config)?;
            Ok(config)
        })
        .await
    }

    pub async fn delete_guild_birthday(&self, guild_id: &str) -> DbResult<GuildBirthday> {
        self.with_conn(|conn| {
            let config = select_guild(conn, guild_id)?.ok_or_else(|| guild_not_found(guild_id))?;
            let mut statement = conn.prepare("DELETE FROM guild_birthdays WHERE guild_id = ?")?;
            statement.bind((1, guild_id))?;
            statement.next()?;
            Ok(config)
        })
        .await
    }

    pub async fn get_user_birthday(&self, user_id: &str) -> DbResult<Option<UserBirthday>> {
        self.with_conn(|conn| select_user(conn, user_id)).await
    }

    pub async fn create_user_birthday(&self, birthday: UserBirthday) -> DbResult<UserBirthday> {
        self.with_conn(move |conn| {
            if select_user(conn, &birthday.user_id)?.is_some() {
                return Err(DatabaseError::AlreadyExists {
                    entity: USER_ENTITY,
                    key: birthday.user_id.clone(),
                });
            }
            write_user(conn, &birthday)?;
            Ok(birthday)
        })
        .await
    }

    pub async fn update_user_birthday(
        &self,
        user_id: &str,
        update: UserBirthdayUpdate,
    ) -> DbResult<UserBirthday> {
        self.with_conn(move |conn| {
            let mut birthday = select_user(conn, user_id)?.ok_or_else(|| user_not_found(user_id))?;
            update.apply(&mut birthday);
            write_user(conn, &birthday)?;
            Ok(birthday)
        })
        .await
    }

    pub async fn delete_user_birthday(&self, user_id: &str) -> DbResult<UserBirthday> {
        self.with_conn(|conn| {
            let birthday = select_user(conn, user_id)?.ok_or_else(|| user_not_found(user_id))?;
            let mut statement = conn.prepare("DELETE FROM user_birthdays WHERE user_id = ?")?;
            statement.bind((1, user_id))?;
            statement.next()?;
            Ok(birthday)
        })
        .await
    }
}
