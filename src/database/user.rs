use sqlite::State;

use super::{now_millis, Database, DbResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub created_at: i64,
}

impl Database {
    pub async fn get_or_create_user(&self, user_id: &str) -> DbResult<User> {
        self.with_conn(|conn| {
            let mut statement =
                conn.prepare("SELECT user_id, created_at FROM users WHERE user_id = ?")?;
            statement.bind((1, user_id))?;
            if let State::Row = statement.next()? {
                return Ok(User {
                    user_id: statement.read::<String, _>("user_id")?,
                    created_at: statement.read::<i64, _>("created_at")?,
                });
            }

            let user = User {
                user_id: user_id.to_string(),
                created_at: now_millis(),
            };
            let mut insert = conn.prepare("INSERT INTO users (user_id, created_at) VALUES (?, ?)")?;
            insert.bind((1, user_id))?;
            insert.bind((2, user.created_at))?;
            insert.next()?;
            Ok(user)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::database::test_database;

    #[tokio::test]
    async fn test_get_or_create_user() {
        let db = test_database().await;
        let created = db.get_or_create_user("7").await.unwrap();
        assert_eq!(created.user_id, "7");
        assert_eq!(db.get_or_create_user("7").await.unwrap(), created);
    }
}
