use crate::Database;
use crate::models::{EnemyRow, GrievanceRow, NewEnemy, NewGrievance, UserRow};
use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, email, password, created_at FROM users WHERE email = ?1")?;
            stmt.query_row([email], |row| {
                Ok(UserRow {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .optional()
        })
    }

    // -- Enemies --

    /// Insert an enemy under the given owner and return the server-assigned
    /// id. Whatever id the record carried on the client is not consulted.
    pub fn insert_enemy(&self, user_id: &str, enemy: &NewEnemy) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO enemies
                     (id, user_id, name, nickname, twitter_handle, tweet_url,
                      position_x, position_y, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                         COALESCE(?9, datetime('now')))",
                rusqlite::params![
                    id,
                    user_id,
                    enemy.name,
                    enemy.nickname,
                    enemy.twitter_handle,
                    enemy.tweet_url,
                    enemy.position_x,
                    enemy.position_y,
                    enemy.created_at,
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn list_enemies(&self, user_id: &str) -> Result<Vec<EnemyRow>> {
        self.with_conn(|conn| query_enemies(conn, user_id))
    }

    pub fn get_enemy(&self, id: &str, user_id: &str) -> Result<Option<EnemyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, nickname, twitter_handle, tweet_url,
                        position_x, position_y, created_at
                 FROM enemies WHERE id = ?1 AND user_id = ?2",
            )?;
            stmt.query_row([id, user_id], map_enemy_row).optional()
        })
    }

    /// Ownership-scoped position update. Returns the number of rows touched:
    /// 0 means the id does not resolve to a row the caller owns, and nothing
    /// changed.
    pub fn update_enemy_position(
        &self,
        id: &str,
        user_id: &str,
        x: f64,
        y: f64,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE enemies SET position_x = ?3, position_y = ?4
                 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id, x, y],
            )?;
            Ok(affected)
        })
    }

    /// Delete an enemy the caller owns; grievances go with it via the FK
    /// cascade. Returns rows affected (0 = not found or not yours).
    pub fn delete_enemy(&self, id: &str, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM enemies WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(affected)
        })
    }

    // -- Grievances --

    pub fn insert_grievance(&self, enemy_id: &str, grievance: &NewGrievance) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO grievances (id, enemy_id, reason, tweet_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, COALESCE(?5, datetime('now')))",
                rusqlite::params![
                    id,
                    enemy_id,
                    grievance.reason,
                    grievance.tweet_url,
                    grievance.created_at,
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    /// Batch-fetch grievances for a set of enemy ids in one IN query.
    pub fn list_grievances_for_enemies(&self, enemy_ids: &[String]) -> Result<Vec<GrievanceRow>> {
        if enemy_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=enemy_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, enemy_id, reason, tweet_url, created_at
                 FROM grievances WHERE enemy_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = enemy_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(GrievanceRow {
                        id: row.get(0)?,
                        enemy_id: row.get(1)?,
                        reason: row.get(2)?,
                        tweet_url: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete a grievance, with ownership checked through the parent enemy.
    pub fn delete_grievance(&self, id: &str, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM grievances
                 WHERE id = ?1
                   AND enemy_id IN (SELECT id FROM enemies WHERE user_id = ?2)",
                [id, user_id],
            )?;
            Ok(affected)
        })
    }
}

fn query_enemies(conn: &Connection, user_id: &str) -> Result<Vec<EnemyRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, nickname, twitter_handle, tweet_url,
                position_x, position_y, created_at
         FROM enemies
         WHERE user_id = ?1
         ORDER BY created_at DESC",
    )?;

    let rows = stmt
        .query_map([user_id], map_enemy_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_enemy_row(row: &rusqlite::Row) -> std::result::Result<EnemyRow, rusqlite::Error> {
    Ok(EnemyRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        nickname: row.get(3)?,
        twitter_handle: row.get(4)?,
        tweet_url: row.get(5)?,
        position_x: row.get(6)?,
        position_y: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
