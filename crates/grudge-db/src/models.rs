/// Database row types — these map directly to SQLite rows.
/// Distinct from grudge-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct EnemyRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub twitter_handle: Option<String>,
    pub tweet_url: Option<String>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub created_at: String,
}

pub struct GrievanceRow {
    pub id: String,
    pub enemy_id: String,
    pub reason: String,
    pub tweet_url: Option<String>,
    pub created_at: String,
}

/// Column values for an enemy insert. The id is assigned by the insert, and
/// `created_at` is taken verbatim when given (synced records keep their
/// client-set timestamp) or left to the column default.
pub struct NewEnemy<'a> {
    pub name: &'a str,
    pub nickname: Option<&'a str>,
    pub twitter_handle: Option<&'a str>,
    pub tweet_url: Option<&'a str>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub created_at: Option<&'a str>,
}

pub struct NewGrievance<'a> {
    pub reason: &'a str,
    pub tweet_url: Option<&'a str>,
    pub created_at: Option<&'a str>,
}
