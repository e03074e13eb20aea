use serde::{Deserialize, Serialize};

/// An enemy as held in the client-local mirror. The `id` is client-generated
/// (UUID v4); after a sync the server assigns a fresh id and the local one is
/// discarded. `created_at` is carried as an opaque ISO-8601 string so the
/// client-set timestamp survives persistence and sync byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEnemy {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub twitter_handle: Option<String>,
    pub tweet_url: Option<String>,
    pub created_at: String,
    /// Canvas coordinates for the whiteboard view. Unset until first drag.
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

/// One recorded complaint against an enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalGrievance {
    pub id: String,
    pub enemy_id: String,
    pub reason: String,
    pub tweet_url: Option<String>,
    pub created_at: String,
}

/// Derived view: an enemy plus its grievances. Recomputed on every read,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LocalEnemyWithGrievances {
    #[serde(flatten)]
    pub enemy: LocalEnemy,
    pub grievances: Vec<LocalGrievance>,
    pub grievance_count: usize,
}

/// Full mirror export, and the request body of `POST /sync`. `grievances`
/// may be absent on the wire and defaults to empty; a missing or non-array
/// `enemies` is a malformed request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    pub enemies: Vec<LocalEnemy>,
    #[serde(default)]
    pub grievances: Vec<LocalGrievance>,
}
