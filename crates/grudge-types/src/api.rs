use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared by the REST middleware and the client library.
/// Canonical definition lives here in grudge-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

// -- Sync --

/// Response of `POST /sync`. Field names match the original wire contract,
/// hence the camelCase counters. `success` is true whenever the request
/// itself was well-formed and authorized, even if zero records transferred;
/// per-record failures only show up as lower counts.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(rename = "syncedEnemies")]
    pub synced_enemies: usize,
    #[serde(rename = "syncedGrievances")]
    pub synced_grievances: usize,
}

// -- Position --

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionRequest {
    #[serde(rename = "enemyId")]
    pub enemy_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionResponse {
    pub success: bool,
}

// -- Enemies --

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEnemyRequest {
    pub name: String,
    pub nickname: Option<String>,
    pub twitter_handle: Option<String>,
    pub tweet_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnemyResponse {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub twitter_handle: Option<String>,
    pub tweet_url: Option<String>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub created_at: String,
    pub grievances: Vec<GrievanceResponse>,
    pub grievance_count: usize,
}

// -- Grievances --

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGrievanceRequest {
    pub reason: String,
    pub tweet_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrievanceResponse {
    pub id: String,
    pub enemy_id: String,
    pub reason: String,
    pub tweet_url: Option<String>,
    pub created_at: String,
}
