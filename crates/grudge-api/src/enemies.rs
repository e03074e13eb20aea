use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use grudge_types::api::{Claims, CreateEnemyRequest, EnemyResponse, GrievanceResponse};
use grudge_types::twitter::clean_twitter_handle;

use crate::auth::AppState;
use crate::error::ApiError;

/// `GET /enemies` — the caller's enemies with their grievances, most recent
/// first. Server analog of the local mirror's list view.
pub async fn list_enemies(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();

    let rows = state
        .db
        .list_enemies(&user_id)
        .map_err(|e| ApiError::internal("Failed to load enemies", e))?;

    let enemy_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let grievance_rows = state
        .db
        .list_grievances_for_enemies(&enemy_ids)
        .map_err(|e| ApiError::internal("Failed to load enemies", e))?;

    // Group grievances by enemy_id
    let mut by_enemy: HashMap<String, Vec<GrievanceResponse>> = HashMap::new();
    for g in grievance_rows {
        by_enemy
            .entry(g.enemy_id.clone())
            .or_default()
            .push(GrievanceResponse {
                id: g.id,
                enemy_id: g.enemy_id,
                reason: g.reason,
                tweet_url: g.tweet_url,
                created_at: g.created_at,
            });
    }

    let enemies: Vec<EnemyResponse> = rows
        .into_iter()
        .map(|row| {
            let grievances = by_enemy.remove(&row.id).unwrap_or_default();
            EnemyResponse {
                grievance_count: grievances.len(),
                grievances,
                id: row.id,
                name: row.name,
                nickname: row.nickname,
                twitter_handle: row.twitter_handle,
                tweet_url: row.tweet_url,
                position_x: row.position_x,
                position_y: row.position_y,
                created_at: row.created_at,
            }
        })
        .collect();

    Ok(Json(enemies))
}

/// `POST /enemies` — create an enemy owned by the caller.
pub async fn create_enemy(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEnemyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let nickname = req
        .nickname
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let twitter_handle = req
        .twitter_handle
        .as_deref()
        .map(clean_twitter_handle)
        .filter(|s| !s.is_empty());
    let tweet_url = req
        .tweet_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let created_at = chrono::Utc::now().to_rfc3339();
    let id = state
        .db
        .insert_enemy(
            &claims.sub.to_string(),
            &grudge_db::models::NewEnemy {
                name,
                nickname,
                twitter_handle: twitter_handle.as_deref(),
                tweet_url,
                position_x: None,
                position_y: None,
                created_at: Some(&created_at),
            },
        )
        .map_err(|e| ApiError::internal("Failed to create enemy", e))?;

    Ok((
        StatusCode::CREATED,
        Json(EnemyResponse {
            id,
            name: name.to_string(),
            nickname: nickname.map(str::to_string),
            twitter_handle,
            tweet_url: tweet_url.map(str::to_string),
            position_x: None,
            position_y: None,
            created_at,
            grievances: vec![],
            grievance_count: 0,
        }),
    ))
}

/// `DELETE /enemies/{id}` — ownership-scoped; grievances cascade with it.
pub async fn delete_enemy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .db
        .delete_enemy(&id, &claims.sub.to_string())
        .map_err(|e| ApiError::internal("Failed to delete enemy", e))?;

    if affected == 0 {
        return Err(ApiError::NotFound("Enemy not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
