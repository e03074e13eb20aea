use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use grudge_types::api::{Claims, CreateGrievanceRequest, GrievanceResponse};

use crate::auth::AppState;
use crate::error::ApiError;

/// `POST /enemies/{id}/grievances` — record a grievance against an enemy the
/// caller owns. Unlike the local mirror, the server does check the parent:
/// a 404 here means the enemy is not yours (or gone).
pub async fn create_grievance(
    State(state): State<AppState>,
    Path(enemy_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGrievanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();

    state
        .db
        .get_enemy(&enemy_id, &user_id)
        .map_err(|e| ApiError::internal("Failed to create grievance", e))?
        .ok_or_else(|| ApiError::NotFound("Enemy not found".into()))?;

    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::BadRequest("Reason is required".into()));
    }
    let tweet_url = req
        .tweet_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let created_at = chrono::Utc::now().to_rfc3339();
    let id = state
        .db
        .insert_grievance(
            &enemy_id,
            &grudge_db::models::NewGrievance {
                reason,
                tweet_url,
                created_at: Some(&created_at),
            },
        )
        .map_err(|e| ApiError::internal("Failed to create grievance", e))?;

    Ok((
        StatusCode::CREATED,
        Json(GrievanceResponse {
            id,
            enemy_id,
            reason: reason.to_string(),
            tweet_url: tweet_url.map(str::to_string),
            created_at,
        }),
    ))
}

/// `DELETE /grievances/{id}` — ownership checked through the parent enemy.
pub async fn delete_grievance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .db
        .delete_grievance(&id, &claims.sub.to_string())
        .map_err(|e| ApiError::internal("Failed to delete grievance", e))?;

    if affected == 0 {
        return Err(ApiError::NotFound("Grievance not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
