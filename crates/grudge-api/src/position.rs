use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::debug;

use grudge_types::api::{Claims, PositionRequest, PositionResponse};

use crate::auth::AppState;
use crate::error::ApiError;

/// `POST /position` — persist whiteboard coordinates for one enemy.
///
/// The update is hard-scoped to the caller's rows; an id that does not
/// resolve to a row the caller owns (deleted, or someone else's) is a no-op
/// 200, matching the mirror's tolerance of position updates racing a delete.
pub async fn update_position(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    // Manual validation so a string-typed x or a missing enemyId is the
    // contract's 400, not a deserialization rejection.
    let req: PositionRequest =
        serde_json::from_value(body).map_err(|_| ApiError::BadRequest("Invalid data".into()))?;
    if req.enemy_id.is_empty() || !req.x.is_finite() || !req.y.is_finite() {
        return Err(ApiError::BadRequest("Invalid data".into()));
    }

    let affected = state
        .db
        .update_enemy_position(&req.enemy_id, &claims.sub.to_string(), req.x, req.y)
        .map_err(|e| ApiError::internal("Failed to save position", e))?;

    if affected == 0 {
        debug!(enemy = %req.enemy_id, user = %claims.sub, "position update matched no owned row");
    }

    Ok(Json(PositionResponse { success: true }))
}
