//! One-shot reconciliation of a client's local mirror into the
//! server-of-record.
//!
//! The batch is best-effort by design: each record is inserted
//! independently, a failed enemy just drops out of the id map (taking its
//! grievances with it), and the caller gets aggregate counts rather than an
//! error. All-or-nothing would force the user to retry an entire mirror over
//! one bad record.
//!
//! Not idempotent: client ids are discarded after remapping, so syncing the
//! same snapshot twice inserts duplicates. Clients clear their mirror after
//! an accepted sync.

use std::collections::HashMap;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::{info, warn};

use grudge_db::Database;
use grudge_db::models::{NewEnemy, NewGrievance};
use grudge_types::api::{Claims, SyncResponse};
use grudge_types::models::{LocalEnemy, LocalGrievance, MirrorSnapshot};

use crate::auth::AppState;
use crate::error::ApiError;

/// What a reconcile run did. Only the counts go on the wire; the skip lists
/// are diagnostics for the server log.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub synced_enemies: usize,
    pub synced_grievances: usize,
    /// Local ids of enemies whose insert failed.
    pub failed_enemies: Vec<String>,
    /// Local ids of grievances skipped because their parent never made it
    /// into the id map (failed insert, or a dangling reference to begin with).
    pub skipped_grievances: Vec<String>,
    /// Local ids of grievances whose own insert failed.
    pub failed_grievances: Vec<String>,
}

/// Push a full mirror snapshot into the server-of-record under `user_id`,
/// remapping client-generated enemy ids to the server-assigned ones.
///
/// Inserts run in input order: all enemies first, so the id map is complete
/// before any grievance is re-parented. Field values, `created_at` included,
/// are carried verbatim; only ids and ownership change.
pub fn reconcile(db: &Database, user_id: &str, snapshot: &MirrorSnapshot) -> ReconcileOutcome {
    let mut enemy_id_map: HashMap<&str, String> = HashMap::new();
    let mut outcome = ReconcileOutcome::default();

    for enemy in &snapshot.enemies {
        let new_enemy = NewEnemy {
            name: &enemy.name,
            nickname: enemy.nickname.as_deref(),
            twitter_handle: enemy.twitter_handle.as_deref(),
            tweet_url: enemy.tweet_url.as_deref(),
            position_x: enemy.position_x,
            position_y: enemy.position_y,
            created_at: Some(&enemy.created_at),
        };
        match db.insert_enemy(user_id, &new_enemy) {
            Ok(new_id) => {
                enemy_id_map.insert(enemy.id.as_str(), new_id);
                outcome.synced_enemies += 1;
            }
            Err(err) => {
                warn!(local_id = %enemy.id, error = %err, "enemy insert failed, skipping");
                outcome.failed_enemies.push(enemy.id.clone());
            }
        }
    }

    for grievance in &snapshot.grievances {
        let Some(new_enemy_id) = enemy_id_map.get(grievance.enemy_id.as_str()) else {
            // Parent wasn't synced; skip the grievance rather than fail the batch.
            outcome.skipped_grievances.push(grievance.id.clone());
            continue;
        };

        let new_grievance = NewGrievance {
            reason: &grievance.reason,
            tweet_url: grievance.tweet_url.as_deref(),
            created_at: Some(&grievance.created_at),
        };
        match db.insert_grievance(new_enemy_id, &new_grievance) {
            Ok(_) => outcome.synced_grievances += 1,
            Err(err) => {
                warn!(local_id = %grievance.id, error = %err, "grievance insert failed, skipping");
                outcome.failed_grievances.push(grievance.id.clone());
            }
        }
    }

    outcome
}

/// A sync body picked apart record by record. One undecodable record drops
/// that record, never the batch: the only shape requirement on the body as a
/// whole is that `enemies` is present and an array.
struct ParsedSnapshot {
    snapshot: MirrorSnapshot,
    malformed_enemies: Vec<String>,
    malformed_grievances: Vec<String>,
}

fn parse_snapshot(body: serde_json::Value) -> Option<ParsedSnapshot> {
    let serde_json::Value::Object(mut map) = body else {
        return None;
    };
    let Some(serde_json::Value::Array(raw_enemies)) = map.remove("enemies") else {
        return None;
    };
    // A missing `grievances` field is just an empty list.
    let raw_grievances = match map.remove("grievances") {
        Some(serde_json::Value::Array(raw)) => raw,
        Some(_) => {
            warn!("sync body has a non-array grievances field, treating as empty");
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut parsed = ParsedSnapshot {
        snapshot: MirrorSnapshot::default(),
        malformed_enemies: Vec::new(),
        malformed_grievances: Vec::new(),
    };

    for (idx, raw) in raw_enemies.into_iter().enumerate() {
        let label = record_label(&raw, "enemies", idx);
        match serde_json::from_value::<LocalEnemy>(raw) {
            Ok(enemy) => parsed.snapshot.enemies.push(enemy),
            Err(err) => {
                warn!(record = %label, error = %err, "undecodable enemy record, skipping");
                parsed.malformed_enemies.push(label);
            }
        }
    }
    for (idx, raw) in raw_grievances.into_iter().enumerate() {
        let label = record_label(&raw, "grievances", idx);
        match serde_json::from_value::<LocalGrievance>(raw) {
            Ok(grievance) => parsed.snapshot.grievances.push(grievance),
            Err(err) => {
                warn!(record = %label, error = %err, "undecodable grievance record, skipping");
                parsed.malformed_grievances.push(label);
            }
        }
    }

    Some(parsed)
}

fn record_label(raw: &serde_json::Value, collection: &str, idx: usize) -> String {
    raw.get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{collection}[{idx}]"))
}

/// `POST /sync` — reconcile the posted mirror under the authenticated user.
pub async fn sync(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(parsed) = parse_snapshot(body) else {
        return Err(ApiError::BadRequest("Invalid data format".into()));
    };
    let ParsedSnapshot {
        snapshot,
        malformed_enemies,
        malformed_grievances,
    } = parsed;

    let user_id = claims.sub.to_string();
    let db = state.clone();
    let mut outcome = tokio::task::spawn_blocking(move || reconcile(&db.db, &user_id, &snapshot))
        .await
        .map_err(|e| ApiError::internal("Failed to sync data", e.into()))?;
    outcome.failed_enemies.extend(malformed_enemies);
    outcome.failed_grievances.extend(malformed_grievances);

    if !outcome.failed_enemies.is_empty()
        || !outcome.skipped_grievances.is_empty()
        || !outcome.failed_grievances.is_empty()
    {
        warn!(
            user = %claims.sub,
            failed_enemies = ?outcome.failed_enemies,
            skipped_grievances = ?outcome.skipped_grievances,
            failed_grievances = ?outcome.failed_grievances,
            "sync completed with skipped records"
        );
    }
    info!(
        user = %claims.sub,
        enemies = outcome.synced_enemies,
        grievances = outcome.synced_grievances,
        "sync complete"
    );

    Ok(Json(SyncResponse {
        success: true,
        synced_enemies: outcome.synced_enemies,
        synced_grievances: outcome.synced_grievances,
    }))
}
