//! Client-local mirror of enemy and grievance records.
//!
//! The mirror is what an unauthenticated (or offline) client works against:
//! plain CRUD over two collections, persisted through an injected
//! [`LocalStorage`] backend. Ids are generated locally and replaced by
//! server-assigned ones when the mirror is later reconciled into the
//! server-of-record; until then the mirror is the only copy of the data.
//!
//! Storage trouble is never an error here. A mirror opened with no backend
//! ([`MirrorStore::detached`]) behaves as permanently empty: reads return
//! nothing and writes are accepted but discarded. Backend read/write failures
//! degrade the same way, with a warning in the log.

pub mod storage;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use grudge_types::models::{
    LocalEnemy, LocalEnemyWithGrievances, LocalGrievance, MirrorSnapshot,
};

use crate::storage::LocalStorage;

pub const ENEMIES_KEY: &str = "grudge_enemies";
pub const GRIEVANCES_KEY: &str = "grudge_grievances";

/// Bump when the persisted record shape changes incompatibly. Unknown
/// versions load as empty rather than guessing at a migration.
const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<R> {
    schema: u32,
    records: R,
}

pub struct MirrorStore {
    storage: Option<Box<dyn LocalStorage>>,
    enemies: Vec<LocalEnemy>,
    grievances: Vec<LocalGrievance>,
}

impl MirrorStore {
    /// Open a mirror over a durable backend, loading whatever it holds.
    pub fn open(storage: Box<dyn LocalStorage>) -> Self {
        let enemies = load_collection(storage.as_ref(), ENEMIES_KEY);
        let grievances = load_collection(storage.as_ref(), GRIEVANCES_KEY);
        Self {
            storage: Some(storage),
            enemies,
            grievances,
        }
    }

    /// A mirror with no durable storage behind it, for environments where
    /// client-local storage does not exist. Reads see an empty store; writes
    /// still hand back well-formed records but nothing is retained.
    pub fn detached() -> Self {
        Self {
            storage: None,
            enemies: Vec::new(),
            grievances: Vec::new(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// Every enemy joined with its grievances, most recently created first.
    /// The grievance list per enemy is unordered; the count is exact.
    pub fn list_enemies_with_grievances(&self) -> Vec<LocalEnemyWithGrievances> {
        let mut entries: Vec<LocalEnemyWithGrievances> = self
            .enemies
            .iter()
            .map(|enemy| {
                let grievances: Vec<LocalGrievance> = self
                    .grievances
                    .iter()
                    .filter(|g| g.enemy_id == enemy.id)
                    .cloned()
                    .collect();
                LocalEnemyWithGrievances {
                    enemy: enemy.clone(),
                    grievance_count: grievances.len(),
                    grievances,
                }
            })
            .collect();

        // Stable sort: records created at the same instant keep insertion order.
        entries.sort_by(|a, b| {
            parse_created(&b.enemy.created_at).cmp(&parse_created(&a.enemy.created_at))
        });
        entries
    }

    /// Create an enemy with a fresh local id and the current time. Name
    /// validation (non-empty after trimming) is the caller's job; the store
    /// records whatever it is given.
    pub fn add_enemy(
        &mut self,
        name: &str,
        nickname: Option<&str>,
        twitter_handle: Option<&str>,
        tweet_url: Option<&str>,
    ) -> LocalEnemy {
        let enemy = LocalEnemy {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            nickname: nickname.map(str::to_string),
            twitter_handle: twitter_handle.map(str::to_string),
            tweet_url: tweet_url.map(str::to_string),
            created_at: Utc::now().to_rfc3339(),
            position_x: None,
            position_y: None,
        };
        if self.storage.is_some() {
            self.enemies.push(enemy.clone());
            self.save_enemies();
        }
        enemy
    }

    /// Set both canvas coordinates. Silently ignores unknown ids: the UI may
    /// race a drag against a delete, and losing that update is fine.
    pub fn update_enemy_position(&mut self, id: &str, x: f64, y: f64) {
        match self.enemies.iter_mut().find(|e| e.id == id) {
            Some(enemy) => {
                enemy.position_x = Some(x);
                enemy.position_y = Some(y);
            }
            None => {
                debug!(enemy = id, "position update for unknown enemy, ignoring");
                return;
            }
        }
        self.save_enemies();
    }

    /// Delete an enemy and every grievance pointing at it. No-op for unknown
    /// ids.
    pub fn delete_enemy(&mut self, id: &str) {
        self.enemies.retain(|e| e.id != id);
        self.grievances.retain(|g| g.enemy_id != id);
        self.save_enemies();
        self.save_grievances();
    }

    /// Record a grievance. The parent enemy is not checked to exist — the
    /// caller is expected to pass an id it just listed, and an orphaned
    /// grievance is tolerated rather than rejected.
    pub fn add_grievance(
        &mut self,
        enemy_id: &str,
        reason: &str,
        tweet_url: Option<&str>,
    ) -> LocalGrievance {
        let grievance = LocalGrievance {
            id: Uuid::new_v4().to_string(),
            enemy_id: enemy_id.to_string(),
            reason: reason.to_string(),
            tweet_url: tweet_url.map(str::to_string),
            created_at: Utc::now().to_rfc3339(),
        };
        if self.storage.is_some() {
            self.grievances.push(grievance.clone());
            self.save_grievances();
        }
        grievance
    }

    /// Delete a single grievance. No-op for unknown ids.
    pub fn delete_grievance(&mut self, id: &str) {
        self.grievances.retain(|g| g.id != id);
        self.save_grievances();
    }

    /// Wipe both collections and their persisted entries.
    pub fn clear_all(&mut self) {
        self.enemies.clear();
        self.grievances.clear();
        let Some(storage) = self.storage.as_deref() else {
            return;
        };
        for key in [ENEMIES_KEY, GRIEVANCES_KEY] {
            if let Err(err) = storage.remove(key) {
                warn!(key, error = %err, "failed to clear local collection");
            }
        }
    }

    /// Verbatim snapshot of both collections for handoff to a sync. Does not
    /// mutate the mirror; clearing after a successful sync is the caller's
    /// decision.
    pub fn export_all(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            enemies: self.enemies.clone(),
            grievances: self.grievances.clone(),
        }
    }

    /// Whether there is anything worth offering to sync.
    pub fn has_any_data(&self) -> bool {
        !self.enemies.is_empty()
    }

    fn save_enemies(&self) {
        save_collection(self.storage.as_deref(), ENEMIES_KEY, &self.enemies);
    }

    fn save_grievances(&self) {
        save_collection(self.storage.as_deref(), GRIEVANCES_KEY, &self.grievances);
    }
}

fn parse_created(raw: &str) -> DateTime<Utc> {
    // Timestamps we did not write ourselves may not parse; sort those last
    // rather than failing the whole listing.
    raw.parse::<DateTime<Utc>>()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn load_collection<T: DeserializeOwned>(storage: &dyn LocalStorage, key: &str) -> Vec<T> {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(key, error = %err, "failed to read local collection, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Envelope<Vec<T>>>(&raw) {
        Ok(env) if env.schema == SCHEMA_VERSION => env.records,
        Ok(env) => {
            warn!(
                key,
                schema = env.schema,
                "unsupported local schema version, starting empty"
            );
            Vec::new()
        }
        // Pre-envelope installs persisted a bare JSON array. Accept it as
        // schema 0; the next save rewrites it in envelope form.
        Err(_) => match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(key, error = %err, "corrupt local collection, starting empty");
                Vec::new()
            }
        },
    }
}

fn save_collection<T: Serialize>(storage: Option<&dyn LocalStorage>, key: &str, records: &[T]) {
    let Some(storage) = storage else { return };
    let payload = match serde_json::to_string(&Envelope {
        schema: SCHEMA_VERSION,
        records,
    }) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(key, error = %err, "failed to serialize local collection");
            return;
        }
    };
    if let Err(err) = storage.write(key, &payload) {
        warn!(key, error = %err, "failed to persist local collection");
    }
}
