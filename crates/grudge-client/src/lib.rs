//! Client library for the grudge server: a thin REST client plus the caller
//! side of the sync contract.
//!
//! The sync operation on the server is not idempotent — it assigns fresh ids
//! and never dedupes — so the client is the one that must not send the same
//! mirror twice. [`sync_mirror`] implements that contract: push the snapshot,
//! then clear the mirror once the server accepted the batch.

pub mod api;
pub mod session;

use anyhow::Result;

use grudge_mirror::MirrorStore;
use grudge_types::api::SyncResponse;

use crate::api::ApiClient;

/// Push the whole mirror to the server and, on an accepted batch, clear it.
///
/// "Accepted" means the server returned a 200 with `success: true` — which it
/// does even for partial per-record failures. Those records are gone from the
/// mirror too; keeping them around would guarantee duplicates of everything
/// that did land on a retry.
pub async fn sync_mirror(client: &ApiClient, store: &mut MirrorStore) -> Result<SyncResponse> {
    let snapshot = store.export_all();
    let response = client.sync(&snapshot).await?;
    finish_sync(store, &response);
    Ok(response)
}

/// Apply the post-sync policy to the mirror for a response already received.
pub fn finish_sync(store: &mut MirrorStore, response: &SyncResponse) {
    if response.success {
        store.clear_all();
    }
}
