//! The durable identity-link registry.
//!
//! One JSON object on disk, player UUID → external account ID:
//!
//! ```json
//! {
//!   "5f4c...-...": "184325044123467776",
//!   "9a2b...-...": "201177117203234816"
//! }
//! ```
//!
//! Every mutation rewrites the whole file before reporting success. At the
//! expected scale (hundreds of links) this is cheaper than being clever,
//! and it keeps the durability contract trivial to reason about: if a call
//! returned `Ok`, the disk has it.
//!
//! # Concurrency note
//!
//! `IdentityStore` is NOT thread-safe by itself. The link coordinator wraps
//! it in a mutex; critical sections cover exactly one mutation and never an
//! outbound call.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use gatelink_protocol::{ExternalId, PlayerId};

use crate::StoreError;

/// Durable mapping of player UUID → external account ID; the single source
/// of truth for "is this player linked".
pub struct IdentityStore {
    path: PathBuf,
    links: HashMap<PlayerId, ExternalId>,
}

impl IdentityStore {
    /// Opens the store, loading any existing file at `path`.
    ///
    /// A missing file is an empty store (first boot). A present but
    /// unparsable file is [`StoreError::Corrupt`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let links = match std::fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Persistence(e)),
        };
        let store = Self { path, links };
        tracing::info!(
            path = %store.path.display(),
            links = store.links.len(),
            "identity store opened"
        );
        Ok(store)
    }

    /// Upserts a link record. Idempotent.
    ///
    /// Persists before returning. On a failed write the in-memory entry is
    /// rolled back, so `is_linked` keeps agreeing with the disk.
    pub fn store(
        &mut self,
        player: PlayerId,
        external: ExternalId,
    ) -> Result<(), StoreError> {
        let previous = self.links.insert(player, external);
        if let Err(e) = self.persist() {
            match previous {
                Some(prev) => self.links.insert(player, prev),
                None => self.links.remove(&player),
            };
            return Err(e);
        }
        tracing::info!(%player, "link record stored");
        Ok(())
    }

    /// Deletes the link record for `player`, if present. A missing record
    /// is a successful no-op.
    ///
    /// Same durability contract as [`store`](Self::store).
    pub fn remove(&mut self, player: PlayerId) -> Result<(), StoreError> {
        let Some(previous) = self.links.remove(&player) else {
            return Ok(());
        };
        if let Err(e) = self.persist() {
            self.links.insert(player, previous);
            return Err(e);
        }
        tracing::info!(%player, "link record removed");
        Ok(())
    }

    /// `true` iff a link record exists for `player`.
    pub fn is_linked(&self, player: PlayerId) -> bool {
        self.links.contains_key(&player)
    }

    /// The external account linked to `player`, if any.
    pub fn lookup_external_id(&self, player: PlayerId) -> Option<&ExternalId> {
        self.links.get(&player)
    }

    /// Finds the player linked to `external`, if any.
    ///
    /// Full scan — called rarely (remote-departure events) and the record
    /// count stays small. Returns the first match.
    pub fn find_player_by_external_id(
        &self,
        external: &ExternalId,
    ) -> Option<PlayerId> {
        self.links
            .iter()
            .find_map(|(pid, ext)| (ext == external).then_some(*pid))
    }

    /// Number of link records.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// `true` if no players are linked.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.links)
            .map_err(StoreError::Encode)?;
        std::fs::write(&self.path, bytes).map_err(StoreError::Persistence)
    }
}

// =========================================================================
// Tests
// =========================================================================
