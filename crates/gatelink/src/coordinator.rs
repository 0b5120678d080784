//! The link coordinator: the concurrency-safe boundary around linking
//! state.
//!
//! Both execution domains call in here — the simulation loop to request
//! codes and unlink, the messaging gateway's worker threads to redeem codes
//! and report departures. The code registry and identity store each sit
//! behind their own mutex; critical sections cover exactly one state
//! transition and are never held across an outbound call (the coordinator
//! makes none). Freeze state is NOT touched from here: the coordinator
//! only queues [`LinkEvent`]s, which the simulation applies on its next
//! tick.

use std::time::Instant;

use gatelink_protocol::{ExternalId, LinkEvent, PlayerId};
use gatelink_store::IdentityStore;
use gatelink_verify::CodeRegistry;
use tokio::sync::Mutex;

use crate::events::LinkEventSender;
use crate::GatelinkError;

/// Orchestrates code issuance, redemption, and link removal.
pub struct LinkCoordinator {
    codes: Mutex<CodeRegistry>,
    store: Mutex<IdentityStore>,
    events: LinkEventSender,
}

impl LinkCoordinator {
    pub fn new(
        codes: CodeRegistry,
        store: IdentityStore,
        events: LinkEventSender,
    ) -> Self {
        Self {
            codes: Mutex::new(codes),
            store: Mutex::new(store),
            events,
        }
    }

    /// Issues a verification code for `player`.
    ///
    /// An already-linked player is rejected unless `force` is set, in which
    /// case the existing link is broken first (through the normal unlink
    /// path, so freeze policy and second-factor reset apply).
    ///
    /// # Errors
    /// [`GatelinkError::AlreadyLinked`] without `force`; the registry's
    /// cooldown error otherwise.
    pub async fn request_code(
        &self,
        player: PlayerId,
        force: bool,
        now: Instant,
    ) -> Result<String, GatelinkError> {
        if self.is_linked(player).await {
            if !force {
                return Err(GatelinkError::AlreadyLinked(player));
            }
            tracing::info!(%player, "forced relink — breaking existing link");
            self.unlink(player).await?;
        }

        let mut codes = self.codes.lock().await;
        Ok(codes.generate(player, now)?)
    }

    /// Redeems a code presented on the messaging side, durably binding the
    /// owning player to `external`.
    ///
    /// Exactly one concurrent redemption of a given code can succeed: the
    /// registry consumes the record under the lock, and this method is the
    /// only consumer, so at most one link completion is ever produced per
    /// code.
    ///
    /// The link is stored durably *before* the unfreeze event is queued —
    /// a persistence failure therefore leaves the player frozen, as
    /// required.
    ///
    /// # Errors
    /// - [`GatelinkError::Verify`] — unknown or expired code
    /// - [`GatelinkError::ExternalIdClaimed`] — the account is already
    ///   bound to a different player (the consumed code is forfeited; the
    ///   player simply requests a new one)
    /// - [`GatelinkError::Store`] — the link could not be persisted
    pub async fn redeem(
        &self,
        external: &ExternalId,
        code: &str,
        now: Instant,
    ) -> Result<PlayerId, GatelinkError> {
        let player = {
            let mut codes = self.codes.lock().await;
            codes.consume(code, now)?
        };

        {
            let mut store = self.store.lock().await;
            if let Some(owner) = store.find_player_by_external_id(external) {
                if owner != player {
                    tracing::warn!(
                        %external,
                        claimed_by = %owner,
                        attempted_by = %player,
                        "redemption rejected: external account already claimed"
                    );
                    return Err(GatelinkError::ExternalIdClaimed(
                        external.clone(),
                    ));
                }
            }
            store.store(player, external.clone())?;
        }

        let _ = self.events.send(LinkEvent::Completed(player));
        tracing::info!(%player, %external, "identity link completed");
        Ok(player)
    }

    /// Removes `player`'s link (voluntary unlink).
    ///
    /// Returns the external account that was bound, so the caller can run
    /// best-effort cleanup (role revocation) on the messaging side.
    pub async fn unlink(
        &self,
        player: PlayerId,
    ) -> Result<ExternalId, GatelinkError> {
        let external = {
            let mut store = self.store.lock().await;
            let Some(external) = store.lookup_external_id(player).cloned()
            else {
                return Err(GatelinkError::NotLinked(player));
            };
            store.remove(player)?;
            external
        };

        let _ = self.events.send(LinkEvent::Broken(player));
        tracing::info!(%player, %external, "identity link broken");
        Ok(external)
    }

    /// Handles the external account's departure from the messaging network.
    ///
    /// If the account was linked, performs the unlink steps for that
    /// player; otherwise a silent no-op.
    pub async fn handle_remote_departure(
        &self,
        external: &ExternalId,
    ) -> Result<Option<PlayerId>, GatelinkError> {
        let player = {
            let mut store = self.store.lock().await;
            let Some(player) = store.find_player_by_external_id(external)
            else {
                tracing::debug!(
                    %external,
                    "departure of an unlinked account ignored"
                );
                return Ok(None);
            };
            store.remove(player)?;
            player
        };

        let _ = self.events.send(LinkEvent::Broken(player));
        tracing::info!(
            %player,
            %external,
            "identity link removed after remote departure"
        );
        Ok(Some(player))
    }

    // -- Queries ----------------------------------------------------------

    /// `true` iff a durable link record exists for `player`.
    pub async fn is_linked(&self, player: PlayerId) -> bool {
        self.store.lock().await.is_linked(player)
    }

    /// The external account bound to `player`, if any.
    pub async fn external_id_of(
        &self,
        player: PlayerId,
    ) -> Option<ExternalId> {
        self.store.lock().await.lookup_external_id(player).cloned()
    }

    /// Whole seconds before `player` may request another code.
    pub async fn remaining_cooldown_secs(
        &self,
        player: PlayerId,
        now: Instant,
    ) -> u64 {
        self.codes.lock().await.remaining_cooldown_secs(player, now)
    }
}
