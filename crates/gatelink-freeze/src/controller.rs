//! The per-player freeze state machine and its enforcement surface.
//!
//! A freeze record exists only while a player's session is active:
//!
//! ```text
//!   on_join ──→ [Frozen | Unfrozen] ──→ on_quit (record destroyed)
//!                  │         ↑
//!   on_link_completed        │
//!                  └─────────┘
//!                  on_unlink (policy-gated)
//! ```
//!
//! # Concurrency note
//!
//! `FreezeController` is NOT thread-safe by itself — it is owned by the
//! single-threaded simulation loop and mutated only there. Link outcomes
//! from the network domain reach it through the link-event queue, drained
//! once per tick, so transitions always apply in event order.

use std::collections::HashMap;

use gatelink_protocol::{PlayerId, Position};

use crate::{BlockReason, FreezeConfig, Gate};

/// Per-player freeze state plus the policy deciding when freezing applies.
pub struct FreezeController {
    config: FreezeConfig,
    /// Frozen flag per active session. No entry = no session.
    frozen: HashMap<PlayerId, bool>,
}

impl FreezeController {
    pub fn new(config: FreezeConfig) -> Self {
        Self {
            config: config.validated(),
            frozen: HashMap::new(),
        }
    }

    // -- Transitions ------------------------------------------------------

    /// Creates the player's freeze record at session start.
    ///
    /// Frozen iff the policy is enabled, the player lacks the bypass
    /// capability, and no identity link exists. Returns the resulting state.
    pub fn on_join(
        &mut self,
        player: PlayerId,
        linked: bool,
        has_bypass: bool,
    ) -> bool {
        let frozen = self.config.enabled && !has_bypass && !linked;
        self.frozen.insert(player, frozen);
        if frozen {
            tracing::info!(%player, "player frozen pending verification");
        }
        frozen
    }

    /// The binding succeeded — unfreeze unconditionally, however the freeze
    /// was entered. No-op when the session is not active.
    pub fn on_link_completed(&mut self, player: PlayerId) {
        if let Some(frozen) = self.frozen.get_mut(&player) {
            if *frozen {
                tracing::info!(%player, "player unfrozen after linking");
            }
            *frozen = false;
        }
    }

    /// The binding was removed — re-apply the freeze policy. No-op when the
    /// session is not active.
    pub fn on_unlink(&mut self, player: PlayerId, has_bypass: bool) {
        if let Some(frozen) = self.frozen.get_mut(&player) {
            *frozen = self.config.enabled && !has_bypass;
            if *frozen {
                tracing::info!(%player, "player refrozen after unlinking");
            }
        }
    }

    /// Destroys the player's freeze record at session end.
    pub fn on_quit(&mut self, player: PlayerId) {
        self.frozen.remove(&player);
    }

    // -- Queries ----------------------------------------------------------

    /// `true` iff the player has an active session and is frozen.
    pub fn is_frozen(&self, player: PlayerId) -> bool {
        self.frozen.get(&player).copied().unwrap_or(false)
    }

    /// `true` iff the player has an active session (frozen or not).
    pub fn has_session(&self, player: PlayerId) -> bool {
        self.frozen.contains_key(&player)
    }

    /// Number of active sessions being tracked.
    pub fn session_count(&self) -> usize {
        self.frozen.len()
    }

    // -- Enforcement ------------------------------------------------------

    /// Gates a movement event. While frozen, any change to spatial position
    /// is denied; orientation-only changes pass.
    pub fn check_move(
        &self,
        player: PlayerId,
        from: &Position,
        to: &Position,
    ) -> Gate {
        if self.is_frozen(player) && to.displaced_from(from) {
            Gate::Deny(BlockReason::Unverified)
        } else {
            Gate::Allow
        }
    }

    /// Gates a command. While frozen, only the configured allow-list may
    /// proceed (and nothing at all when basic commands are disabled).
    pub fn check_command(&self, player: PlayerId, line: &str) -> Gate {
        if !self.is_frozen(player) {
            return Gate::Allow;
        }
        if self.config.allow_basic_commands
            && self
                .config
                .allowed_commands
                .iter()
                .any(|allowed| allowed == &command_name(line))
        {
            Gate::Allow
        } else {
            Gate::Deny(BlockReason::Unverified)
        }
    }

    /// Gates an interaction event. Unconditionally denied while frozen.
    pub fn check_interact(&self, player: PlayerId) -> Gate {
        if self.is_frozen(player) {
            Gate::Deny(BlockReason::Unverified)
        } else {
            Gate::Allow
        }
    }

    /// Gates an item-drop event. Unconditionally denied while frozen.
    pub fn check_drop(&self, player: PlayerId) -> Gate {
        if self.is_frozen(player) {
            Gate::Deny(BlockReason::Unverified)
        } else {
            Gate::Allow
        }
    }
}

/// Extracts the bare command name from a command line: first token,
/// lowercased, leading slash stripped. `"/VERIFY force"` → `"verify"`.
pub(crate) fn command_name(line: &str) -> String {
    line.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches('/')
        .to_lowercase()
}

// =========================================================================
// Tests
// =========================================================================
