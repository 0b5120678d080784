//! The second-factor gate: a parallel restriction for players who are
//! linked but have not yet confirmed this session via the messaging side.
//!
//! This is not a freeze state — it is an independent boolean condition
//! evaluated alongside the freeze gate. Both gates may reject an action;
//! callers evaluate the freeze gate first since it is the stronger
//! precondition.
//!
//! A challenge is issued when a linked player joins (delivered to them as a
//! direct message on the messaging network) and satisfied when they submit
//! the matching code in-session. Challenges are session-scoped: quitting or
//! unlinking clears them, so a fresh binding never inherits factor state.

use std::collections::HashMap;

use gatelink_protocol::{PlayerId, Position};
use rand::Rng;

use crate::controller::command_name;
use crate::{BlockReason, Gate, SecondFactorConfig, DEFAULT_ALLOWED_COMMANDS};

/// Commands permitted while the second factor is unsatisfied. Fixed — not
/// configurable, unlike the freeze allow-list.
pub const SECOND_FACTOR_COMMANDS: [&str; 4] = DEFAULT_ALLOWED_COMMANDS;

#[derive(Debug)]
struct Challenge {
    code: String,
    satisfied: bool,
}

/// Tracks per-player second-factor challenges and gates actions while one
/// is outstanding.
pub struct SecondFactorGate {
    config: SecondFactorConfig,
    challenges: HashMap<PlayerId, Challenge>,
}

impl SecondFactorGate {
    pub fn new(config: SecondFactorConfig) -> Self {
        Self {
            config: config.validated(),
            challenges: HashMap::new(),
        }
    }

    /// Issues a fresh challenge for a linked player at session start.
    ///
    /// Returns the code to deliver via the messaging side, or `None` when
    /// the feature is disabled. Replaces any previous challenge.
    pub fn begin_challenge(&mut self, player: PlayerId) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let code = roll_challenge(self.config.code_length);
        self.challenges.insert(
            player,
            Challenge {
                code: code.clone(),
                satisfied: false,
            },
        );
        tracing::info!(%player, "second-factor challenge issued");
        Some(code)
    }

    /// Checks a submitted code against the player's outstanding challenge.
    /// On a match the factor is satisfied for the rest of the session.
    pub fn submit(&mut self, player: PlayerId, code: &str) -> bool {
        let Some(challenge) = self.challenges.get_mut(&player) else {
            return false;
        };
        if challenge.satisfied || challenge.code != code {
            return false;
        }
        challenge.satisfied = true;
        tracing::info!(%player, "second factor satisfied");
        true
    }

    /// `true` once the player has confirmed this session.
    pub fn is_satisfied(&self, player: PlayerId) -> bool {
        self.challenges
            .get(&player)
            .is_some_and(|c| c.satisfied)
    }

    /// Drops the player's challenge state (session end, or unlink — a new
    /// binding must start from scratch).
    pub fn clear(&mut self, player: PlayerId) {
        self.challenges.remove(&player);
    }

    /// `true` when this gate currently restricts the player: feature on,
    /// gating enabled, player linked, factor unsatisfied.
    fn gating(&self, player: PlayerId, linked: bool) -> bool {
        self.config.enabled
            && self.config.freeze_until_verified
            && linked
            && !self.is_satisfied(player)
    }

    // -- Enforcement ------------------------------------------------------

    /// Gates movement. Block-granularity: small shuffles within one world
    /// block pass, walking does not.
    pub fn check_move(
        &self,
        player: PlayerId,
        linked: bool,
        from: &Position,
        to: &Position,
    ) -> Gate {
        if self.gating(player, linked) && to.block_displaced_from(from) {
            Gate::Deny(BlockReason::SecondFactorPending)
        } else {
            Gate::Allow
        }
    }

    /// Gates commands against the fixed minimal allow-list.
    pub fn check_command(
        &self,
        player: PlayerId,
        linked: bool,
        line: &str,
    ) -> Gate {
        if self.gating(player, linked)
            && !SECOND_FACTOR_COMMANDS.contains(&command_name(line).as_str())
        {
            Gate::Deny(BlockReason::SecondFactorPending)
        } else {
            Gate::Allow
        }
    }

    /// Gates interaction. Unconditionally denied while gating.
    pub fn check_interact(&self, player: PlayerId, linked: bool) -> Gate {
        if self.gating(player, linked) {
            Gate::Deny(BlockReason::SecondFactorPending)
        } else {
            Gate::Allow
        }
    }

    /// Gates item drops. Unconditionally denied while gating.
    pub fn check_drop(&self, player: PlayerId, linked: bool) -> Gate {
        if self.gating(player, linked) {
            Gate::Deny(BlockReason::SecondFactorPending)
        } else {
            Gate::Allow
        }
    }
}

fn roll_challenge(length: usize) -> String {
    let mut rng = rand::rng();
    let span = 10u64.pow(length as u32);
    format!("{:0width$}", rng.random_range(0..span), width = length)
}

// =========================================================================
// Tests
// =========================================================================
