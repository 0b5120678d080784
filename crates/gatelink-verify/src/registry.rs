//! The code registry: issuance and one-shot consumption of verification
//! codes.
//!
//! # Concurrency note
//!
//! `CodeRegistry` is NOT thread-safe by itself — it uses plain `HashMap`s,
//! not concurrent ones. This is intentional: the registry is owned by the
//! link coordinator and accessed through a mutex whose critical sections
//! cover exactly one state transition. Keeping it simple here avoids hidden
//! locking overhead, and `&mut self` on `consume` is what makes redemption
//! atomic: two tasks racing on the same code serialize on the outer lock,
//! and only the first finds the record.
//!
//! # Timing
//!
//! Expiry and cooldown are lazy wall-clock checks against an explicit
//! `now: Instant` argument — there is no background sweeper, and none is
//! needed for correctness. Stale entries simply fail future matches; they
//! are garbage-collected on the next `generate` call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gatelink_protocol::PlayerId;
use rand::Rng;

use crate::{CodeFormat, VerifyConfig, VerifyError};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A live verification code awaiting redemption.
///
/// At most one exists per player; issuing a new code replaces the old
/// record, permanently invalidating the previous code.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    pub code: String,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

/// Issues verification codes and consumes them exactly once.
pub struct CodeRegistry {
    config: VerifyConfig,
    /// Live pending codes, keyed by the requesting player.
    pending: HashMap<PlayerId, PendingVerification>,
    /// Per-player earliest instant at which a new code may be requested.
    /// Independent of the pending table: consuming or expiring a code does
    /// not end the cooldown.
    cooldowns: HashMap<PlayerId, Instant>,
}

impl CodeRegistry {
    /// Creates an empty registry with the given (validated) config.
    pub fn new(config: VerifyConfig) -> Self {
        Self {
            config: config.validated(),
            pending: HashMap::new(),
            cooldowns: HashMap::new(),
        }
    }

    /// Issues a fresh code for `player`.
    ///
    /// Any previously pending code for the player becomes permanently
    /// invalid, including to anyone who already received it. The new code is
    /// guaranteed distinct from every other live pending code (rerolled on
    /// collision), so a redemption can never resolve to the wrong player.
    ///
    /// # Errors
    /// Returns [`VerifyError::OnCooldown`] if the player's cooldown has not
    /// elapsed. The cooldown is checked before any mutation.
    pub fn generate(
        &mut self,
        player: PlayerId,
        now: Instant,
    ) -> Result<String, VerifyError> {
        if let Some(available_at) = self.cooldowns.get(&player) {
            if *available_at > now {
                return Err(VerifyError::OnCooldown {
                    remaining_secs: remaining_secs(*available_at, now),
                });
            }
        }

        // Drop stale records first so an expired code can't occupy a slot
        // in the keyspace and stall the reroll loop below.
        self.purge_expired(now);

        let code = loop {
            let candidate = roll_code(&self.config);
            let taken = self
                .pending
                .values()
                .any(|p| p.code == candidate);
            if !taken {
                break candidate;
            }
            tracing::debug!("code collision — rerolling");
        };

        let previous = self.pending.insert(
            player,
            PendingVerification {
                code: code.clone(),
                issued_at: now,
                expires_at: now + Duration::from_secs(self.config.code_ttl_secs),
            },
        );
        if previous.is_some() {
            tracing::debug!(%player, "previous pending code invalidated");
        }

        self.cooldowns.insert(
            player,
            now + Duration::from_secs(self.config.cooldown_secs),
        );

        tracing::info!(
            %player,
            ttl_secs = self.config.code_ttl_secs,
            "verification code issued"
        );
        Ok(code)
    }

    /// Redeems a code, returning the player who requested it.
    ///
    /// The matching record is removed whether it was live or expired, so a
    /// code can succeed at most once.
    ///
    /// # Errors
    /// Returns [`VerifyError::NotFoundOrExpired`] when no record matches or
    /// the matching record is past its TTL. The two cases are deliberately
    /// indistinguishable to the caller.
    pub fn consume(
        &mut self,
        code: &str,
        now: Instant,
    ) -> Result<PlayerId, VerifyError> {
        let owner = self
            .pending
            .iter()
            .find_map(|(pid, p)| (p.code == code).then_some(*pid));

        let Some(player) = owner else {
            return Err(VerifyError::NotFoundOrExpired);
        };

        let record = self.pending.remove(&player).expect("just found");
        if now > record.expires_at {
            tracing::debug!(%player, "expired code presented");
            return Err(VerifyError::NotFoundOrExpired);
        }

        tracing::info!(%player, "verification code consumed");
        Ok(player)
    }

    /// `true` if the player must still wait before requesting a new code.
    pub fn is_on_cooldown(&self, player: PlayerId, now: Instant) -> bool {
        self.cooldowns
            .get(&player)
            .is_some_and(|available_at| *available_at > now)
    }

    /// Whole seconds until the player may request a new code. Zero once the
    /// cooldown has elapsed (or was never started).
    pub fn remaining_cooldown_secs(
        &self,
        player: PlayerId,
        now: Instant,
    ) -> u64 {
        self.cooldowns
            .get(&player)
            .map_or(0, |available_at| remaining_secs(*available_at, now))
    }

    /// Removes every pending record past its TTL.
    ///
    /// Housekeeping only — expired records already fail to match in
    /// [`consume`](Self::consume).
    pub fn purge_expired(&mut self, now: Instant) {
        self.pending.retain(|_, p| now <= p.expires_at);
    }

    /// Number of live pending records (including any not yet purged).
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn remaining_secs(available_at: Instant, now: Instant) -> u64 {
    available_at.saturating_duration_since(now).as_secs()
}

/// Draws one code from the configured alphabet.
fn roll_code(config: &VerifyConfig) -> String {
    let mut rng = rand::rng();
    match config.code_format {
        CodeFormat::Numeric => {
            let span = 10u64.pow(config.code_length as u32);
            format!(
                "{:0width$}",
                rng.random_range(0..span),
                width = config.code_length
            )
        }
        CodeFormat::Alphanumeric => (0..config.code_length)
            .map(|_| {
                ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char
            })
            .collect(),
    }
}

// =========================================================================
// Tests
// =========================================================================
