//! The simulation-side event surface.
//!
//! `PlayerHooks` is what the game-session runtime calls from its tick loop:
//! lifecycle hooks (join/quit), the four cancellable gated hooks (move,
//! command, interact, drop), the player-facing link commands, and the
//! once-per-tick drain of link events coming from the network domain.
//!
//! # Concurrency note
//!
//! `PlayerHooks` is NOT thread-safe and is not meant to be: it is owned by
//! the single-threaded simulation loop, and everything it mutates (freeze
//! state, second-factor challenges, the session table) is owned exclusively
//! here. The network domain never touches this state — it queues
//! [`LinkEvent`]s, applied in order by [`drain_link_events`].
//!
//! The gated checks are synchronous and read only simulation-owned state.
//! The "is this player linked" view they need is cached per session at join
//! time and kept current by the event drain, so a movement check never
//! crosses into the coordinator's locks.
//!
//! [`drain_link_events`]: PlayerHooks::drain_link_events

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gatelink_freeze::{
    BlockReason, FreezeConfig, FreezeController, Gate, SecondFactorConfig,
    SecondFactorGate,
};
use gatelink_protocol::{LinkEvent, PlayerId, Position};
use gatelink_verify::VerifyError;
use rand::Rng;

use crate::config::ReminderConfig;
use crate::coordinator::LinkCoordinator;
use crate::events::LinkEventQueue;
use crate::{GatelinkError, Notice};

/// The verdict for one gated player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the action through.
    Allow,
    /// Cancel the action; optionally show the player a notice. Movement,
    /// interaction, and drops cancel silently; blocked commands explain
    /// themselves.
    Deny(Option<Notice>),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// What happened when a player joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Whether the player entered the session frozen.
    pub frozen: bool,
    /// A notice to show the player (verification reminder).
    pub notice: Option<Notice>,
    /// A second-factor challenge code to deliver via the messaging side,
    /// when one was issued.
    pub second_factor_challenge: Option<String>,
}

#[derive(Debug)]
struct SessionInfo {
    has_bypass: bool,
    /// Cached link status; updated by the event drain.
    linked: bool,
}

/// Simulation-domain owner of all enforcement state.
pub struct PlayerHooks {
    coordinator: Arc<LinkCoordinator>,
    freeze: FreezeController,
    second_factor: SecondFactorGate,
    events: LinkEventQueue,
    sessions: HashMap<PlayerId, SessionInfo>,
    reminders: ReminderSchedule,
}

impl PlayerHooks {
    pub fn new(
        coordinator: Arc<LinkCoordinator>,
        freeze: FreezeConfig,
        second_factor: SecondFactorConfig,
        reminder: ReminderConfig,
        events: LinkEventQueue,
    ) -> Self {
        Self {
            coordinator,
            freeze: FreezeController::new(freeze),
            second_factor: SecondFactorGate::new(second_factor),
            events,
            sessions: HashMap::new(),
            reminders: ReminderSchedule::new(reminder),
        }
    }

    // -- Lifecycle --------------------------------------------------------

    /// Registers a session and applies the join-time freeze policy.
    ///
    /// `has_bypass` is the runtime's capability query, evaluated once here
    /// and remembered for the rest of the session.
    pub async fn on_join(
        &mut self,
        player: PlayerId,
        has_bypass: bool,
    ) -> JoinOutcome {
        let linked = self.coordinator.is_linked(player).await;
        self.sessions
            .insert(player, SessionInfo { has_bypass, linked });

        let frozen = self.freeze.on_join(player, linked, has_bypass);

        let mut outcome = JoinOutcome {
            frozen,
            notice: None,
            second_factor_challenge: None,
        };
        if linked {
            outcome.second_factor_challenge =
                self.second_factor.begin_challenge(player);
        } else {
            outcome.notice = Some(Notice::NotLinked);
        }
        outcome
    }

    /// Tears down all per-session state.
    pub fn on_quit(&mut self, player: PlayerId) {
        self.freeze.on_quit(player);
        self.second_factor.clear(player);
        self.sessions.remove(&player);
    }

    // -- Event drain ------------------------------------------------------

    /// Applies every queued link event. Call once per simulation tick.
    ///
    /// Returns the applied events so the host can react (sounds, titles).
    pub fn drain_link_events(&mut self) -> Vec<LinkEvent> {
        let events = self.events.drain();
        for event in &events {
            match *event {
                LinkEvent::Completed(player) => {
                    if let Some(session) = self.sessions.get_mut(&player) {
                        session.linked = true;
                    }
                    self.freeze.on_link_completed(player);
                }
                LinkEvent::Broken(player) => {
                    let has_bypass = match self.sessions.get_mut(&player) {
                        Some(session) => {
                            session.linked = false;
                            session.has_bypass
                        }
                        None => false,
                    };
                    // A fresh binding must not inherit factor state.
                    self.second_factor.clear(player);
                    self.freeze.on_unlink(player, has_bypass);
                }
            }
        }
        events
    }

    // -- Gated hooks ------------------------------------------------------

    /// Gates a movement event. Frozen players may turn but not move;
    /// second-factor-pending players may not leave their block.
    pub fn check_move(
        &self,
        player: PlayerId,
        from: &Position,
        to: &Position,
    ) -> Decision {
        let gate = combine(self.freeze.check_move(player, from, to), || {
            self.second_factor
                .check_move(player, self.linked(player), from, to)
        });
        silent(gate)
    }

    /// Gates a command line. Denials carry an explanatory notice.
    pub fn check_command(&self, player: PlayerId, line: &str) -> Decision {
        let gate = combine(self.freeze.check_command(player, line), || {
            self.second_factor
                .check_command(player, self.linked(player), line)
        });
        match gate {
            Gate::Allow => Decision::Allow,
            Gate::Deny(reason) => {
                Decision::Deny(Some(command_notice(reason)))
            }
        }
    }

    /// Gates an interaction event.
    pub fn check_interact(&self, player: PlayerId) -> Decision {
        let gate = combine(self.freeze.check_interact(player), || {
            self.second_factor.check_interact(player, self.linked(player))
        });
        silent(gate)
    }

    /// Gates an item-drop event.
    pub fn check_drop(&self, player: PlayerId) -> Decision {
        let gate = combine(self.freeze.check_drop(player), || {
            self.second_factor.check_drop(player, self.linked(player))
        });
        silent(gate)
    }

    // -- Player commands --------------------------------------------------

    /// Handles the player's code request (`/verify [force]`).
    pub async fn request_code(
        &mut self,
        player: PlayerId,
        force: bool,
        now: Instant,
    ) -> Notice {
        match self.coordinator.request_code(player, force, now).await {
            Ok(code) => Notice::CodeIssued { code },
            Err(GatelinkError::AlreadyLinked(_)) => Notice::AlreadyLinked,
            Err(GatelinkError::Verify(VerifyError::OnCooldown {
                remaining_secs,
            })) => Notice::CooldownActive { remaining_secs },
            Err(e) => {
                tracing::error!(%player, error = %e, "code request failed");
                Notice::GenericError
            }
        }
    }

    /// Handles the player's second-factor submission (`/2fa <code>`).
    pub fn submit_second_factor(
        &mut self,
        player: PlayerId,
        code: &str,
    ) -> Notice {
        if self.second_factor.submit(player, code) {
            Notice::SecondFactorAccepted
        } else {
            Notice::SecondFactorRejected
        }
    }

    // -- Reminders --------------------------------------------------------

    /// Returns the reminder broadcast due at `now`, if any: one configured
    /// message (picked at random) for every unlinked active player.
    pub fn reminders_due(
        &mut self,
        now: Instant,
    ) -> Vec<(PlayerId, String)> {
        let Some(message) = self.reminders.due(now) else {
            return Vec::new();
        };
        self.sessions
            .iter()
            .filter(|(_, session)| !session.linked)
            .map(|(player, _)| (*player, message.clone()))
            .collect()
    }

    // -- Queries ----------------------------------------------------------

    /// `true` iff the player has an active session and is frozen.
    pub fn is_frozen(&self, player: PlayerId) -> bool {
        self.freeze.is_frozen(player)
    }

    fn linked(&self, player: PlayerId) -> bool {
        self.sessions
            .get(&player)
            .is_some_and(|session| session.linked)
    }
}

/// Freeze gate first (the stronger precondition), then the second factor.
fn combine(first: Gate, second: impl FnOnce() -> Gate) -> Gate {
    match first {
        Gate::Deny(reason) => Gate::Deny(reason),
        Gate::Allow => second(),
    }
}

/// Movement/interact/drop cancel without a message, matching the original
/// runtime behavior; the join notice already told the player why.
fn silent(gate: Gate) -> Decision {
    match gate {
        Gate::Allow => Decision::Allow,
        Gate::Deny(_) => Decision::Deny(None),
    }
}

fn command_notice(reason: BlockReason) -> Notice {
    match reason {
        BlockReason::Unverified => Notice::CommandBlocked,
        BlockReason::SecondFactorPending => Notice::SecondFactorRequired,
    }
}

// ---------------------------------------------------------------------------
// Reminder schedule
// ---------------------------------------------------------------------------

/// Paces the reminder broadcast and rotates its messages.
struct ReminderSchedule {
    config: ReminderConfig,
    last_broadcast: Option<Instant>,
}

impl ReminderSchedule {
    fn new(config: ReminderConfig) -> Self {
        Self {
            config,
            last_broadcast: None,
        }
    }

    /// Returns the message to broadcast when the interval has elapsed.
    ///
    /// The first call only starts the clock (the original scheduled its
    /// task with an initial delay of one full interval).
    fn due(&mut self, now: Instant) -> Option<String> {
        if self.config.messages.is_empty() {
            return None;
        }
        let interval = Duration::from_secs(self.config.interval_secs);
        match self.last_broadcast {
            None => {
                self.last_broadcast = Some(now);
                None
            }
            Some(prev) if now.duration_since(prev) < interval => None,
            Some(_) => {
                self.last_broadcast = Some(now);
                let mut rng = rand::rng();
                let index =
                    rng.random_range(0..self.config.messages.len());
                Some(self.config.messages[index].clone())
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
