//! # Gatelink
//!
//! Binds a player identity in a game-session runtime to an account on an
//! independently-operated messaging network, using a short-lived
//! human-relayed code as proof of possession, and freezes unlinked players
//! until the binding (and optionally a second factor) is satisfied.
//!
//! ## Architecture
//!
//! Two execution domains never share mutable state directly:
//!
//! ```text
//!  simulation loop (single thread)          network workers (tokio pool)
//!  ┌──────────────────────────┐             ┌──────────────────────────┐
//!  │ PlayerHooks              │             │ GatewayHandler<Messenger>│
//!  │  freeze + second factor  │             │  redeem / departures     │
//!  └───────────┬──────────────┘             └───────────┬──────────────┘
//!              │        ┌──────────────────────┐        │
//!              └───────→│   LinkCoordinator    │←───────┘
//!   (async calls, short │  Mutex<CodeRegistry> │ (async calls)
//!    critical sections) │  Mutex<IdentityStore>│
//!                       └──────────┬───────────┘
//!                                  │ LinkEvent queue
//!              ┌───────────────────┘ (drained once per tick)
//!              ▼
//!       PlayerHooks::drain_link_events
//! ```
//!
//! Enforcement state is owned exclusively by the simulation side; link
//! outcomes cross over as queued [`LinkEvent`]s, so a redemption arriving
//! mid-tick can never race a movement check.
//!
//! [`LinkEvent`]: gatelink_protocol::LinkEvent

#![allow(async_fn_in_trait)]

mod config;
mod coordinator;
mod error;
mod events;
mod gateway;
mod hooks;
mod notices;

pub use config::{
    ConfigError, GatelinkConfig, GatewayConfig, ReminderConfig,
};
pub use coordinator::LinkCoordinator;
pub use error::GatelinkError;
pub use events::{link_event_channel, LinkEventQueue, LinkEventSender};
pub use gateway::{GatewayHandler, Messenger};
pub use hooks::{Decision, JoinOutcome, PlayerHooks};
pub use notices::Notice;
