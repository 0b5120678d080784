//! Core identity types for Gatelink.
//!
//! Gatelink binds a player identity in the game-session runtime to an
//! account on an external messaging network. This crate defines the types
//! that cross every internal boundary:
//!
//! - [`PlayerId`] — the session-side identity (a stable UUID)
//! - [`ExternalId`] — the messaging-side account identity
//! - [`Position`] — spatial input to the movement gates
//! - [`LinkEvent`] — a completed link operation crossing from the network
//!   domain into the simulation domain

mod types;

pub use types::{ExternalId, LinkEvent, PlayerId, Position};
