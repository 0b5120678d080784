//! Identity and spatial types shared by every Gatelink layer.
//!
//! Both execution domains (the game-session simulation and the messaging-
//! network gateway) speak in these types, so they live in their own crate
//! with no dependencies beyond serde.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's stable identity within the game session runtime.
///
/// Wraps the session runtime's UUID. `#[serde(transparent)]` keeps the JSON
/// representation a plain UUID string, which is also the key format of the
/// persisted link file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generates a fresh random player ID. Mostly useful in tests and demos.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account identity on the external messaging network.
///
/// Opaque to Gatelink — the messaging side hands these out and we only ever
/// compare and store them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Position — movement gating input
// ---------------------------------------------------------------------------

/// A player's position and view direction in the session world.
///
/// The freeze gate cares only about the spatial components: a frozen player
/// may still look around, so `yaw`/`pitch` never participate in displacement
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns a copy with a different view direction but the same location.
    pub fn looking(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// `true` if any spatial coordinate differs from `other`.
    /// Orientation-only changes report `false`.
    pub fn displaced_from(&self, other: &Position) -> bool {
        self.x != other.x || self.y != other.y || self.z != other.z
    }

    /// `true` if the position crossed into a different world block.
    ///
    /// Coarser than [`displaced_from`](Self::displaced_from): small shuffles
    /// within one block do not count. Used by the second-factor gate.
    pub fn block_displaced_from(&self, other: &Position) -> bool {
        self.x.floor() != other.x.floor()
            || self.y.floor() != other.y.floor()
            || self.z.floor() != other.z.floor()
    }
}

// ---------------------------------------------------------------------------
// LinkEvent — the network → simulation hand-off
// ---------------------------------------------------------------------------

/// A completed link operation, queued from the network domain and applied
/// by the simulation domain on its next tick.
///
/// Only *outcomes* cross the boundary. By the time one of these is queued,
/// the durable store already reflects it; the simulation side merely updates
/// its enforcement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A verification code was redeemed and the link durably stored.
    Completed(PlayerId),
    /// The link was removed (voluntary unlink or remote-side departure).
    Broken(PlayerId),
}

impl LinkEvent {
    /// The player the event concerns.
    pub fn player(&self) -> PlayerId {
        match self {
            Self::Completed(p) | Self::Broken(p) => *p,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
