//! Verification codes for Gatelink.
//!
//! This crate handles the short-lived shared secret that proves a player
//! controls both identities being linked:
//!
//! 1. **Issuance** — one live code per player, drawn from a configurable
//!    alphabet ([`CodeRegistry::generate`])
//! 2. **Expiry** — lazy wall-clock TTL, checked at redemption time
//! 3. **Single use** — redeeming a code removes it atomically
//!    ([`CodeRegistry::consume`])
//! 4. **Cooldown** — a per-player floor between issuances, independent of
//!    whether the earlier code was used
//!
//! Codes are uniform random but not cryptographic: they are relayed by a
//! human within minutes, and the TTL plus single-use consumption bound the
//! guessing window.

mod config;
mod error;
mod registry;

pub use config::{CodeFormat, VerifyConfig};
pub use error::VerifyError;
pub use registry::{CodeRegistry, PendingVerification};
