//! Freeze enforcement for Gatelink.
//!
//! Two independent gates restrict what a session may do:
//!
//! 1. **Freeze gate** ([`FreezeController`]) — unlinked players are frozen
//!    (policy-gated): no positional movement, only allow-listed commands,
//!    no interaction, no item drops.
//! 2. **Second-factor gate** ([`SecondFactorGate`]) — linked players with an
//!    unsatisfied session challenge get the same class of restrictions with
//!    a fixed, minimal command allow-list.
//!
//! Callers evaluate the freeze gate first — it is the stronger
//! precondition — and either gate may deny an action.

mod config;
mod controller;
mod gate;
mod second_factor;

pub use config::{
    DEFAULT_ALLOWED_COMMANDS, FreezeConfig, SecondFactorConfig,
};
pub use controller::FreezeController;
pub use gate::{BlockReason, Gate};
pub use second_factor::{SECOND_FACTOR_COMMANDS, SecondFactorGate};
