//! Durable identity-link registry for Gatelink.
//!
//! [`IdentityStore`] owns the player UUID → external account ID mapping and
//! is the single source of truth for "is this player linked". Records
//! survive restarts; everything else in the system (pending codes, freeze
//! state) is transient and rebuilt from this store on boot.

mod error;
mod store;

pub use error::StoreError;
pub use store::IdentityStore;
