//! Unified error type for the Gatelink meta-crate.

use gatelink_protocol::{ExternalId, PlayerId};
use gatelink_store::StoreError;
use gatelink_verify::VerifyError;

/// Top-level error covering every link operation.
///
/// Sub-crate errors are wrapped transparently (`#[from]` gives the `?`
/// operator automatic conversion); the policy-level rejections that only
/// the coordinator can decide live here directly.
#[derive(Debug, thiserror::Error)]
pub enum GatelinkError {
    /// A code-registry failure (cooldown, unknown/expired code).
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// A durable-store failure. The triggering operation took no effect.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The player already has a link and did not request a forced relink.
    #[error("player {0} is already linked")]
    AlreadyLinked(PlayerId),

    /// The player has no link to remove.
    #[error("player {0} is not linked")]
    NotLinked(PlayerId),

    /// The external account is already bound to a different player.
    #[error("external account {0} is already claimed")]
    ExternalIdClaimed(ExternalId),
}
