//! Error types for code issuance and redemption.

/// Errors that can occur in the code registry.
///
/// Both variants are expected, user-recoverable conditions — the caller maps
/// each to a distinct user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// A new code was requested before the per-player cooldown elapsed.
    /// The player retries after `remaining_secs`.
    #[error("a new code can be requested in {remaining_secs}s")]
    OnCooldown { remaining_secs: u64 },

    /// The presented code matches no live pending verification.
    ///
    /// Deliberately covers both "never issued" and "expired" — callers must
    /// not be able to distinguish the two.
    #[error("unknown or expired verification code")]
    NotFoundOrExpired,
}
