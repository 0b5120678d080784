//! Gate verdicts returned by every enforcement check.

/// The outcome of gating one player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The action proceeds.
    Allow,
    /// The action is cancelled; the reason says which gate fired.
    Deny(BlockReason),
}

impl Gate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Which precondition blocked the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The player has no identity link and the freeze policy is active.
    Unverified,
    /// The player is linked but the second factor is not yet satisfied.
    SecondFactorPending,
}
