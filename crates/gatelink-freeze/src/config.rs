//! Freeze and second-factor policy configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Commands a frozen player may still run, and the fixed allow-list of the
/// second-factor gate. Stored without the leading slash.
pub const DEFAULT_ALLOWED_COMMANDS: [&str; 4] =
    ["2fa", "login", "register", "verify"];

/// Policy for freezing unlinked players.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeConfig {
    /// Whether unlinked players are frozen at all. Default: false.
    pub enabled: bool,

    /// Whether the allow-list below applies. When false, a frozen player
    /// can run no commands at all. Default: true.
    pub allow_basic_commands: bool,

    /// Commands a frozen player may run (no leading slash, lowercase).
    /// An empty list falls back to [`DEFAULT_ALLOWED_COMMANDS`].
    pub allowed_commands: Vec<String>,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_basic_commands: true,
            allowed_commands: DEFAULT_ALLOWED_COMMANDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl FreezeConfig {
    /// Normalizes the allow-list: lowercase, no leading slash, defaults
    /// restored when the list is empty.
    pub fn validated(mut self) -> Self {
        for cmd in &mut self.allowed_commands {
            *cmd = cmd.trim_start_matches('/').to_lowercase();
        }
        if self.allowed_commands.is_empty() {
            warn!("freeze allow-list is empty — restoring defaults");
            self.allowed_commands = DEFAULT_ALLOWED_COMMANDS
                .iter()
                .map(|s| s.to_string())
                .collect();
        }
        self
    }
}

/// Policy for the secondary verification factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondFactorConfig {
    /// Whether a second factor is required for linked players at all.
    /// Default: false.
    pub enabled: bool,

    /// Whether an unsatisfied factor also gates movement, commands,
    /// interaction, and drops (rather than merely being requested).
    /// Default: true.
    pub freeze_until_verified: bool,

    /// Challenge code width (digits). Default: 6.
    pub code_length: usize,
}

impl Default for SecondFactorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            freeze_until_verified: true,
            code_length: 6,
        }
    }
}

impl SecondFactorConfig {
    pub const MIN_CODE_LENGTH: usize = 4;
    pub const MAX_CODE_LENGTH: usize = 10;

    pub fn validated(mut self) -> Self {
        self.code_length = self
            .code_length
            .clamp(Self::MIN_CODE_LENGTH, Self::MAX_CODE_LENGTH);
        self
    }
}
