//! Root configuration, resolved once at startup.
//!
//! Every component receives its sub-config at construction; nothing does
//! string-keyed lookups at runtime. A missing or unparsable config file is
//! a fatal boot condition — the only class of failure that is.

use std::path::{Path, PathBuf};

use gatelink_freeze::{FreezeConfig, SecondFactorConfig};
use gatelink_verify::VerifyConfig;
use serde::{Deserialize, Serialize};

/// Settings for the messaging-network side of a completed link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Whether to push the player's name as the account's nickname after
    /// linking. Default: true.
    pub sync_nickname: bool,

    /// Nickname template; `%player%` is replaced with the player's display
    /// name. Default: `"%player%"`.
    pub nickname_format: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            sync_nickname: true,
            nickname_format: "%player%".into(),
        }
    }
}

impl GatewayConfig {
    /// Renders the nickname for a player display name.
    pub fn format_nickname(&self, display_name: &str) -> String {
        self.nickname_format.replace("%player%", display_name)
    }
}

/// Settings for the periodic verify-reminder broadcast.
///
/// Reminders go only to unlinked players with an active session. An empty
/// message list disables the broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Seconds between broadcasts. Default: 900.
    pub interval_secs: u64,

    /// Messages to rotate through (one picked at random per broadcast).
    pub messages: Vec<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_secs: 900,
            messages: Vec::new(),
        }
    }
}

/// The full Gatelink configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatelinkConfig {
    /// Path of the durable link file. Default: `links.json`.
    pub data_path: Option<PathBuf>,
    pub verify: VerifyConfig,
    pub freeze: FreezeConfig,
    pub second_factor: SecondFactorConfig,
    pub gateway: GatewayConfig,
    pub reminder: ReminderConfig,
}

impl GatelinkConfig {
    /// Loads and validates the configuration from a JSON file.
    ///
    /// Absent keys take their defaults, so a partial file is fine; an
    /// absent or unparsable *file* is not.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(ConfigError::Read)?;
        let config: Self =
            serde_json::from_slice(&bytes).map_err(ConfigError::Parse)?;
        Ok(config.validated())
    }

    /// Runs every sub-config's validation/clamping pass.
    pub fn validated(mut self) -> Self {
        self.verify = self.verify.validated();
        self.freeze = self.freeze.validated();
        self.second_factor = self.second_factor.validated();
        self
    }

    /// The link-file path, defaulted.
    pub fn data_path(&self) -> PathBuf {
        self.data_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("links.json"))
    }
}

/// Startup configuration failures. Genuinely unrecoverable: the caller
/// should refuse to boot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration could not be read: {0}")]
    Read(#[source] std::io::Error),

    #[error("configuration is invalid: {0}")]
    Parse(#[source] serde_json::Error),
}
