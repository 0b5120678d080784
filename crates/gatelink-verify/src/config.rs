//! Verification-code configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// The alphabet a verification code is drawn from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum CodeFormat {
    /// Digits only, zero-padded to the configured width (e.g. `042917`).
    Numeric,
    /// Uppercase letters and digits (e.g. `K7QX2M`).
    #[default]
    Alphanumeric,
}

/// Configuration for code issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Code alphabet. Default: alphanumeric.
    pub code_format: CodeFormat,

    /// Code length in characters (also the zero-padded width for numeric
    /// codes). Default: 6.
    pub code_length: usize,

    /// How long (in seconds) a code stays redeemable. Default: 300.
    pub code_ttl_secs: u64,

    /// Minimum interval (in seconds) between two code requests by the same
    /// player, independent of whether the earlier code was consumed or
    /// expired. Default: 60.
    pub cooldown_secs: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            code_format: CodeFormat::default(),
            code_length: 6,
            code_ttl_secs: 300,
            cooldown_secs: 60,
        }
    }
}

impl VerifyConfig {
    /// Minimum supported code length.
    pub const MIN_CODE_LENGTH: usize = 4;
    /// Maximum supported code length. Numeric codes must stay within the
    /// range of a `u64` draw (10^16 < 2^63).
    pub const MAX_CODE_LENGTH: usize = 16;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by `CodeRegistry::new`.
    pub fn validated(mut self) -> Self {
        if self.code_length < Self::MIN_CODE_LENGTH {
            warn!(
                length = self.code_length,
                min = Self::MIN_CODE_LENGTH,
                "code_length below minimum — clamping"
            );
            self.code_length = Self::MIN_CODE_LENGTH;
        }
        if self.code_length > Self::MAX_CODE_LENGTH {
            warn!(
                length = self.code_length,
                max = Self::MAX_CODE_LENGTH,
                "code_length exceeds maximum — clamping"
            );
            self.code_length = Self::MAX_CODE_LENGTH;
        }
        self
    }
}
