//! Error types for the identity store.

/// Errors that can occur while loading or persisting link records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The durable file could not be written. The operation that triggered
    /// the write is rolled back in memory, so the on-disk state remains the
    /// truth — callers must not apply dependent side effects (e.g. do not
    /// unfreeze a player whose link failed to persist).
    #[error("identity store persistence failed: {0}")]
    Persistence(#[source] std::io::Error),

    /// The store file exists but could not be parsed. Surfaces at startup;
    /// refusing to load beats silently discarding every link.
    #[error("identity store file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The in-memory map could not be serialized. Practically unreachable
    /// with string-keyed records, but kept distinct from I/O failure.
    #[error("identity store could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}
