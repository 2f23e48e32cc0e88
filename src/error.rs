// ABOUTME: Crate-wide error type for cuesync
// ABOUTME: Covers asset loading, decoding, engine readiness, and output backend failures

use thiserror::Error;

/// Errors surfaced to callers of the playback engine.
///
/// The enum is `Clone` so that a single failed decode can be delivered to
/// every caller awaiting the same in-flight load future.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Fetch or decode of a section's audio failed. Recoverable: the cache
    /// entry reverts to absent so a later load can retry.
    #[error("failed to load section '{id}': {reason}")]
    AssetLoad {
        /// The section whose load failed.
        id: String,
        /// Human-readable cause (I/O or decode message).
        reason: String,
    },

    /// A decoder rejected the byte stream it was given.
    #[error("decode error: {0}")]
    Decode(String),

    /// No source URL has been registered for the requested section.
    #[error("no source registered for section '{0}'")]
    UnknownSection(String),

    /// `play` was called before the engine was initialized with an output
    /// context (which may only happen after a qualifying user interaction).
    #[error("audio engine not initialized")]
    EngineNotReady,

    /// The hardware output backend failed.
    #[error("audio output error: {0}")]
    Output(String),
}
