//! fOS Media
//!
//! Media element state for the fOS browser engine.
//!
//! Features:
//! - HTMLMediaElement playback and audio state
//! - Autoplay policy gating of `play()`
//! - Play promises settled asynchronously

pub mod element;
pub mod policy;
pub mod promise;

pub use element::{HTMLMediaElement, MediaKind, NetworkState, ReadyState};
pub use policy::AutoplayPolicy;
pub use promise::PlayPromise;

/// Media error, mirroring the DOMException names `play()` rejects with
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("NotAllowedError: {0}")]
    NotAllowed(String),

    #[error("AbortError: the play request was interrupted")]
    Aborted,

    #[error("NotSupportedError: {0}")]
    NotSupported(String),
}
