//! fOS Autoplay
//!
//! Plays the videos a reader is looking at and silences the rest.
//!
//! Two reactive pieces cooperate:
//! - [`DiscoveryScanner`] finds every `<video>` in the document after each
//!   mutation batch and hands new ones to the tracker exactly once.
//! - [`VisibilityTracker`] classifies each registered video as visible or
//!   hidden against the viewport and reports threshold crossings, which
//!   [`playback`] turns into unmute/play and pause/mute.
//!
//! [`AutoplayController`] wires both to a [`fos_dom::Document`].
//!
//! # Example
//! ```rust,ignore
//! use fos_autoplay::{AutoplayController, AutoplayConfig};
//!
//! let mut controller = AutoplayController::new(AutoplayConfig::default())?;
//! controller.attach(&mut document)?;
//! // host event loop
//! controller.on_mutations(&mut document);
//! controller.on_frame(&mut document);
//! controller.run_until_stalled();
//! ```

mod config;
mod controller;
mod registry;
mod scanner;
mod visibility;
pub mod playback;

pub use config::{AutoplayConfig, DEFAULT_THRESHOLD};
pub use controller::{AutoplayController, PlaybackStats};
pub use registry::RegisteredSet;
pub use scanner::{DiscoveryScanner, Registrar, ScanReport};
pub use visibility::{
    Classification, IntersectionSource, LayoutIntersection, Transition, VisibilityTracker,
};

use fos_dom::DomError;

/// Autoplay errors
#[derive(Debug, thiserror::Error)]
pub enum AutoplayError {
    #[error("threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("root margin must be a non-negative number, got {0}")]
    InvalidRootMargin(f32),

    #[error("media tag must not be empty")]
    EmptyMediaTag,

    #[error("controller is already attached to a document")]
    AlreadyAttached,

    #[error(transparent)]
    Dom(#[from] DomError),
}
