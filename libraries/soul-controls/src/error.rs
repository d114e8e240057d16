//! Error types for the control surface

use crate::view::Slot;
use thiserror::Error;

/// Control surface errors
///
/// Every variant is a programmer error raised synchronously to the caller.
/// Nothing here is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlsError {
    /// Bound object is not a recognised media element
    #[error("Media input was not a media element")]
    InvalidMediaSource,

    /// A UI slot was placed twice
    #[error("A UI object already occupies slot '{0}'")]
    DuplicatePlacement(Slot),

    /// A UI slot the controller needs was never placed
    #[error("Required UI slot '{0}' was not placed")]
    MissingSlot(Slot),

    /// Volume was NaN, infinite or outside [0, 1]
    #[error("Invalid volume: {0} (expected a number between 0 and 1)")]
    InvalidVolume(f64),

    /// Event name was empty or contained characters outside `[a-z0-9.*-]`
    #[error("Attempt to subscribe to event with invalid name: {0:?}")]
    InvalidEventName(String),

    /// Handler was not callable
    #[error("Attempt to subscribe to '{0}' without a callable handler")]
    InvalidHandler(String),

    /// Name does not correspond to any relayed media event
    #[error("Unknown media event: {0:?}")]
    UnknownMediaEvent(String),
}

/// Result type for control surface operations
pub type Result<T> = std::result::Result<T, ControlsError>;
