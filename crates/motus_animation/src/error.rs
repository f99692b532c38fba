//! Animation error types

use thiserror::Error;

/// Errors raised while declaring or advancing animations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Duration is negative or not a number
    #[error("invalid duration: {0}")]
    InvalidDuration(f32),

    /// Delay is negative or not a number
    #[error("invalid delay: {0}")]
    InvalidDelay(f32),

    /// Repeat delay is negative or not a number
    #[error("invalid repeat delay: {0}")]
    InvalidRepeatDelay(f32),

    /// A tween was declared without any field to animate
    #[error("tween has no fields to animate")]
    EmptyTracks,

    /// The object owning the field was dropped or no longer exposes it
    #[error("target of field '{field}' is unavailable")]
    TargetUnavailable { field: String },

    /// The object owning the field is currently borrowed by the host
    #[error("target of field '{field}' is busy")]
    TargetBusy { field: String },

    /// Easing name could not be parsed
    #[error("unknown easing: {0}")]
    UnknownEasing(String),

    /// A color cycle needs at least one color
    #[error("color palette is empty")]
    EmptyPalette,

    /// Color string could not be parsed
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
