//! Choreography error types

use motus_animation::AnimationError;
use thiserror::Error;

/// Errors raised while turning a choreography into animations
#[derive(Error, Debug)]
pub enum ChoreographyError {
    #[error("unknown object '{0}'")]
    UnknownObject(String),

    #[error("object '{object}' has no field '{field}'")]
    UnknownField { object: String, field: String },

    #[error("object '{object}' has no color '{color}'")]
    UnknownColor { object: String, color: String },

    /// Path is not of the form `object.name`
    #[error("invalid path '{0}', expected 'object.name'")]
    InvalidPath(String),

    #[error("invalid run settings: {0}")]
    InvalidRun(String),

    #[error("{context}: {source}")]
    Animation {
        context: String,
        #[source]
        source: AnimationError,
    },
}

impl ChoreographyError {
    pub(crate) fn animation(context: impl Into<String>) -> impl FnOnce(AnimationError) -> Self {
        let context = context.into();
        move |source| ChoreographyError::Animation { context, source }
    }
}

pub type Result<T> = std::result::Result<T, ChoreographyError>;
