/// Convenience result type used across frame-seeker.
pub type SeekResult<T> = Result<T, SeekError>;

/// Top-level error taxonomy used by driver, media and recording APIs.
#[derive(thiserror::Error, Debug)]
pub enum SeekError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// The media source cannot be driven (bad duration, closed notifications, ...).
    #[error("media error: {0}")]
    Media(String),

    /// A seek was commanded but never confirmed within the configured timeout.
    #[error("seek to {position:.6}s was not confirmed within {timeout_ms}ms")]
    SeekTimeout {
        /// Position the driver was waiting on, in seconds.
        position: f64,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// `start` was called while another run is still in flight.
    #[error("a seek run is already in progress")]
    Busy,

    /// Errors raised while consuming a frame (capture, composite, sink).
    #[error("frame error: {0}")]
    Frame(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeekError {
    /// Build a [`SeekError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SeekError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`SeekError::Frame`] value.
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    /// Build a [`SeekError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
