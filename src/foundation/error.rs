/// Convenience result type used across framestack.
pub type FrameResult<T> = Result<T, FrameError>;

/// Top-level error taxonomy used by frame APIs.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// Invalid user-provided data (profiles, geometry, formats).
    #[error("validation error: {0}")]
    Validation(String),

    /// A pushed operation or fallback generator could not produce a buffer.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A documented precondition of a frame operation does not hold.
    #[error("precondition error: {0}")]
    Precondition(String),

    /// Errors while writing diagnostics to disk.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameError {
    /// Build a [`FrameError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FrameError::Resolution`] value.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Build a [`FrameError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`FrameError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
