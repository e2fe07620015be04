use crate::render::frame::ColorModel;

/// Result alias used by every fallible mask operation.
pub type MaskResult<T> = Result<T, MaskError>;

/// Errors surfaced by the mask compositor and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum MaskError {
    /// Caller-provided geometry, parameters or buffers are invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// The output frame uses a color model the apply stage has no variant for.
    #[error("unsupported format: {0:?}")]
    UnsupportedFormat(ColorModel),

    /// A mask or scratch buffer could not be allocated.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Internal invariant broken while running a phase.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Any other failure, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaskError {
    /// Build a [`MaskError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MaskError::Allocation`].
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`MaskError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
