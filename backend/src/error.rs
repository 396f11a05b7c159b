//! Errors raised while recomputing analytics for a filter state.

/// Result type for analytics passes
pub type ProcessingResult<T> = Result<T, ProcessingError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingError {
    /// A selection refers to a dimension the dataset does not have.
    #[error("Unknown dimension '{0}'")]
    UnknownDimension(String),

    /// Any other fault during a recomputation pass, captured at the top level.
    #[error("Analytics computation failed: {0}")]
    Unexpected(String),
}

impl ProcessingError {
    /// Build an `Unexpected` error from a captured panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown failure".to_string());
        ProcessingError::Unexpected(message)
    }
}
