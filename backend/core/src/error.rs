use thiserror::Error;

/// Top-level error type for document extraction and validation.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("no master document data in session")]
    NoMasterData,

    #[error("inference provider error ({provider}): {message}")]
    Inference { provider: String, message: String },

    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("comparison does not match master data: {0}")]
    ComparisonMismatch(String),
}

impl VerifyError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingInput(what.into())
    }

    /// Whether the error was caused by the caller's input rather than a
    /// downstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingInput(_) | Self::NoMasterData)
    }
}
