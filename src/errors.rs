use thiserror::Error;

/// Typed error hierarchy for the relay pipeline.
///
/// Each variant names the step that failed. Collaborator and leaf functions
/// return `anyhow::Result`; the orchestrator classifies those into the step
/// variants, and anything unclassified converts through `Internal` via `?`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Media fetch error: {0}")]
    Fetch(String),

    #[error("Malformed content type: {0:?}")]
    MalformedContentType(String),

    #[error("Lookup error: {target}: {message}")]
    Lookup { target: String, message: String },

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Post error: {0}")]
    Post(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for results using `BridgeError`.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Short stable label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Fetch(_) => "fetch",
            Self::MalformedContentType(_) => "content_type",
            Self::Lookup { .. } => "lookup",
            Self::Upload(_) => "upload",
            Self::Post(_) => "post",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}
