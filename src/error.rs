use thiserror::Error;

/// Rejections raised before any network or storage work happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter some text to summarize")]
    Empty,
    #[error("text is too short to summarize: {words} words, need at least {min}")]
    TooShort { words: usize, min: usize },
    #[error("text is too long: {words} words, limit is {max}")]
    TooLong { words: usize, max: usize },
}

/// Failures of a single remote inference attempt. The orchestrator recovers
/// from all of these; none reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("network failure: {0}")]
    Network(String),
    #[error("inference call failed with status {status}: {body}")]
    HttpError { status: u16, body: String },
    #[error("inference response contained an empty summary")]
    EmptyResult,
    #[error("unexpected inference response shape: {0}")]
    UnexpectedResponseShape(String),
}

impl RemoteError {
    /// Failures that route the primary attempt to the secondary model rather
    /// than straight to the heuristic summarizer.
    pub fn routes_to_secondary(&self) -> bool {
        matches!(
            self,
            RemoteError::EmptyResult | RemoteError::HttpError { status: 400, .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "E101_TIMEOUT",
            Self::Network(_) => "E102_NETWORK",
            Self::HttpError { .. } => "E103_HTTP",
            Self::EmptyResult => "E104_EMPTY_RESULT",
            Self::UnexpectedResponseShape(_) => "E105_RESPONSE_SHAPE",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("stored history is not valid json: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}
