use derive_more::Display;

/// Every failure the feed can report to its host
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DataFeedError {
    #[display(fmt = "Unknown symbol: {}", _0)]
    SymbolNotFound(String),
    #[display(fmt = "Fetch failed: {}", _0)]
    Fetch(String),
    #[display(fmt = "Request timed out after {} ms", _0)]
    Timeout(u64),
    #[display(fmt = "Unsupported resolution: {}", _0)]
    UnsupportedResolution(String),
    #[display(fmt = "Invalid request: {}", _0)]
    InvalidRequest(String),
    #[display(fmt = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[display(fmt = "Failed to spawn task: {}", _0)]
    Spawn(String),
}

impl DataFeedError {
    /// Transport-level failures of a backend call
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout(_))
    }
}

impl std::error::Error for DataFeedError {}

pub type FeedResult<T> = Result<T, DataFeedError>;
