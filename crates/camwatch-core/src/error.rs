use thiserror::Error;

/// Why an interaction with a provider failed.
///
/// Every variant is turned into view-model state (error flag or
/// `StreamState::Failed`); none propagates as an uncaught fault into the
/// consuming view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network-level failure: connect refused, DNS, timeout.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// Non-2xx response.  Does not include the media provider's documented
    /// "no frame yet" 404, which is not an error.
    #[error("bad response: HTTP {0}")]
    BadResponse(u16),

    /// The body arrived but could not be parsed.
    #[error("malformed response body: {0}")]
    Parse(String),

    /// The frame payload could not be rendered as an image.
    #[error("media failed to load: {0}")]
    MediaLoad(String),
}

impl ProviderError {
    /// Short label for badges / status lines.
    pub fn badge_label(&self) -> &'static str {
        match self {
            ProviderError::Unreachable(_) => "UNREACH",
            ProviderError::BadResponse(_) => "HTTP",
            ProviderError::Parse(_) => "PARSE",
            ProviderError::MediaLoad(_) => "MEDIA",
        }
    }
}
