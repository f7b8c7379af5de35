use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("event stream error: {0}")]
    Stream(String),
}

impl FetchError {
    /// Auth failures will not heal by retrying with the same token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { status: 401 | 403, .. })
    }
}
