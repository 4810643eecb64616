//! Error taxonomy for the core.
//!
//! Everything here is recoverable by user retry; no variant is fatal to the
//! process. Validation failures are raised before any state mutation or
//! network call, and backend/authorization failures roll back optimistic
//! cache updates before surfacing.

pub type Result<T> = std::result::Result<T, ConvoError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvoError {
    /// Input does not have the shape of a wallet address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Local input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The user declined the wallet signature prompt. Not retried
    /// automatically; the next user-initiated action re-prompts.
    #[error("signature request declined")]
    AuthDenied,

    /// The backend rejected the bearer credential. The session is
    /// invalidated; the next action re-authenticates.
    #[error("authorization rejected by server")]
    AuthRejected,

    /// Non-success response from the backend. The message is surfaced
    /// verbatim to the caller.
    #[error("{0}")]
    Backend(String),

    /// Transport-level failure. The cache retries on the next natural
    /// revalidation trigger, never in an immediate loop.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ConvoError {
    fn from(err: reqwest::Error) -> Self {
        ConvoError::Network(err.to_string())
    }
}

impl ConvoError {
    /// True for failures that should drop the cached session token.
    pub fn invalidates_session(&self) -> bool {
        matches!(self, ConvoError::AuthRejected)
    }
}
