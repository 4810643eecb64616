use crate::constants::{DEFAULT_API_KEY, DEFAULT_API_URL};

/// Connection settings for the discussion backend.
///
/// Every request carries `api_key` as the `apikey` query parameter.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub api_url: String,
    pub api_key: String,
}

impl CoreConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from `CONVO_API_URL` / `CONVO_API_KEY`, falling back to the
    /// public instance defaults.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("CONVO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: std::env::var("CONVO_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string()),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_API_KEY)
    }
}
