use std::time::Instant;

use crate::constants::TOKEN_TTL_SECS;

/// A bearer credential tied to one wallet address.
///
/// Lives only for the process lifetime; never persisted. Dropped when the
/// active address changes or the backend rejects the token.
#[derive(Debug, Clone)]
pub struct Session {
    /// Canonical (lower-case) wallet address the token was issued for.
    pub address: String,
    pub token: String,
    pub obtained_at: Instant,
}

impl Session {
    pub fn new(address: String, token: String) -> Self {
        Self {
            address,
            token,
            obtained_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.obtained_at.elapsed().as_secs() >= TOKEN_TTL_SECS
    }
}
