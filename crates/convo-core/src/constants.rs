//! Application-wide constants
//!
//! Centralized location for magic strings and limits used across modules.

/// Default backend origin for the public instance.
pub const DEFAULT_API_URL: &str = "https://theconvo.space";

/// App-identifying key attached to every request as `?apikey=`.
pub const DEFAULT_API_KEY: &str = "CONVO";

/// Soft client-side cap on comment length, matching the composer input.
/// A guard for the UI, not a security boundary; the backend enforces its own.
pub const MAX_COMMENT_LEN: usize = 200;

/// Soft client-side cap on thread title length.
pub const MAX_TITLE_LEN: usize = 300;

/// Bearer tokens older than this are re-acquired on the next `get_token()`.
pub const TOKEN_TTL_SECS: u64 = 60 * 60;

/// Hex characters kept on each side by the default address truncation.
pub const TRUNCATE_KEEP: usize = 3;
