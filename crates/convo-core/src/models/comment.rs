use serde::{Deserialize, Serialize};

use crate::address;

/// A single authored message belonging to a thread.
///
/// `text` is held decoded; percent-encoding exists only on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Opaque server-assigned identifier.
    pub id: String,
    pub thread_id: String,
    /// Canonical wallet address of the author.
    pub author: String,
    /// Resolved display alias (ENS-style), display-only, never authoritative.
    pub author_alias: Option<String>,
    pub text: String,
    /// Page URL the comment was made on (shown in the author dashboard).
    pub url: Option<String>,
    /// Epoch milliseconds, as a string on the wire.
    pub created_on: String,
}

impl Comment {
    /// Advisory check for offering the delete action in a UI. The backend
    /// remains the authority on every delete.
    pub fn is_author(&self, addr: &str) -> bool {
        address::same_address(&self.author, addr)
    }

    /// Display handle: `@alias` when resolved, else `@0xabc…def`.
    pub fn display_handle(&self) -> String {
        match &self.author_alias {
            Some(alias) => format!("@{alias}"),
            None => format!("@{}", address::truncate_default(&self.author)),
        }
    }

    /// Prefix prepended to the composer when replying to this comment.
    pub fn reply_prefix(&self) -> String {
        format!("@{} ", self.author)
    }
}
