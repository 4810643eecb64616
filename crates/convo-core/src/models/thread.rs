use serde::{Deserialize, Serialize};

use crate::address;

/// A discussion scoped to one normalized web address.
///
/// `title` is held decoded; percent-encoding exists only on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Opaque server-assigned identifier.
    pub id: String,
    pub title: String,
    /// Canonicalized page URL (`origin + pathname`, trailing slash).
    pub url: String,
    pub creator: String,
    /// Epoch milliseconds, as a string on the wire.
    pub created_on: String,
}

impl Thread {
    /// Advisory check for offering thread deletion in a UI.
    pub fn is_creator(&self, addr: &str) -> bool {
        address::same_address(&self.creator, addr)
    }
}
