//! Wallet address helpers.
//!
//! Canonical address form is lower-case `0x` + 40 hex chars. Resolvable
//! display aliases (ENS-style names) are never authoritative; authorization
//! always works against the canonical address.

use crate::constants::TRUNCATE_KEEP;
use crate::error::{ConvoError, Result};

const ADDRESS_HEX_LEN: usize = 40;

/// Check whether `value` has the shape of a raw wallet address.
pub fn is_address(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(body) => body.len() == ADDRESS_HEX_LEN && hex::decode(body).is_ok(),
        None => false,
    }
}

/// Lower-case `address` into canonical form.
///
/// Idempotent for all valid inputs. Fails with [`ConvoError::InvalidAddress`]
/// when the input is not address-shaped.
pub fn normalize(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if !is_address(trimmed) {
        return Err(ConvoError::InvalidAddress(trimmed.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// True when `value` looks like a human-readable alias (e.g. `vitalik.eth`)
/// rather than a raw address. Purely syntactic, no resolution.
pub fn is_alias(value: &str) -> bool {
    !is_address(value) && value.contains('.') && !value.starts_with("0x")
}

/// Shorten an address for display: `0xabc…f3b` with `keep` hex chars kept on
/// each side. Aliases pass through unchanged.
pub fn truncate(value: &str, keep: usize) -> String {
    if !is_address(value) {
        return value.to_string();
    }
    let body = &value[2..];
    format!("0x{}…{}", &body[..keep], &body[body.len() - keep..])
}

/// [`truncate`] with the default display width.
pub fn truncate_default(value: &str) -> String {
    truncate(value, TRUNCATE_KEEP)
}

/// Advisory ownership check used before offering delete actions: address
/// equality is case-insensitive. The backend remains the authority.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
