//! Wallet collaborator seam.
//!
//! The core never talks to a wallet directly; a host supplies an
//! implementation of [`WalletProvider`] (browser extension bridge, hardware
//! wallet, test double). The provider exposes the active address as
//! observable state; the auth layer reacts to address changes by dropping
//! cached tokens.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompt the user to connect a wallet.
    ///
    /// Resolves to `Ok(None)` when the user dismisses the prompt — a
    /// cancellation, not an error. The returned address is canonical
    /// (lower-case).
    async fn connect(&self) -> Result<Option<String>>;

    /// Ask the wallet to sign `challenge` with the active key.
    ///
    /// May stay pending on user action indefinitely; a dismissal resolves to
    /// [`crate::ConvoError::AuthDenied`] rather than hanging.
    async fn sign_message(&self, challenge: &str) -> Result<String>;

    /// Currently active address, if any, in canonical form.
    fn address(&self) -> Option<String>;
}
