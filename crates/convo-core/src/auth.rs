//! Wallet-signature auth: challenge → signature → bearer token.
//!
//! Tokens are cached per address for the process lifetime only and dropped
//! when the active address changes, the TTL lapses, or the backend rejects
//! one. Acquisition is single-flight: concurrent callers queue on the same
//! in-flight request instead of issuing duplicate signature prompts.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::api::ConvoApi;
use crate::error::{ConvoError, Result};
use crate::models::Session;
use crate::wallet::WalletProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticated,
    Expired,
}

pub struct AuthSession {
    api: Arc<dyn ConvoApi>,
    wallet: Arc<dyn WalletProvider>,
    state: Mutex<SessionState>,
    sessions: Mutex<HashMap<String, Session>>,
    /// Held across challenge → sign → exchange so only one signature prompt
    /// is ever in flight.
    acquiring: AsyncMutex<()>,
}

impl AuthSession {
    pub fn new(api: Arc<dyn ConvoApi>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            api,
            wallet,
            state: Mutex::new(SessionState::Disconnected),
            sessions: Mutex::new(HashMap::new()),
            acquiring: AsyncMutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Active wallet address in canonical form, if connected.
    pub fn current_address(&self) -> Option<String> {
        self.wallet.address().map(|a| a.to_ascii_lowercase())
    }

    /// Trigger the wallet-connection prompt.
    ///
    /// `Ok(None)` means the user dismissed the prompt; the session stays
    /// `Disconnected` and no error is surfaced.
    pub async fn connect(&self) -> Result<Option<String>> {
        *self.state.lock() = SessionState::Connecting;
        match self.wallet.connect().await {
            Ok(Some(address)) => {
                let address = address.to_ascii_lowercase();
                self.drop_other_sessions(&address);
                *self.state.lock() = SessionState::Authenticated;
                debug!(address = %address, "wallet connected");
                Ok(Some(address))
            }
            Ok(None) => {
                *self.state.lock() = SessionState::Disconnected;
                Ok(None)
            }
            Err(err) => {
                *self.state.lock() = SessionState::Disconnected;
                Err(err)
            }
        }
    }

    /// Return a valid bearer token for the current address, acquiring one via
    /// challenge/signature/exchange when the cache has none.
    pub async fn get_token(&self) -> Result<String> {
        let address = self
            .current_address()
            .ok_or_else(|| ConvoError::Validation("wallet not connected".to_string()))?;

        // Switching wallet addresses invalidates any prior token before a
        // request using it can be issued.
        self.drop_other_sessions(&address);

        if let Some(token) = self.cached_token(&address) {
            return Ok(token);
        }

        let _guard = self.acquiring.lock().await;
        // A concurrent caller may have filled the cache while we queued.
        if let Some(token) = self.cached_token(&address) {
            return Ok(token);
        }

        debug!(address = %address, "requesting auth challenge");
        let challenge = self.api.auth_challenge(&address).await?;
        let signature = self.wallet.sign_message(&challenge).await?;
        let token = self.api.auth_exchange(&address, &signature).await?;

        self.sessions
            .lock()
            .insert(address.clone(), Session::new(address, token.clone()));
        *self.state.lock() = SessionState::Authenticated;
        Ok(token)
    }

    /// Drop all cached tokens. Called on sign-out or when a request using
    /// the token came back 401-equivalent.
    pub fn invalidate(&self) {
        self.sessions.lock().clear();
        let mut state = self.state.lock();
        *state = if self.wallet.address().is_some() {
            SessionState::Expired
        } else {
            SessionState::Disconnected
        };
    }

    fn cached_token(&self, address: &str) -> Option<String> {
        let mut sessions = self.sessions.lock();
        match sessions.get(address) {
            Some(session) if !session.is_expired() => Some(session.token.clone()),
            Some(_) => {
                sessions.remove(address);
                *self.state.lock() = SessionState::Expired;
                None
            }
            None => None,
        }
    }

    fn drop_other_sessions(&self, address: &str) {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|cached_address, _| cached_address == address);
        if sessions.len() != before {
            debug!("active address changed, dropped stale sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockApi, MockWallet};

    const ALICE: &str = "0x9fa1c391e1a7fbb1cde3b9ad05afc6c796e5e3b1";
    const BOB: &str = "0x1111111111111111111111111111111111111111";

    fn auth_with(wallet: MockWallet) -> (Arc<MockApi>, AuthSession) {
        let api = Arc::new(MockApi::default());
        let auth = AuthSession::new(api.clone(), Arc::new(wallet));
        (api, auth)
    }

    #[tokio::test]
    async fn test_token_cached_per_address() {
        let (api, auth) = auth_with(MockWallet::connected(ALICE));
        let first = auth.get_token().await.unwrap();
        let second = auth.get_token().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(api.challenge_requests(), 1);
        assert_eq!(auth.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_request() {
        let (api, auth) = auth_with(MockWallet::connected(ALICE));
        let auth = Arc::new(auth);
        let (a, b) = tokio::join!(
            {
                let auth = auth.clone();
                async move { auth.get_token().await }
            },
            {
                let auth = auth.clone();
                async move { auth.get_token().await }
            }
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(api.challenge_requests(), 1);
    }

    #[tokio::test]
    async fn test_address_switch_invalidates_token() {
        let wallet = MockWallet::connected(ALICE);
        let api = Arc::new(MockApi::default());
        let auth = AuthSession::new(api.clone(), Arc::new(wallet.clone()));

        let first = auth.get_token().await.unwrap();
        wallet.switch_address(BOB);
        let second = auth.get_token().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(api.challenge_requests(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_challenge() {
        let (api, auth) = auth_with(MockWallet::connected(ALICE));
        auth.get_token().await.unwrap();
        auth.invalidate();
        assert_eq!(auth.state(), SessionState::Expired);
        auth.get_token().await.unwrap();
        assert_eq!(api.challenge_requests(), 2);
    }

    #[tokio::test]
    async fn test_declined_signature_is_auth_denied() {
        let wallet = MockWallet::connected(ALICE);
        wallet.decline_signing();
        let (_, auth) = auth_with(wallet);
        assert!(matches!(auth.get_token().await, Err(ConvoError::AuthDenied)));
    }

    #[tokio::test]
    async fn test_cancelled_connect_is_not_an_error() {
        let (_, auth) = auth_with(MockWallet::disconnected());
        let result = auth.connect().await.unwrap();
        assert!(result.is_none());
        assert_eq!(auth.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_get_token_without_wallet_fails_locally() {
        let (api, auth) = auth_with(MockWallet::disconnected());
        assert!(matches!(
            auth.get_token().await,
            Err(ConvoError::Validation(_))
        ));
        assert_eq!(api.challenge_requests(), 0);
    }
}
