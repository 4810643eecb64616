//! In-memory doubles for the collaborator seams.
//!
//! Used by this crate's own tests and available to hosts that want to drive
//! the stores without a wallet or a live backend. [`MockApi`] keeps comments
//! and threads in memory, counts calls per endpoint, and can inject
//! failures; [`MockWallet`] scripts connection and signing outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::address;
use crate::api::{CommentQuery, ConvoApi, Deletion, NewComment, NewThread, ThreadQuery};
use crate::error::{ConvoError, Result};
use crate::models::{Comment, Thread};
use crate::wallet::WalletProvider;

pub fn comment_fixture(id: &str, thread_id: &str, author: &str, text: &str) -> Comment {
    Comment {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        author: author.to_string(),
        author_alias: None,
        text: text.to_string(),
        url: Some("https://example.com/".to_string()),
        created_on: "1600000000000".to_string(),
    }
}

pub fn thread_fixture(id: &str, title: &str, url: &str, creator: &str) -> Thread {
    Thread {
        id: id.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        creator: creator.to_string(),
        created_on: "1600000000000".to_string(),
    }
}

#[derive(Default)]
struct WalletState {
    address: Option<String>,
    /// Address the connect prompt resolves to; `None` scripts a dismissal.
    connect_to: Option<String>,
    decline_signing: bool,
}

/// Scriptable wallet double.
#[derive(Clone, Default)]
pub struct MockWallet {
    state: Arc<Mutex<WalletState>>,
}

impl MockWallet {
    /// Wallet already connected to `address`.
    pub fn connected(address: &str) -> Self {
        let wallet = Self::default();
        {
            let mut state = wallet.state.lock();
            state.address = Some(address.to_string());
            state.connect_to = Some(address.to_string());
        }
        wallet
    }

    /// No wallet; the connect prompt is dismissed.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Not connected yet, but the connect prompt resolves to `address`.
    pub fn connectable(address: &str) -> Self {
        let wallet = Self::default();
        wallet.state.lock().connect_to = Some(address.to_string());
        wallet
    }

    /// Simulate the user switching accounts in the wallet.
    pub fn switch_address(&self, address: &str) {
        let mut state = self.state.lock();
        state.address = Some(address.to_string());
        state.connect_to = Some(address.to_string());
    }

    /// Make every subsequent signature prompt resolve to a decline.
    pub fn decline_signing(&self) {
        self.state.lock().decline_signing = true;
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<Option<String>> {
        let mut state = self.state.lock();
        match state.connect_to.clone() {
            Some(address) => {
                state.address = Some(address.clone());
                Ok(Some(address))
            }
            None => Ok(None),
        }
    }

    async fn sign_message(&self, challenge: &str) -> Result<String> {
        let state = self.state.lock();
        if state.decline_signing {
            return Err(ConvoError::AuthDenied);
        }
        let address = state.address.clone().ok_or(ConvoError::AuthDenied)?;
        Ok(format!("sig({address},{challenge})"))
    }

    fn address(&self) -> Option<String> {
        self.state.lock().address.clone()
    }
}

#[derive(Default)]
struct ApiState {
    comments: Vec<Comment>,
    threads: Vec<Thread>,
    next_id: usize,
    tokens_issued: usize,
    fail_next: Option<String>,
    reject_tokens: bool,
}

/// In-memory backend double.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<ApiState>,
    challenge_requests: AtomicUsize,
    comment_fetches: AtomicUsize,
    thread_fetches: AtomicUsize,
    comment_creates: AtomicUsize,
    comment_deletes: AtomicUsize,
    thread_creates: AtomicUsize,
    thread_deletes: AtomicUsize,
}

impl MockApi {
    pub fn seed_comment(&self, comment: Comment) {
        self.state.lock().comments.push(comment);
    }

    pub fn seed_thread(&self, thread: Thread) {
        self.state.lock().threads.push(thread);
    }

    /// Fail the next mutating call with a backend error message.
    pub fn fail_next(&self, message: &str) {
        self.state.lock().fail_next = Some(message.to_string());
    }

    /// Treat every presented token as rejected (401-equivalent).
    pub fn reject_tokens(&self, reject: bool) {
        self.state.lock().reject_tokens = reject;
    }

    pub fn challenge_requests(&self) -> usize {
        self.challenge_requests.load(Ordering::SeqCst)
    }

    pub fn comment_fetches(&self) -> usize {
        self.comment_fetches.load(Ordering::SeqCst)
    }

    pub fn thread_fetches(&self) -> usize {
        self.thread_fetches.load(Ordering::SeqCst)
    }

    pub fn comment_creates(&self) -> usize {
        self.comment_creates.load(Ordering::SeqCst)
    }

    pub fn comment_deletes(&self) -> usize {
        self.comment_deletes.load(Ordering::SeqCst)
    }

    pub fn thread_creates(&self) -> usize {
        self.thread_creates.load(Ordering::SeqCst)
    }

    pub fn thread_deletes(&self) -> usize {
        self.thread_deletes.load(Ordering::SeqCst)
    }

    fn check_mutation(state: &mut ApiState) -> Result<()> {
        if let Some(message) = state.fail_next.take() {
            return Err(ConvoError::Backend(message));
        }
        if state.reject_tokens {
            return Err(ConvoError::AuthRejected);
        }
        Ok(())
    }
}

#[async_trait]
impl ConvoApi for MockApi {
    async fn auth_challenge(&self, address: &str) -> Result<String> {
        self.challenge_requests.fetch_add(1, Ordering::SeqCst);
        Ok(format!("I am {address} and I approve this session"))
    }

    async fn auth_exchange(&self, address: &str, _signature: &str) -> Result<String> {
        let mut state = self.state.lock();
        state.tokens_issued += 1;
        Ok(format!("token-{address}-{}", state.tokens_issued))
    }

    async fn comments(&self, query: &CommentQuery) -> Result<Vec<Comment>> {
        self.comment_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        Ok(state
            .comments
            .iter()
            .filter(|c| match &query.thread_id {
                Some(thread_id) => &c.thread_id == thread_id,
                None => true,
            })
            .filter(|c| match &query.author {
                Some(author) => address::same_address(&c.author, author),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn create_comment(&self, req: &NewComment) -> Result<Comment> {
        let mut state = self.state.lock();
        Self::check_mutation(&mut state)?;
        self.comment_creates.fetch_add(1, Ordering::SeqCst);
        state.next_id += 1;
        let comment = Comment {
            id: format!("c{}", state.next_id),
            thread_id: req.thread_id.clone(),
            author: req.signer_address.clone(),
            author_alias: None,
            text: req.text.clone(),
            url: Some(req.url.clone()),
            created_on: "1600000000000".to_string(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, req: &Deletion) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_mutation(&mut state)?;
        let owned = state
            .comments
            .iter()
            .any(|c| c.id == req.id && address::same_address(&c.author, &req.signer_address));
        if !owned {
            return Err(ConvoError::Backend("Not your comment.".to_string()));
        }
        self.comment_deletes.fetch_add(1, Ordering::SeqCst);
        state.comments.retain(|c| c.id != req.id);
        Ok(())
    }

    async fn threads(&self, query: &ThreadQuery) -> Result<Vec<Thread>> {
        self.thread_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        Ok(state
            .threads
            .iter()
            .filter(|t| match &query.url {
                Some(url) => &t.url == url,
                None => true,
            })
            .filter(|t| match &query.thread_id {
                Some(thread_id) => &t.id == thread_id,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn create_thread(&self, req: &NewThread) -> Result<Thread> {
        let mut state = self.state.lock();
        Self::check_mutation(&mut state)?;
        self.thread_creates.fetch_add(1, Ordering::SeqCst);
        state.next_id += 1;
        let thread = Thread {
            id: format!("t{}", state.next_id),
            title: req.title.clone(),
            url: req.url.clone(),
            creator: req.signer_address.clone(),
            created_on: req.created_on.clone(),
        };
        // Newest first, as the backend lists them.
        state.threads.insert(0, thread.clone());
        Ok(thread)
    }

    async fn delete_thread(&self, req: &Deletion) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_mutation(&mut state)?;
        let owned = state
            .threads
            .iter()
            .any(|t| t.id == req.id && address::same_address(&t.creator, &req.signer_address));
        if !owned {
            return Err(ConvoError::Backend("Not your thread.".to_string()));
        }
        self.thread_deletes.fetch_add(1, Ordering::SeqCst);
        state.threads.retain(|t| t.id != req.id);
        Ok(())
    }
}
