//! Domain operations on comments, built on [`QueryCache`] and [`AuthSession`].
//!
//! Lists are cached per thread (and per author for the dashboard view);
//! create/delete apply optimistic cache updates once the backend confirms,
//! without waiting for a corroborating re-fetch. Failures leave the cache in
//! its last-known-good state.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use crate::api::{CommentQuery, ConvoApi, Deletion, NewComment};
use crate::auth::AuthSession;
use crate::cache::{QueryCache, QueryKey, Snapshot};
use crate::constants::MAX_COMMENT_LEN;
use crate::error::{ConvoError, Result};
use crate::models::Comment;

pub struct CommentStore {
    api: Arc<dyn ConvoApi>,
    auth: Arc<AuthSession>,
    cache: QueryCache<Vec<Comment>>,
}

impl CommentStore {
    pub fn new(api: Arc<dyn ConvoApi>, auth: Arc<AuthSession>) -> Self {
        Self {
            api,
            auth,
            cache: QueryCache::new(),
        }
    }

    fn thread_key(thread_id: &str) -> QueryKey {
        QueryKey::with_params(
            "/comments",
            [("threadId".to_string(), thread_id.to_string())],
        )
    }

    fn author_key(author: &str) -> QueryKey {
        QueryKey::with_params(
            "/comments",
            [("author".to_string(), author.to_ascii_lowercase())],
        )
    }

    fn fetch_for(
        &self,
        query: CommentQuery,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<Comment>>> + Send + 'static {
        let api = self.api.clone();
        move || -> BoxFuture<'static, Result<Vec<Comment>>> {
            Box::pin(async move { api.comments(&query).await })
        }
    }

    /// Comments of one thread, in server order. A `None` thread id yields no
    /// fetch and an empty snapshot.
    pub async fn list(&self, thread_id: Option<&str>) -> Snapshot<Vec<Comment>> {
        let key = thread_id.map(Self::thread_key);
        let query = CommentQuery {
            thread_id: thread_id.map(str::to_string),
            ..Default::default()
        };
        self.cache.read(key.as_ref(), self.fetch_for(query)).await
    }

    /// Everything one address has written, for the author dashboard. `None`
    /// (not connected) yields no fetch.
    pub async fn list_by_author(&self, author: Option<&str>) -> Snapshot<Vec<Comment>> {
        let key = author.map(Self::author_key);
        let query = CommentQuery {
            author: author.map(|a| a.to_ascii_lowercase()),
            ..Default::default()
        };
        self.cache.read(key.as_ref(), self.fetch_for(query)).await
    }

    /// Advisory UX guard: offer the delete action only for the caller's own
    /// comments. The backend stays authoritative on the actual delete.
    pub fn can_delete(&self, comment: &Comment) -> bool {
        match self.auth.current_address() {
            Some(address) => comment.is_author(&address),
            None => false,
        }
    }

    /// Post a comment to `thread_id` and append it to the cached list.
    ///
    /// Validation happens before any network call. A disconnected caller is
    /// routed through the wallet-connection prompt first; declining it
    /// surfaces [`ConvoError::AuthDenied`].
    pub async fn create(&self, thread_id: &str, thread_url: &str, text: &str) -> Result<Comment> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ConvoError::Validation(
                "can't send an empty message".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_COMMENT_LEN {
            return Err(ConvoError::Validation(format!(
                "message is longer than {MAX_COMMENT_LEN} characters"
            )));
        }

        let address = self.require_address().await?;
        let token = self.auth.get_token().await?;

        let req = NewComment {
            token,
            signer_address: address,
            text: trimmed.to_string(),
            thread_id: thread_id.to_string(),
            url: thread_url.to_string(),
        };
        let created = match self.api.create_comment(&req).await {
            Ok(comment) => comment,
            Err(err) => {
                if err.invalidates_session() {
                    self.auth.invalidate();
                }
                warn!(thread_id, "comment create failed: {err}");
                return Err(err);
            }
        };

        // Appended last: server order is chronological.
        let key = Self::thread_key(thread_id);
        let mut list = self.cache.get(&key).unwrap_or_default();
        list.push(created.clone());
        self.cache.mutate(&key, list);

        Ok(created)
    }

    /// Delete a comment and filter it out of the cached lists by id.
    ///
    /// Rejected locally, without a network call, when the comment is cached
    /// and not authored by the current address.
    pub async fn delete(&self, thread_id: &str, comment_id: &str) -> Result<()> {
        let address = self
            .auth
            .current_address()
            .ok_or_else(|| ConvoError::Validation("wallet not connected".to_string()))?;

        let key = Self::thread_key(thread_id);
        if let Some(list) = self.cache.get(&key) {
            if let Some(comment) = list.iter().find(|c| c.id == comment_id) {
                if !comment.is_author(&address) {
                    return Err(ConvoError::Validation(
                        "only the author can delete a comment".to_string(),
                    ));
                }
            }
        }

        let token = self.auth.get_token().await?;
        let req = Deletion {
            token,
            signer_address: address.clone(),
            id: comment_id.to_string(),
        };
        if let Err(err) = self.api.delete_comment(&req).await {
            if err.invalidates_session() {
                self.auth.invalidate();
            }
            // Cache untouched: the list still shows the comment.
            return Err(err);
        }

        self.remove_cached(&key, comment_id);
        self.remove_cached(&Self::author_key(&address), comment_id);
        Ok(())
    }

    fn remove_cached(&self, key: &QueryKey, comment_id: &str) {
        if let Some(list) = self.cache.get(key) {
            let filtered: Vec<Comment> = list.into_iter().filter(|c| c.id != comment_id).collect();
            self.cache.mutate(key, filtered);
        }
    }

    async fn require_address(&self) -> Result<String> {
        if let Some(address) = self.auth.current_address() {
            return Ok(address);
        }
        // Not connected: route the intent into the connection prompt instead
        // of submitting.
        match self.auth.connect().await? {
            Some(address) => Ok(address),
            None => Err(ConvoError::AuthDenied),
        }
    }
}
