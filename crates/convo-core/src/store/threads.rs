//! Domain operations on threads.
//!
//! Thread lists are keyed by the normalized page URL; an absent or
//! unparseable link maps to the wider "explore all" key rather than an
//! error. New threads are optimistically prepended so they surface at the
//! top of the list before any server re-fetch.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::warn;

use crate::api::{ConvoApi, Deletion, NewThread, ThreadQuery};
use crate::auth::AuthSession;
use crate::cache::{QueryCache, QueryKey, Snapshot};
use crate::constants::MAX_TITLE_LEN;
use crate::error::{ConvoError, Result};
use crate::models::Thread;
use crate::page_url::normalize_page_url;

pub struct ThreadStore {
    api: Arc<dyn ConvoApi>,
    auth: Arc<AuthSession>,
    cache: QueryCache<Vec<Thread>>,
}

impl ThreadStore {
    pub fn new(api: Arc<dyn ConvoApi>, auth: Arc<AuthSession>) -> Self {
        Self {
            api,
            auth,
            cache: QueryCache::new(),
        }
    }

    fn url_key(url: Option<&str>) -> QueryKey {
        match url {
            Some(url) => {
                QueryKey::with_params("/threads", [("url".to_string(), url.to_string())])
            }
            None => QueryKey::new("/threads"),
        }
    }

    fn id_key(thread_id: &str) -> QueryKey {
        QueryKey::with_params(
            "/threads",
            [("threadId".to_string(), thread_id.to_string())],
        )
    }

    fn fetch_for(
        &self,
        query: ThreadQuery,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<Thread>>> + Send + 'static {
        let api = self.api.clone();
        move || -> BoxFuture<'static, Result<Vec<Thread>>> {
            Box::pin(async move { api.threads(&query).await })
        }
    }

    /// Threads for one page link; `None` or an unparseable link lists
    /// everything ("explore all").
    pub async fn list_for_url(&self, link: Option<&str>) -> Snapshot<Vec<Thread>> {
        let url = normalize_page_url(link);
        let key = Self::url_key(url.as_deref());
        let query = ThreadQuery {
            url,
            thread_id: None,
        };
        self.cache.read(Some(&key), self.fetch_for(query)).await
    }

    /// Look a single thread up by id. `data` of `Some(None)` means the fetch
    /// resolved but the id is unknown (the caller typically navigates away).
    pub async fn get(&self, thread_id: &str) -> Snapshot<Option<Thread>> {
        let key = Self::id_key(thread_id);
        let query = ThreadQuery {
            url: None,
            thread_id: Some(thread_id.to_string()),
        };
        let snapshot = self.cache.read(Some(&key), self.fetch_for(query)).await;
        Snapshot {
            data: snapshot.data.map(|list| list.into_iter().next()),
            error: snapshot.error,
            is_validating: snapshot.is_validating,
        }
    }

    /// Create a thread about `link` and prepend it to the cached list for
    /// that page (or the explore-all list when no link is given).
    pub async fn create(&self, title: &str, link: Option<&str>) -> Result<Thread> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ConvoError::Validation("empty thread title".to_string()));
        }
        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ConvoError::Validation(format!(
                "title is longer than {MAX_TITLE_LEN} characters"
            )));
        }

        let address = self.require_address().await?;
        let token = self.auth.get_token().await?;

        let url = normalize_page_url(link);
        let req = NewThread {
            token,
            signer_address: address,
            title: trimmed.to_string(),
            url: url.clone().unwrap_or_default(),
            created_on: Utc::now().timestamp_millis().to_string(),
        };
        let created = match self.api.create_thread(&req).await {
            Ok(thread) => thread,
            Err(err) => {
                if err.invalidates_session() {
                    self.auth.invalidate();
                }
                warn!("thread create failed: {err}");
                return Err(err);
            }
        };

        // New threads go to the top of the page's list.
        let key = Self::url_key(url.as_deref());
        let mut list = self.cache.get(&key).unwrap_or_default();
        list.insert(0, created.clone());
        self.cache.mutate(&key, list);

        Ok(created)
    }

    /// Delete a thread and filter it out of the cached list for `link`.
    /// Rejected locally when the cached thread is not the caller's.
    pub async fn delete(&self, link: Option<&str>, thread_id: &str) -> Result<()> {
        let address = self
            .auth
            .current_address()
            .ok_or_else(|| ConvoError::Validation("wallet not connected".to_string()))?;

        let key = Self::url_key(normalize_page_url(link).as_deref());
        if let Some(list) = self.cache.get(&key) {
            if let Some(thread) = list.iter().find(|t| t.id == thread_id) {
                if !thread.is_creator(&address) {
                    return Err(ConvoError::Validation(
                        "only the creator can delete a thread".to_string(),
                    ));
                }
            }
        }

        let token = self.auth.get_token().await?;
        let req = Deletion {
            token,
            signer_address: address,
            id: thread_id.to_string(),
        };
        if let Err(err) = self.api.delete_thread(&req).await {
            if err.invalidates_session() {
                self.auth.invalidate();
            }
            return Err(err);
        }

        if let Some(list) = self.cache.get(&key) {
            let filtered: Vec<Thread> = list.into_iter().filter(|t| t.id != thread_id).collect();
            self.cache.mutate(&key, filtered);
        }
        Ok(())
    }

    async fn require_address(&self) -> Result<String> {
        if let Some(address) = self.auth.current_address() {
            return Ok(address);
        }
        match self.auth.connect().await? {
            Some(address) => Ok(address),
            None => Err(ConvoError::AuthDenied),
        }
    }
}
