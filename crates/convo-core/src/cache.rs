//! Generic fetch/cache/revalidate layer.
//!
//! Each cache entry is keyed by a normalized [`QueryKey`] and owned
//! exclusively by the cache; domain stores mutate entries only through
//! [`QueryCache::read`] / [`QueryCache::mutate`], never directly.
//!
//! Discipline is stale-while-revalidate: a warm read returns cached data
//! immediately and revalidates in the background; a cold read awaits the
//! first fetch. Optimistic mutations overwrite an entry synchronously and
//! bump its generation, so a fetch that started before the mutation can
//! never clobber the optimistic value — only a revalidation triggered at or
//! after the mutation is authoritative.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::error::{ConvoError, Result};

/// Normalized query descriptor. Params are sorted at construction so two
/// structurally equal descriptors always hash to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    path: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(
        path: impl Into<String>,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut params: Vec<(String, String)> = params.into_iter().collect();
        params.sort();
        Self {
            path: path.into(),
            params,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// What a reader observes for one key at one moment.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub data: Option<T>,
    pub error: Option<ConvoError>,
    pub is_validating: bool,
}

impl<T> Snapshot<T> {
    /// The no-key snapshot: nothing fetched, nothing pending.
    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
            is_validating: false,
        }
    }
}

struct Entry<T> {
    data: Option<T>,
    error: Option<ConvoError>,
    /// Bumped by `mutate` and `invalidate`; an in-flight fetch that captured
    /// an older generation is discarded on arrival.
    generation: u64,
    validating: bool,
    last_validated_at: Option<Instant>,
    /// Serializes fetches for this key: one in-flight fetch, queued readers
    /// re-check the entry once the fetcher releases it.
    gate: Arc<AsyncMutex<()>>,
}

impl<T> Entry<T> {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            generation: 0,
            validating: false,
            last_validated_at: None,
            gate: Arc::new(AsyncMutex::new(())),
        }
    }

    fn snapshot(&self) -> Snapshot<T>
    where
        T: Clone,
    {
        Snapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            is_validating: self.validating,
        }
    }
}

type Map<T> = HashMap<QueryKey, Entry<T>>;

/// Reads landing within this window of a completed validation do not trigger
/// another background revalidation; concurrent mounts of one key collapse
/// into a single fetch.
const DEDUPE_WINDOW: Duration = Duration::from_secs(2);

pub struct QueryCache<T> {
    inner: Arc<Mutex<Map<T>>>,
    dedupe_window: Duration,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            dedupe_window: self.dedupe_window,
        }
    }
}

impl<T> Default for QueryCache<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryCache<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            dedupe_window: DEDUPE_WINDOW,
        }
    }

    /// Override the revalidation dedupe window (tests use zero to observe
    /// every revalidation).
    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }

    /// Read `key`, fetching or revalidating as the entry's state demands.
    ///
    /// A `None` key skips fetching entirely (used when preconditions such as
    /// an authenticated address are not met). A warm key returns stale data
    /// immediately and revalidates in the background; a cold key awaits the
    /// first fetch. Concurrent reads of one key share a single in-flight
    /// fetch.
    pub async fn read<F>(&self, key: Option<&QueryKey>, fetch: F) -> Snapshot<T>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        let Some(key) = key else {
            return Snapshot::empty();
        };

        let (gate, warm, fresh) = {
            let mut map = self.inner.lock();
            let entry = map.entry(key.clone()).or_insert_with(Entry::new);
            let fresh = entry
                .last_validated_at
                .is_some_and(|at| at.elapsed() < self.dedupe_window);
            (entry.gate.clone(), entry.data.is_some(), fresh)
        };

        if warm {
            let snapshot = self.snapshot_of(key);
            if !fresh {
                self.spawn_revalidation(key.clone(), gate, fetch);
            }
            return snapshot;
        }

        // Cold: queue on the gate; whoever gets it first fetches, the rest
        // find the entry populated when their turn comes.
        let guard = gate.lock().await;
        if let Some(snapshot) = self.warm_snapshot(key) {
            return snapshot;
        }
        let generation = begin_fetch(&self.inner, key);
        let result = fetch().await;
        apply_result(&self.inner, key, generation, result);
        drop(guard);
        self.snapshot_of(key)
    }

    /// Optimistically overwrite the entry for `key`.
    ///
    /// Synchronous, no round trip. Bumps the generation: a fetch already in
    /// flight when this is called is discarded on arrival, so the optimistic
    /// value stands until the next revalidation trigger.
    pub fn mutate(&self, key: &QueryKey, data: T) {
        let mut map = self.inner.lock();
        let entry = map.entry(key.clone()).or_insert_with(Entry::new);
        entry.data = Some(data);
        entry.error = None;
        entry.generation += 1;
        // Optimistic data is unvalidated: the next read may revalidate.
        entry.last_validated_at = None;
        debug!(key = %key.path, generation = entry.generation, "optimistic mutate");
    }

    /// [`Self::mutate`], then schedule a background re-fetch to reconcile
    /// with the source of truth.
    pub fn mutate_revalidate<F>(&self, key: &QueryKey, data: T, fetch: F)
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        self.mutate(key, data);
        let gate = {
            let mut map = self.inner.lock();
            let entry = map.entry(key.clone()).or_insert_with(Entry::new);
            entry.gate.clone()
        };
        self.spawn_revalidation(key.clone(), gate, fetch);
    }

    /// Explicit caller-initiated revalidation; awaits the fetch.
    pub async fn reload<F>(&self, key: &QueryKey, fetch: F) -> Snapshot<T>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        let gate = {
            let mut map = self.inner.lock();
            let entry = map.entry(key.clone()).or_insert_with(Entry::new);
            entry.gate.clone()
        };
        let guard = gate.lock().await;
        let generation = begin_fetch(&self.inner, key);
        let result = fetch().await;
        apply_result(&self.inner, key, generation, result);
        drop(guard);
        self.snapshot_of(key)
    }

    /// Drop the entry's data and cancel application of any in-flight fetch
    /// result for it (navigating away from a key, key identity change).
    pub fn invalidate(&self, key: &QueryKey) {
        let mut map = self.inner.lock();
        if let Some(entry) = map.get_mut(key) {
            entry.data = None;
            entry.error = None;
            entry.generation += 1;
            entry.last_validated_at = None;
        }
    }

    /// Current cached value, if any. Stores use this to build optimistic
    /// updates on top of the latest list.
    pub fn get(&self, key: &QueryKey) -> Option<T> {
        self.inner.lock().get(key).and_then(|e| e.data.clone())
    }

    fn snapshot_of(&self, key: &QueryKey) -> Snapshot<T> {
        self.inner
            .lock()
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_else(Snapshot::empty)
    }

    fn warm_snapshot(&self, key: &QueryKey) -> Option<Snapshot<T>> {
        let map = self.inner.lock();
        let entry = map.get(key)?;
        entry.data.is_some().then(|| entry.snapshot())
    }

    fn spawn_revalidation<F>(&self, key: QueryKey, gate: Arc<AsyncMutex<()>>, fetch: F)
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            // A fetch for this key is already running; it will reconcile.
            let Ok(_guard) = gate.try_lock() else {
                return;
            };
            let generation = begin_fetch(&inner, &key);
            let result = fetch().await;
            apply_result(&inner, &key, generation, result);
        });
    }
}

fn begin_fetch<T>(inner: &Mutex<Map<T>>, key: &QueryKey) -> u64 {
    let mut map = inner.lock();
    let entry = map.entry(key.clone()).or_insert_with(Entry::new);
    entry.validating = true;
    entry.generation
}

/// Record a finished fetch. Discards the result when the entry's generation
/// moved while the fetch was in flight (optimistic mutate or invalidation).
fn apply_result<T>(inner: &Mutex<Map<T>>, key: &QueryKey, generation: u64, result: Result<T>) {
    let mut map = inner.lock();
    let Some(entry) = map.get_mut(key) else {
        return;
    };
    entry.validating = false;
    if entry.generation != generation {
        debug!(key = %key.path, "stale fetch result discarded");
        return;
    }
    match result {
        Ok(data) => {
            entry.data = Some(data);
            entry.error = None;
            entry.last_validated_at = Some(Instant::now());
        }
        Err(err) => {
            // Keep last-known-good data; the next natural trigger retries.
            entry.error = Some(err);
        }
    }
}
