use std::{
    any::Any,
    collections::{HashMap, HashSet},
    fmt,
    future::Future,
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use futures_util::{FutureExt, future::BoxFuture};
use tokio::sync::watch;

use crate::{
    GatewayError, GatewayResult,
    cache::{ResourceKind, Tag},
    config::CachePolicy,
};

type Erased = Arc<dyn Any + Send + Sync>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, GatewayResult<Fetched<Erased>>> + Send + Sync>;

/// Identifies one cached query: resource, operation and canonical parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    kind: ResourceKind,
    operation: &'static str,
    params: String,
}

impl QueryKey {
    pub fn new(kind: ResourceKind, operation: &'static str, params: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            params: params.into(),
        }
    }

    /// Pairs must already be in canonical order.
    pub fn with_query(kind: ResourceKind, operation: &'static str, query: &[(String, String)]) -> Self {
        let params = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        Self::new(kind, operation, params)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}/{}", self.kind, self.operation)
        } else {
            write!(f, "{}/{}?{}", self.kind, self.operation, self.params)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl QueryStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// A fetched value plus the tags it provides beyond the query's base tags
/// (typically one item tag per record in a list).
pub struct Fetched<T> {
    pub value: T,
    pub provides: Vec<Tag>,
}

impl<T> Fetched<T> {
    pub fn new(value: T, provides: Vec<Tag>) -> Self {
        Self { value, provides }
    }
}

#[derive(Clone, Default)]
struct Snapshot {
    status: QueryStatus,
    data: Option<Erased>,
    error: Option<Arc<GatewayError>>,
}

/// What a subscriber sees. Data from the previous successful fetch stays
/// available while a refetch is loading.
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<GatewayError>>,
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn into_result(self) -> GatewayResult<Arc<T>> {
        if self.status == QueryStatus::Error
            && let Some(error) = self.error
        {
            return Err(GatewayError::Shared(error));
        }
        self.data
            .ok_or_else(|| GatewayError::message("query has not produced data yet"))
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .finish()
    }
}

struct CacheEntry {
    /// Distinguishes this entry from one created for the same key after a
    /// reset or eviction.
    id: u64,
    base_tags: Vec<Tag>,
    provides: HashSet<Tag>,
    fetcher: Fetcher,
    snapshot: watch::Sender<Snapshot>,
    subscribers: usize,
    fetch_id: u64,
    unused_since: Option<Instant>,
}

impl CacheEntry {
    fn new(id: u64, base_tags: Vec<Tag>, fetcher: Fetcher) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            id,
            provides: base_tags.iter().cloned().collect(),
            base_tags,
            fetcher,
            snapshot,
            subscribers: 0,
            fetch_id: 0,
            unused_since: None,
        }
    }

    fn status(&self) -> QueryStatus {
        self.snapshot.borrow().status
    }

    fn publish(&self, status: QueryStatus, data: Option<Erased>, error: Option<Arc<GatewayError>>) {
        self.snapshot.send_replace(Snapshot {
            status,
            data,
            error,
        });
    }
}

struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    next_entry_id: u64,
    next_fetch_id: u64,
    policy: CachePolicy,
}

impl CacheInner {
    /// Marks the entry loading under a fresh fetch id; any older in-flight
    /// fetch for the same key is thereby superseded.
    fn begin_fetch(&mut self, key: &QueryKey) -> Option<(u64, Fetcher)> {
        self.next_fetch_id += 1;
        let fetch_id = self.next_fetch_id;
        let entry = self.entries.get_mut(key)?;

        entry.fetch_id = fetch_id;
        let previous = entry.snapshot.borrow().data.clone();
        entry.publish(QueryStatus::Loading, previous, None);
        Some((fetch_id, Arc::clone(&entry.fetcher)))
    }

    fn prune(&mut self, now: Instant) {
        let keep_for = self.policy.keep_unused_for;
        self.entries.retain(|key, entry| {
            let keep = entry.subscribers > 0
                || entry
                    .unused_since
                    .is_none_or(|since| now.duration_since(since) < keep_for);
            if !keep {
                log::trace!("evicting unused cache entry {key}");
            }
            keep
        });
    }
}

/// Tag-indexed response cache shared by every resource module.
///
/// Fetches run on spawned tasks, so every method that may start one must be
/// called from within a Tokio runtime.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl QueryCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                next_entry_id: 0,
                next_fetch_id: 0,
                policy,
            })),
        }
    }

    pub fn subscribe<T, F, Fut>(&self, key: QueryKey, base_tags: Vec<Tag>, fetch: F) -> Subscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<Fetched<T>>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let pending = fetch();
            async move {
                let fetched = pending.await?;
                let value: Erased = Arc::new(fetched.value);
                Ok(Fetched::new(value, fetched.provides))
            }
            .boxed()
        });

        let (entry_id, receiver, started) = {
            let mut inner = self.lock();
            inner.prune(Instant::now());

            let next_entry_id = inner.next_entry_id + 1;
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(next_entry_id, base_tags, fetcher));
            let entry_id = entry.id;
            entry.subscribers += 1;
            entry.unused_since = None;
            let receiver = entry.snapshot.subscribe();
            let status = entry.status();
            log::trace!("subscribed to {key} ({status:?}, {} subscribers)", entry.subscribers);

            if entry_id == next_entry_id {
                inner.next_entry_id = next_entry_id;
            }
            let started = if status == QueryStatus::Idle {
                inner.begin_fetch(&key)
            } else {
                None
            };
            (entry_id, receiver, started)
        };

        if let Some((fetch_id, fetcher)) = started {
            self.spawn_fetch(key.clone(), fetch_id, fetcher);
        }

        Subscription {
            cache: self.clone(),
            key,
            entry_id,
            receiver,
            _value: PhantomData,
        }
    }

    /// Runs a write and, only if it succeeds, invalidates `invalidates`.
    pub async fn mutate<T, Fut>(&self, invalidates: Vec<Tag>, mutation: Fut) -> GatewayResult<T>
    where
        Fut: Future<Output = GatewayResult<T>>,
    {
        let value = mutation.await?;
        self.invalidate(&invalidates);
        Ok(value)
    }

    /// Entries providing any of `tags` refetch if someone is subscribed and
    /// are dropped otherwise.
    pub fn invalidate(&self, tags: &[Tag]) {
        let started = {
            let mut inner = self.lock();
            inner.prune(Instant::now());

            let affected: Vec<QueryKey> = inner
                .entries
                .iter()
                .filter(|(_, entry)| tags.iter().any(|tag| entry.provides.contains(tag)))
                .map(|(key, _)| key.clone())
                .collect();

            let mut started = Vec::new();
            for key in affected {
                let active = inner
                    .entries
                    .get(&key)
                    .is_some_and(|entry| entry.subscribers > 0);
                if active {
                    if let Some(fetch) = inner.begin_fetch(&key) {
                        started.push((key, fetch));
                    }
                } else {
                    log::trace!("discarding unsubscribed cache entry {key}");
                    inner.entries.remove(&key);
                }
            }
            started
        };

        if !started.is_empty() || !tags.is_empty() {
            log::debug!(
                "invalidated [{}]: {} active queries refetching",
                tags.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                started.len()
            );
        }
        for (key, (fetch_id, fetcher)) in started {
            self.spawn_fetch(key, fetch_id, fetcher);
        }
    }

    /// Starts a fetch unless one is already in flight for `key`.
    pub fn refetch(&self, key: &QueryKey) {
        self.refetch_entry(key, None);
    }

    fn refetch_entry(&self, key: &QueryKey, entry_id: Option<u64>) {
        let started = {
            let mut inner = self.lock();
            let entry = inner
                .entries
                .get(key)
                .filter(|entry| entry_id.is_none_or(|id| entry.id == id));
            match entry.map(CacheEntry::status) {
                Some(QueryStatus::Loading) | None => None,
                Some(_) => inner.begin_fetch(key),
            }
        };
        if let Some((fetch_id, fetcher)) = started {
            self.spawn_fetch(key.clone(), fetch_id, fetcher);
        }
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        log::debug!("dropping {} cached queries", inner.entries.len());
        inner.entries.clear();
    }

    pub fn status(&self, key: &QueryKey) -> Option<QueryStatus> {
        self.lock().entries.get(key).map(CacheEntry::status)
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock()
            .entries
            .get(key)
            .map_or(0, |entry| entry.subscribers)
    }

    pub fn provided_tags(&self, key: &QueryKey) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.provides.iter().cloned().collect())
            .unwrap_or_default();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spawn_fetch(&self, key: QueryKey, fetch_id: u64, fetcher: Fetcher) {
        log::trace!("fetching {key} (fetch {fetch_id})");
        let cache = self.clone();
        tokio::spawn(async move {
            let outcome = fetcher().await;
            cache.complete(&key, fetch_id, outcome);
        });
    }

    fn complete(&self, key: &QueryKey, fetch_id: u64, outcome: GatewayResult<Fetched<Erased>>) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            log::trace!("dropping result for evicted {key}");
            return;
        };
        if entry.fetch_id != fetch_id {
            log::trace!("dropping superseded result for {key} (fetch {fetch_id})");
            return;
        }

        match outcome {
            Ok(fetched) => {
                entry.provides = entry.base_tags.iter().cloned().collect();
                entry.provides.extend(fetched.provides);
                entry.publish(QueryStatus::Success, Some(fetched.value), None);
            }
            Err(err) => {
                log::debug!("query {key} failed: {}", err.display_chain());
                let previous = entry.snapshot.borrow().data.clone();
                entry.publish(QueryStatus::Error, previous, Some(Arc::new(err)));
            }
        }
    }

    fn release(&self, key: &QueryKey, entry_id: u64) {
        let mut inner = self.lock();
        let keep_for = inner.policy.keep_unused_for;
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };
        if entry.id != entry_id {
            log::trace!("subscription to a discarded {key} entry released");
            return;
        }

        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers > 0 {
            return;
        }
        if keep_for.is_zero() {
            log::trace!("discarding {key} after last subscriber left");
            inner.entries.remove(key);
        } else {
            entry.unused_since = Some(Instant::now());
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

/// A live dependency on one cache entry. Dropping it unsubscribes; a fetch
/// already in flight still completes for the remaining subscribers.
pub struct Subscription<T> {
    cache: QueryCache,
    key: QueryKey,
    entry_id: u64,
    receiver: watch::Receiver<Snapshot>,
    _value: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        let snapshot = self.receiver.borrow().clone();
        self.typed(snapshot)
    }

    /// Waits for the next published state. Returns `None` once the entry
    /// has been discarded by a cache reset; no further updates will arrive.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.state())
    }

    /// Waits until the entry holds a result or an error.
    pub async fn settled(&mut self) -> QueryState<T> {
        let settled = self
            .receiver
            .wait_for(|snapshot| snapshot.status.is_settled())
            .await
            .map(|snapshot| Snapshot::clone(&snapshot));
        match settled {
            Ok(snapshot) => self.typed(snapshot),
            // entry dropped by a cache reset
            Err(_) => self.state(),
        }
    }

    pub async fn result(&mut self) -> GatewayResult<Arc<T>> {
        self.settled().await.into_result()
    }

    /// Does nothing once the entry has been discarded by a cache reset.
    pub fn refetch(&self) {
        self.cache.refetch_entry(&self.key, Some(self.entry_id));
    }

    fn typed(&self, snapshot: Snapshot) -> QueryState<T> {
        let data = match snapshot.data.map(|data| data.downcast::<T>()) {
            Some(Ok(data)) => Some(data),
            Some(Err(_)) => {
                log::error!("cached value for {} has an unexpected type", self.key);
                None
            }
            None => None,
        };
        QueryState {
            status: snapshot.status,
            data,
            error: snapshot.error,
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cache.release(&self.key, self.entry_id);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use tokio::sync::Notify;

    use super::{Fetched, QueryCache, QueryKey, QueryStatus};
    use crate::{
        GatewayError,
        cache::{ResourceKind, Tag},
        config::CachePolicy,
    };

    fn key(params: &str) -> QueryKey {
        QueryKey::new(ResourceKind::Patient, "list", params)
    }

    fn no_retention() -> QueryCache {
        QueryCache::new(CachePolicy {
            keep_unused_for: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn identical_keys_share_one_fetch() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let fetch = {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            move || {
                let calls = Arc::clone(&calls);
                let gate = Arc::clone(&gate);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Ok(Fetched::new(vec!["p-1".to_owned()], Vec::new()))
                }
            }
        };

        let mut first = cache.subscribe(key("page=1"), vec![Tag::list(ResourceKind::Patient)], fetch.clone());
        let mut second = cache.subscribe(key("page=1"), vec![Tag::list(ResourceKind::Patient)], fetch);
        assert!(first.state().is_loading());
        assert_eq!(cache.subscriber_count(first.key()), 2);

        tokio::task::yield_now().await;
        gate.notify_one();

        let a = first.result().await.expect("first resolves");
        let b = second.result().await.expect("second resolves");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_cached_until_refetched() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let calls = Arc::clone(&calls);
            move || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(GatewayError::Server {
                            status: 503,
                            body: Default::default(),
                        })
                    } else {
                        Ok(Fetched::new(7_u32, Vec::new()))
                    }
                }
            }
        };

        let mut subscription = cache.subscribe(key(""), Vec::new(), fetch.clone());
        let err = subscription.result().await.expect_err("first fetch fails");
        assert_eq!(err.status(), Some(503));

        let mut again = cache.subscribe(key(""), Vec::new(), fetch);
        assert_eq!(again.settled().await.status, QueryStatus::Error);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        again.refetch();
        assert_eq!(*again.result().await.expect("refetch succeeds"), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsubscribed_entries_are_discarded_on_invalidation() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Fetched::new((), Vec::new())) }
            }
        };

        let mut subscription = cache.subscribe(key(""), vec![Tag::list(ResourceKind::Patient)], fetch);
        subscription.result().await.expect("loads");
        drop(subscription);
        assert_eq!(cache.len(), 1, "retained for reuse");

        cache.invalidate(&[Tag::list(ResourceKind::Patient)]);
        assert!(cache.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_retention_drops_entries_with_their_last_subscriber() {
        let cache = no_retention();
        let subscription = cache.subscribe(key(""), Vec::new(), || async {
            Ok(Fetched::new(1_u8, Vec::new()))
        });
        assert_eq!(cache.len(), 1);
        drop(subscription);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn results_extend_provided_tags() {
        let cache = QueryCache::default();
        let mut subscription = cache.subscribe(
            key(""),
            vec![Tag::list(ResourceKind::Patient)],
            || async {
                Ok(Fetched::new(
                    (),
                    vec![Tag::item(ResourceKind::Patient, "p-9")],
                ))
            },
        );
        subscription.result().await.expect("loads");

        assert_eq!(
            cache.provided_tags(subscription.key()),
            vec![
                Tag::list(ResourceKind::Patient),
                Tag::item(ResourceKind::Patient, "p-9"),
            ]
        );
    }

    #[tokio::test]
    async fn late_results_from_superseded_fetches_are_dropped() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let first_gate = Arc::new(Notify::new());

        let fetch = {
            let calls = Arc::clone(&calls);
            let first_gate = Arc::clone(&first_gate);
            move || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                let first_gate = Arc::clone(&first_gate);
                async move {
                    if attempt == 0 {
                        first_gate.notified().await;
                        Ok(Fetched::new("stale", Vec::new()))
                    } else {
                        Ok(Fetched::new("fresh", Vec::new()))
                    }
                }
            }
        };

        let tag = Tag::list(ResourceKind::Patient);
        let mut subscription = cache.subscribe(key(""), vec![tag.clone()], fetch);
        tokio::task::yield_now().await;
        cache.invalidate(&[tag]);

        assert_eq!(*subscription.result().await.expect("second fetch wins"), "fresh");

        first_gate.notify_one();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let state = subscription.state();
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.data.as_deref(), Some(&"fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscriptions_from_before_a_reset_release_only_their_own_entry() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Fetched::new((), Vec::new())) }
            }
        };
        let tag = Tag::list(ResourceKind::Patient);

        let mut old = cache.subscribe(key(""), vec![tag.clone()], fetch.clone());
        old.result().await.expect("loads");
        cache.reset();

        let mut fresh = cache.subscribe(key(""), vec![tag.clone()], fetch);
        fresh.result().await.expect("loads again");
        old.refetch();
        drop(old);
        assert_eq!(cache.subscriber_count(fresh.key()), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.invalidate(&[tag]);
        assert_eq!(cache.status(fresh.key()), Some(QueryStatus::Loading));
        fresh.result().await.expect("refetched for the live subscriber");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn changed_reports_a_discarded_entry() {
        let cache = QueryCache::default();
        let mut subscription = cache.subscribe(key(""), Vec::new(), || async {
            Ok(Fetched::new(1_u8, Vec::new()))
        });
        subscription.result().await.expect("loads");

        cache.reset();
        assert!(subscription.changed().await.is_none());
        assert!(subscription.changed().await.is_none());
    }

    #[tokio::test]
    async fn dropping_one_subscriber_keeps_the_fetch_for_the_rest() {
        let cache = no_retention();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let fetch = {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok(Fetched::new(5_u32, Vec::new()))
                }
            }
        };

        let leaving = cache.subscribe(key(""), Vec::new(), fetch.clone());
        let mut staying = cache.subscribe(key(""), Vec::new(), fetch);
        tokio::task::yield_now().await;
        drop(leaving);
        assert_eq!(cache.subscriber_count(staying.key()), 1);

        gate.notify_one();
        assert_eq!(*staying.result().await.expect("fetch completes"), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(staying.key()), Some(QueryStatus::Success));
    }

    #[tokio::test]
    async fn reset_wakes_waiting_subscribers() {
        let cache = QueryCache::default();
        let gate = Arc::new(Notify::new());
        let mut subscription = {
            let gate = Arc::clone(&gate);
            cache.subscribe(key(""), Vec::new(), move || {
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok(Fetched::new(1_u8, Vec::new()))
                }
            })
        };

        cache.reset();
        let state = subscription.settled().await;
        assert_eq!(state.status, QueryStatus::Loading);
        assert!(cache.is_empty());
    }
}
