//! The keyed cache itself: entries, subscriptions, invalidation, and the
//! per-tick pump that applies settled fetches.

use super::key::QueryKey;
use super::state::{FetchResult, QuerySnapshot, QueryStatus, QueryValue};
use crate::api::ApiError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

/// How long an entry with no subscribers keeps serving its cached value
/// before the sweep evicts it.
const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60);

/// A boxed future resolving to a fetched value.
type BoxFuture = Pin<Box<dyn Future<Output = FetchResult> + Send>>;

/// Factory producing fetch futures. Stored per entry and reused whenever
/// the entry is refetched.
type FetcherFn = Box<dyn Fn() -> BoxFuture>;

/// Identifies one subscription for the lifetime of the cache.
pub type SubscriberId = u64;

/// Emitted by [`QueryClient::pump`] for every subscriber whose entry just
/// changed, in subscriber registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNotification {
  pub key: QueryKey,
  pub subscriber: SubscriberId,
}

/// A finished fetch travelling back to the cache over the channel.
struct Settlement {
  key: QueryKey,
  generation: u64,
  result: FetchResult,
}

struct Entry {
  status: QueryStatus,
  value: Option<Arc<QueryValue>>,
  error: Option<ApiError>,
  fetcher: FetcherFn,
  /// Generation of the fetch whose result is still authoritative, if one
  /// is in flight. Settlements carrying any other generation are dropped.
  active_fetch: Option<u64>,
  /// Registration order, which is also notification order.
  subscribers: Vec<SubscriberId>,
  /// Set when the last subscriber leaves; starts the retention clock.
  released_at: Option<Instant>,
}

impl Entry {
  fn new(fetcher: FetcherFn) -> Self {
    Entry {
      status: QueryStatus::Idle,
      value: None,
      error: None,
      fetcher,
      active_fetch: None,
      subscribers: Vec::new(),
      released_at: None,
    }
  }

  fn snapshot(&self) -> QuerySnapshot {
    QuerySnapshot {
      status: self.status,
      value: self.value.clone(),
      error: self.error.clone(),
      subscribers: self.subscribers.len(),
    }
  }
}

struct CacheInner {
  entries: HashMap<QueryKey, Entry>,
  settlements_tx: mpsc::UnboundedSender<Settlement>,
  settlements_rx: mpsc::UnboundedReceiver<Settlement>,
  retention: Duration,
  next_subscriber: SubscriberId,
  next_generation: u64,
}

impl CacheInner {
  /// Start (or restart) the fetch for `key` using the entry's stored
  /// fetcher. The future runs on a tokio worker; its result comes back
  /// through the settlement channel and is applied by `pump`.
  fn start_fetch(&mut self, key: &QueryKey) {
    let generation = self.next_generation;
    self.next_generation += 1;
    let tx = self.settlements_tx.clone();

    let Some(entry) = self.entries.get_mut(key) else {
      return;
    };
    entry.status = QueryStatus::Loading;
    entry.active_fetch = Some(generation);

    let future = (entry.fetcher)();
    let key = key.clone();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the cache may have been dropped
      let _ = tx.send(Settlement {
        key,
        generation,
        result,
      });
    });
  }

  fn apply(&mut self, settlement: Settlement, notifications: &mut Vec<QueryNotification>) {
    let Settlement {
      key,
      generation,
      result,
    } = settlement;

    let Some(entry) = self.entries.get_mut(&key) else {
      debug!(?key, "discarding settlement for evicted entry");
      return;
    };
    if entry.active_fetch != Some(generation) {
      debug!(?key, "discarding settlement from superseded fetch");
      return;
    }
    entry.active_fetch = None;

    match result {
      Ok(value) => {
        entry.status = QueryStatus::Success;
        entry.value = Some(Arc::new(value));
        entry.error = None;
      }
      Err(error) => {
        debug!(?key, %error, "fetch failed");
        entry.status = QueryStatus::Error;
        // The last good value stays on hand for display
        entry.error = Some(error);
      }
    }

    for subscriber in &entry.subscribers {
      notifications.push(QueryNotification {
        key: key.clone(),
        subscriber: *subscriber,
      });
    }
  }

  fn sweep_expired(&mut self) {
    let retention = self.retention;
    self.entries.retain(|key, entry| {
      let expired = entry.subscribers.is_empty()
        && entry
          .released_at
          .map(|released| released.elapsed() >= retention)
          .unwrap_or(false);
      if expired {
        debug!(?key, "evicting entry past retention");
      }
      !expired
    });
  }
}

/// Keyed query cache shared by the app and its views.
///
/// Works like the single `Query<T>` fetcher it grew out of, but entries
/// are shared: subscribers with an equal [`QueryKey`] get one entry and
/// one fetch between them. Clones share the store. The handle lives on
/// the event-loop thread; only fetch futures run elsewhere.
///
/// ```ignore
/// let queries = QueryClient::new();
/// let api = api.clone();
/// let sub = queries.subscribe(QueryKey::Report, move || {
///   let api = api.clone();
///   async move { api.fetch_report().await.map(QueryValue::Report) }
/// });
///
/// // In the event loop tick:
/// for changed in queries.pump() { /* re-render */ }
///
/// // In render:
/// if let Some(report) = sub.snapshot().report() { /* draw it */ }
/// ```
#[derive(Clone)]
pub struct QueryClient {
  inner: Rc<RefCell<CacheInner>>,
}

impl QueryClient {
  pub fn new() -> Self {
    Self::with_retention(DEFAULT_RETENTION)
  }

  /// Cache with a custom retention window for released entries.
  pub fn with_retention(retention: Duration) -> Self {
    let (settlements_tx, settlements_rx) = mpsc::unbounded_channel();
    QueryClient {
      inner: Rc::new(RefCell::new(CacheInner {
        entries: HashMap::new(),
        settlements_tx,
        settlements_rx,
        retention,
        next_subscriber: 0,
        next_generation: 0,
      })),
    }
  }

  /// Register interest in `key`.
  ///
  /// The first subscription of an entry's lifetime stores `fetcher` and
  /// starts the fetch; later subscriptions share whatever state is there
  /// (including an in-flight fetch) and their fetcher is dropped unused.
  /// Resubscribing to a released-but-retained entry revives it without a
  /// refetch.
  pub fn subscribe<F, Fut>(&self, key: QueryKey, fetcher: F) -> QuerySubscription
  where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = FetchResult> + Send + 'static,
  {
    let mut inner = self.inner.borrow_mut();
    let id = inner.next_subscriber;
    inner.next_subscriber += 1;

    let entry = inner
      .entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(Box::new(move || Box::pin(fetcher()))));
    entry.subscribers.push(id);
    entry.released_at = None;
    let needs_fetch = entry.status == QueryStatus::Idle && entry.active_fetch.is_none();

    if needs_fetch {
      inner.start_fetch(&key);
    }
    debug!(?key, subscriber = id, "subscribed");

    QuerySubscription {
      key,
      id,
      inner: Rc::downgrade(&self.inner),
    }
  }

  /// Mark every entry whose key matches `predicate` as stale. Entries
  /// with active subscribers refetch immediately; entries without any are
  /// evicted. Entries already fetching are left alone, their in-flight
  /// result stays authoritative.
  pub fn invalidate<P>(&self, predicate: P)
  where
    P: Fn(&QueryKey) -> bool,
  {
    let mut inner = self.inner.borrow_mut();

    let mut evict: Vec<QueryKey> = Vec::new();
    let mut refetch: Vec<QueryKey> = Vec::new();
    for (key, entry) in &inner.entries {
      if !predicate(key) {
        continue;
      }
      if entry.subscribers.is_empty() {
        evict.push(key.clone());
      } else if entry.status != QueryStatus::Loading {
        refetch.push(key.clone());
      }
    }

    for key in evict {
      debug!(?key, "invalidated entry has no subscribers, evicting");
      inner.entries.remove(&key);
    }
    for key in refetch {
      debug!(?key, "invalidated entry refetching");
      inner.start_fetch(&key);
    }
  }

  pub fn invalidate_key(&self, key: &QueryKey) {
    self.invalidate(|k| k == key);
  }

  pub fn invalidate_all(&self) {
    self.invalidate(|_| true);
  }

  /// Synchronous read without registering a subscription. `None` means no
  /// entry exists for the key.
  pub fn snapshot(&self, key: &QueryKey) -> Option<QuerySnapshot> {
    self.inner.borrow().entries.get(key).map(Entry::snapshot)
  }

  /// Apply every settled fetch, evict entries past their retention, and
  /// report which subscribers saw their entry change. Call once per
  /// event-loop tick.
  pub fn pump(&self) -> Vec<QueryNotification> {
    let mut inner = self.inner.borrow_mut();
    let mut notifications = Vec::new();

    while let Ok(settlement) = inner.settlements_rx.try_recv() {
      inner.apply(settlement, &mut notifications);
    }
    inner.sweep_expired();

    notifications
  }
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

/// RAII registration on a cache entry. Dropping it unsubscribes; when the
/// last subscriber leaves, the entry stays served for the retention
/// window before the sweep removes it.
pub struct QuerySubscription {
  key: QueryKey,
  id: SubscriberId,
  inner: Weak<RefCell<CacheInner>>,
}

impl QuerySubscription {
  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn id(&self) -> SubscriberId {
    self.id
  }

  /// Current state of the subscribed entry.
  pub fn snapshot(&self) -> QuerySnapshot {
    let Some(inner) = self.inner.upgrade() else {
      return QuerySnapshot::idle();
    };
    let inner = inner.borrow();
    inner
      .entries
      .get(&self.key)
      .map(Entry::snapshot)
      .unwrap_or_else(QuerySnapshot::idle)
  }
}

impl Drop for QuerySubscription {
  fn drop(&mut self) {
    let Some(inner) = self.inner.upgrade() else {
      return;
    };
    let mut inner = inner.borrow_mut();
    let Some(entry) = inner.entries.get_mut(&self.key) else {
      return;
    };
    entry.subscribers.retain(|s| *s != self.id);
    if entry.subscribers.is_empty() {
      entry.released_at = Some(Instant::now());
      debug!(key = ?self.key, "entry released");
    }
  }
}
