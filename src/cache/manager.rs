//! The query cache: staleness, request coalescing, subscriber delivery.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{ApiError, ErrorKind};
use crate::resource::RequestKey;

use super::entry::{Entry, EntryState, Freshness, InFlight, QuerySnapshot};

type EntryMap = Mutex<HashMap<RequestKey, Entry>>;

/// In-memory query cache shared by every cached client.
///
/// Explicitly constructed and cheaply cloneable (clones share one entry
/// map); [`teardown`](QueryCache::teardown) ends its lifecycle. Entries are
/// never evicted by size or age — the cached material is small reference
/// data — only invalidated or cleared wholesale.
#[derive(Clone, Default)]
pub struct QueryCache {
  entries: Arc<EntryMap>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<RequestKey, Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Resolve one request through the cache.
  ///
  /// Fresh entry: answers immediately from cache and the fetcher is never
  /// invoked. Stale or absent entry: answers with last-known data (if any)
  /// and `is_loading = true`, triggering exactly one fetch for the key —
  /// callers arriving while that fetch is in flight attach to it instead of
  /// starting another. The returned handle is a live subscription either
  /// way.
  ///
  /// Must be called within a tokio runtime; the fetch runs as a spawned
  /// task so it completes even if every handle is dropped.
  pub fn resolve<T, F, Fut>(&self, key: RequestKey, stale_time: Duration, fetcher: F) -> QueryHandle<T>
  where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
  {
    let mut entries = self.lock();
    let entry = entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(key.clone(), stale_time));
    entry.stale_time = stale_time;

    let rx = entry.tx.subscribe();

    match entry.freshness(Instant::now()) {
      Freshness::Fresh => {
        debug!(key = %entry.key, "cache hit");
        QueryHandle::new(rx, None)
      }
      _ if entry.in_flight.is_some() => {
        debug!(key = %entry.key, "attached to fetch in flight");
        if let Some(in_flight) = entry.in_flight.as_mut() {
          in_flight.waiters += 1;
        }
        QueryHandle::new(rx, Some(self.waiter(key)))
      }
      freshness => {
        debug!(key = %entry.key, ?freshness, "fetching");
        entry.in_flight = Some(InFlight { waiters: 1 });
        entry.publish();

        let map = Arc::downgrade(&self.entries);
        let task_key = key.clone();
        let future = fetcher();
        tokio::spawn(async move {
          let result = future.await;
          apply_completion(map, task_key, result);
        });

        QueryHandle::new(rx, Some(self.waiter(key)))
      }
    }
  }

  fn waiter(&self, key: RequestKey) -> WaiterGuard {
    WaiterGuard {
      entries: Arc::downgrade(&self.entries),
      key,
    }
  }

  /// Read-only view of an entry, if one exists.
  pub fn peek(&self, key: &RequestKey) -> Option<EntryState> {
    self.lock().get(key).map(Entry::state)
  }

  /// Mark one entry stale. Non-blocking; the next access refetches.
  pub fn invalidate(&self, key: &RequestKey) {
    if let Some(entry) = self.lock().get_mut(key) {
      entry.invalidated = true;
    }
  }

  /// Mark every entry of a resource family stale.
  pub fn invalidate_resource(&self, resource: &str) {
    self.invalidate_where(|key| key.resource() == resource);
  }

  /// Mark every entry matching the predicate stale.
  pub fn invalidate_where(&self, pred: impl Fn(&RequestKey) -> bool) {
    let mut entries = self.lock();
    for entry in entries.values_mut() {
      if pred(&entry.key) {
        entry.invalidated = true;
      }
    }
  }

  /// Number of live entries.
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// Drop every entry and close their subscriber channels.
  ///
  /// Fetches still in flight complete against the emptied map and their
  /// results are dropped.
  pub fn teardown(&self) {
    self.lock().clear();
  }
}

/// Apply a fetch completion to the shared map.
///
/// Completions apply in arrival order (last writer wins on the key). A
/// completion that lands after `teardown` removed the entry — or after the
/// cache itself was dropped — has nowhere to go and is discarded.
fn apply_completion(entries: Weak<EntryMap>, key: RequestKey, result: Result<Value, ApiError>) {
  let Some(entries) = entries.upgrade() else {
    return;
  };
  let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
  let Some(entry) = entries.get_mut(&key) else {
    return;
  };

  if let Err(err) = &result {
    warn!(key = %key, error = %err, "fetch failed");
  }
  entry.complete(result);
}

/// Decrements the waiter count of an in-flight fetch when a consumer
/// detaches. The fetch itself is never cancelled; delivery to remaining
/// subscribers is unaffected.
struct WaiterGuard {
  entries: Weak<EntryMap>,
  key: RequestKey,
}

impl Drop for WaiterGuard {
  fn drop(&mut self) {
    let Some(entries) = self.entries.upgrade() else {
      return;
    };
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(in_flight) = entries.get_mut(&self.key).and_then(|e| e.in_flight.as_mut()) {
      in_flight.waiters = in_flight.waiters.saturating_sub(1);
    }
  }
}

/// Live subscription to one cache entry.
///
/// Dropping the handle detaches this consumer only; an underlying fetch
/// still completes and updates the cache for future subscribers.
pub struct QueryHandle<T> {
  rx: watch::Receiver<EntryState>,
  _waiter: Option<WaiterGuard>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> QueryHandle<T> {
  fn new(rx: watch::Receiver<EntryState>, waiter: Option<WaiterGuard>) -> Self {
    Self {
      rx,
      _waiter: waiter,
      _marker: PhantomData,
    }
  }

  /// Current state, decoded to the requested type.
  pub fn snapshot(&self) -> QuerySnapshot<T> {
    project(&self.rx.borrow())
  }

  /// Wait for the next state change. Returns `false` once the entry is gone
  /// (cache teardown).
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Wait until no fetch is in flight, then yield the data or the recorded
  /// error. Stale data alongside an error is still reachable through
  /// [`snapshot`](QueryHandle::snapshot).
  pub async fn settled(mut self) -> Result<T, ApiError> {
    loop {
      let state = self.rx.borrow_and_update().clone();
      if !state.is_loading {
        if let Some(err) = state.error {
          return Err(err);
        }
        return match &state.data {
          Some(value) => decode(value),
          None => Err(ApiError::new(ErrorKind::Unknown, "query completed with no data")),
        };
      }

      if self.rx.changed().await.is_err() {
        return Err(ApiError::new(ErrorKind::Unknown, "query cache was torn down"));
      }
    }
  }
}

fn project<T: DeserializeOwned>(state: &EntryState) -> QuerySnapshot<T> {
  let (data, decode_error) = match &state.data {
    Some(value) => match decode(value) {
      Ok(decoded) => (Some(decoded), None),
      Err(err) => (None, Some(err)),
    },
    None => (None, None),
  };

  QuerySnapshot {
    data,
    is_loading: state.is_loading,
    error: state.error.clone().or(decode_error),
    fetched_at: state.fetched_at,
  }
}

fn decode<T: DeserializeOwned>(value: &Arc<Value>) -> Result<T, ApiError> {
  serde_json::from_value((**value).clone()).map_err(|e| {
    ApiError::new(ErrorKind::Parse, "cached value did not match the requested type").with_cause(e)
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn key(name: &str) -> RequestKey {
    use crate::resource::{Method, ResourceDescriptor};
    let descriptor = ResourceDescriptor {
      id: match name {
        "skills" => "skill.list",
        _ => "test.resource",
      },
      method: Method::Get,
      path: "/test",
      params: &[],
      fallback_message: "Failed to load test data.",
    };
    let mut params = crate::resource::Params::new();
    params.insert("q".to_string(), name.to_string());
    descriptor.key(&params)
  }

  fn counting_fetcher(
    counter: &Arc<AtomicU32>,
    value: Value,
    delay: Duration,
  ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<Value, ApiError>> + Send>> {
    let counter = Arc::clone(counter);
    move || {
      Box::pin(async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        Ok(value)
      })
    }
  }

  #[tokio::test]
  async fn resolve_fetches_and_settles() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    let handle: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      Duration::from_secs(60),
      counting_fetcher(&counter, json!([1, 2, 3]), Duration::ZERO),
    );
    assert!(handle.snapshot().is_loading);

    let data = handle.settled().await.unwrap();
    assert_eq!(data, vec![1, 2, 3]);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn fresh_hit_never_invokes_the_fetcher() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let stale = Duration::from_secs(60);

    let first: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      stale,
      counting_fetcher(&counter, json!([1]), Duration::ZERO),
    );
    first.settled().await.unwrap();

    let second: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      stale,
      counting_fetcher(&counter, json!([9, 9]), Duration::ZERO),
    );
    let snapshot = second.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.data, Some(vec![1]));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn concurrent_resolves_coalesce_into_one_fetch() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let stale = Duration::from_secs(60);

    let slow = Duration::from_millis(50);
    let a: QueryHandle<u32> = cache.resolve(key("a"), stale, counting_fetcher(&counter, json!(7), slow));
    let b: QueryHandle<u32> = cache.resolve(key("a"), stale, counting_fetcher(&counter, json!(8), slow));
    let c: QueryHandle<u32> = cache.resolve(key("a"), stale, counting_fetcher(&counter, json!(9), slow));

    let (ra, rb, rc) = tokio::join!(a.settled(), b.settled(), c.settled());
    assert_eq!(ra.unwrap(), 7);
    assert_eq!(rb.unwrap(), 7);
    assert_eq!(rc.unwrap(), 7);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn stale_entry_serves_old_data_while_refetching() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    let first: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      Duration::ZERO,
      counting_fetcher(&counter, json!([1, 2]), Duration::ZERO),
    );
    first.settled().await.unwrap();

    // Zero stale time: the entry is stale immediately.
    let second: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      Duration::ZERO,
      counting_fetcher(&counter, json!([1, 2, 3]), Duration::from_millis(20)),
    );
    let snapshot = second.snapshot();
    assert!(snapshot.is_loading);
    assert_eq!(snapshot.data, Some(vec![1, 2]));

    assert_eq!(second.settled().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn failure_preserves_prior_data_and_records_the_error() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let stale = Duration::from_secs(60);

    let first: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      stale,
      counting_fetcher(&counter, json!([1]), Duration::ZERO),
    );
    first.settled().await.unwrap();

    cache.invalidate(&key("a"));

    let second: QueryHandle<Vec<u32>> = cache.resolve(key("a"), stale, || async {
      Err(ApiError::new(ErrorKind::Http(500), "server fell over"))
    });
    let err = second.settled().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Http(500));

    let state = cache.peek(&key("a")).unwrap();
    assert!(state.data.is_some(), "prior data survives a failed refetch");
    assert!(state.error.is_some());

    // The errored entry refetches on the next access and recovers.
    let third: QueryHandle<Vec<u32>> = cache.resolve(
      key("a"),
      stale,
      counting_fetcher(&counter, json!([2, 2]), Duration::ZERO),
    );
    assert_eq!(third.settled().await.unwrap(), vec![2, 2]);
    assert!(cache.peek(&key("a")).unwrap().error.is_none());
  }

  #[tokio::test]
  async fn invalidate_marks_stale_without_blocking() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let stale = Duration::from_secs(60);

    let first: QueryHandle<u32> =
      cache.resolve(key("a"), stale, counting_fetcher(&counter, json!(1), Duration::ZERO));
    first.settled().await.unwrap();

    cache.invalidate(&key("a"));
    assert_eq!(counter.load(Ordering::SeqCst), 1, "invalidation itself does not fetch");

    let second: QueryHandle<u32> =
      cache.resolve(key("a"), stale, counting_fetcher(&counter, json!(2), Duration::ZERO));
    assert_eq!(second.settled().await.unwrap(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn invalidate_resource_hits_the_whole_family() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let stale = Duration::from_secs(60);

    let skills: QueryHandle<u32> = cache.resolve(
      key("skills"),
      stale,
      counting_fetcher(&counter, json!(1), Duration::ZERO),
    );
    skills.settled().await.unwrap();
    let other: QueryHandle<u32> =
      cache.resolve(key("b"), stale, counting_fetcher(&counter, json!(2), Duration::ZERO));
    other.settled().await.unwrap();

    cache.invalidate_resource("skill.list");

    let refetched: QueryHandle<u32> = cache.resolve(
      key("skills"),
      stale,
      counting_fetcher(&counter, json!(3), Duration::ZERO),
    );
    assert_eq!(refetched.settled().await.unwrap(), 3);

    let untouched: QueryHandle<u32> =
      cache.resolve(key("b"), stale, counting_fetcher(&counter, json!(4), Duration::ZERO));
    assert_eq!(untouched.settled().await.unwrap(), 2, "other family stays cached");
    assert_eq!(counter.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn detached_consumer_does_not_cancel_the_fetch() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let stale = Duration::from_secs(60);

    let handle: QueryHandle<u32> = cache.resolve(
      key("a"),
      stale,
      counting_fetcher(&counter, json!(42), Duration::from_millis(20)),
    );
    drop(handle);

    tokio::time::sleep(Duration::from_millis(60)).await;

    // The fetch completed and populated the cache for the next subscriber.
    let next: QueryHandle<u32> =
      cache.resolve(key("a"), stale, counting_fetcher(&counter, json!(0), Duration::ZERO));
    assert_eq!(next.settled().await.unwrap(), 42);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn teardown_clears_entries_and_drops_late_completions() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    let handle: QueryHandle<u32> = cache.resolve(
      key("a"),
      Duration::from_secs(60),
      counting_fetcher(&counter, json!(1), Duration::from_millis(30)),
    );

    cache.teardown();
    assert!(cache.is_empty());

    // The in-flight completion lands after teardown and is discarded.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(cache.is_empty());
    assert!(cache.peek(&key("a")).is_none());
    drop(handle);
  }
}
