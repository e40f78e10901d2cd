//! Cache entry state and the snapshots consumers see.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::ApiError;
use crate::resource::RequestKey;

/// Freshness of a cache entry at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  /// No usable data; the next access must fetch.
  Absent,
  /// Within the stale window; served without refetching.
  Fresh,
  /// Past the stale window (or invalidated, or errored); last-known data
  /// stays usable while a refetch runs.
  Stale,
}

/// Broadcast state of one entry. Untyped; [`QueryHandle`](super::QueryHandle)
/// projects it into the requested type.
#[derive(Debug, Clone)]
pub struct EntryState {
  pub data: Option<Arc<Value>>,
  pub is_loading: bool,
  pub error: Option<ApiError>,
  pub fetched_at: Option<DateTime<Utc>>,
}

impl EntryState {
  fn empty() -> Self {
    Self {
      data: None,
      is_loading: false,
      error: None,
      fetched_at: None,
    }
  }
}

/// Typed read-only snapshot handed to consumers.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
  /// Decoded data — fresh, or last-known-good while loading or errored.
  pub data: Option<T>,
  /// Whether a fetch for this key is in flight.
  pub is_loading: bool,
  /// The most recent failure, cleared by the next successful fetch.
  pub error: Option<ApiError>,
  /// Wall-clock completion time of the last successful fetch.
  pub fetched_at: Option<DateTime<Utc>>,
}

/// Marker for the single fetch in flight for a key, with the number of
/// currently attached waiters. Completion is delivered through the entry's
/// watch channel whether or not any waiter is still attached.
pub(crate) struct InFlight {
  pub waiters: usize,
}

pub(crate) struct Entry {
  pub key: RequestKey,
  pub data: Option<Arc<Value>>,
  /// Monotonic completion time used for staleness arithmetic.
  pub fetched_at: Option<Instant>,
  /// Wall-clock counterpart surfaced to consumers.
  pub fetched_at_utc: Option<DateTime<Utc>>,
  pub stale_time: Duration,
  /// Set by `invalidate`; forces the next access down the fetch path.
  pub invalidated: bool,
  pub last_error: Option<ApiError>,
  pub in_flight: Option<InFlight>,
  pub tx: watch::Sender<EntryState>,
}

impl Entry {
  pub fn new(key: RequestKey, stale_time: Duration) -> Self {
    let (tx, _rx) = watch::channel(EntryState::empty());
    Self {
      key,
      data: None,
      fetched_at: None,
      fetched_at_utc: None,
      stale_time,
      invalidated: false,
      last_error: None,
      in_flight: None,
      tx,
    }
  }

  pub fn freshness(&self, now: Instant) -> Freshness {
    // An errored or invalidated entry always refetches on the next access;
    // whatever data it still holds is served as last-known-good meanwhile.
    if self.last_error.is_some() || self.invalidated {
      return if self.data.is_some() {
        Freshness::Stale
      } else {
        Freshness::Absent
      };
    }

    match self.fetched_at {
      None => Freshness::Absent,
      Some(at) if now.duration_since(at) < self.stale_time => Freshness::Fresh,
      Some(_) => Freshness::Stale,
    }
  }

  pub fn state(&self) -> EntryState {
    EntryState {
      data: self.data.clone(),
      is_loading: self.in_flight.is_some(),
      error: self.last_error.clone(),
      fetched_at: self.fetched_at_utc,
    }
  }

  /// Broadcast the current state to every subscriber.
  pub fn publish(&self) {
    self.tx.send_replace(self.state());
  }

  /// Apply a fetch completion. Success replaces the data and clears the last
  /// error; failure keeps prior data as last-known-good and records the
  /// error. Either way the in-flight marker is cleared and subscribers are
  /// notified.
  pub fn complete(&mut self, result: Result<Value, ApiError>) {
    match result {
      Ok(value) => {
        self.data = Some(Arc::new(value));
        self.last_error = None;
        self.fetched_at = Some(Instant::now());
        self.fetched_at_utc = Some(Utc::now());
        self.invalidated = false;
      }
      Err(err) => {
        self.last_error = Some(err);
      }
    }

    self.in_flight = None;
    self.publish();
  }
}
