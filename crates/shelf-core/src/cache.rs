//! A time-boxed, single-slot cache in front of a remote read.
//!
//! [`FetchCache`] keeps the last successful result of a [`Fetcher`] for a
//! fixed TTL. The cache is an explicit object owned by whoever serves the
//! feed; there is no process-global slot.
//!
//! Refreshes are single-flight: when the slot is stale, callers queue on a
//! refresh gate and re-check the slot once they hold it, so a burst of
//! requests after expiry produces one upstream call. A failed refresh leaves
//! the slot untouched and is reported only to the caller that attempted it;
//! the next caller tries again. Stale data is never served.

use std::{future::Future, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::{Error, Result, catalog::CatalogSource};

/// Five minutes.
pub const DEFAULT_TTL_MS: i64 = 5 * 60 * 1000;

/// Number of trending books requested from the catalog.
pub const DEFAULT_TRENDING_LIMIT: usize = 8;

// ─── Time source ─────────────────────────────────────────────────────────────

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
  fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_ms(&self) -> i64 { Utc::now().timestamp_millis() }
}

// ─── Fetchers ────────────────────────────────────────────────────────────────

/// The remote read being cached.
pub trait Fetcher: Send + Sync {
  fn fetch(&self) -> impl Future<Output = Result<Value>> + Send + '_;
}

/// Fetches the top trending books from a [`CatalogSource`].
#[derive(Debug)]
pub struct TrendingBooks<C> {
  catalog: Arc<C>,
  limit:   usize,
}

impl<C> TrendingBooks<C> {
  pub fn new(catalog: Arc<C>, limit: usize) -> Self { Self { catalog, limit } }
}

impl<C: CatalogSource> Fetcher for TrendingBooks<C> {
  async fn fetch(&self) -> Result<Value> {
    self
      .catalog
      .fetch_trending_books(self.limit)
      .await
      .map_err(Error::upstream)
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// The cached value and the time it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPayload {
  pub data:          Value,
  pub fetched_at_ms: i64,
}

pub struct FetchCache<F, K = SystemClock> {
  fetcher: F,
  clock:   K,
  ttl_ms:  i64,
  slot:    RwLock<Option<CachedPayload>>,
  refresh: Mutex<()>,
}

impl<F: Fetcher> FetchCache<F> {
  pub fn new(fetcher: F, ttl_ms: i64) -> Self { Self::with_clock(fetcher, ttl_ms, SystemClock) }
}

impl<F: Fetcher, K: Clock> FetchCache<F, K> {
  pub fn with_clock(fetcher: F, ttl_ms: i64, clock: K) -> Self {
    Self {
      fetcher,
      clock,
      ttl_ms,
      slot: RwLock::new(None),
      refresh: Mutex::new(()),
    }
  }

  pub fn ttl_ms(&self) -> i64 { self.ttl_ms }

  /// The cached payload regardless of age.
  pub async fn peek(&self) -> Option<CachedPayload> { self.slot.read().await.clone() }

  /// Return the cached value if it is younger than the TTL, otherwise fetch,
  /// store and return a fresh one.
  pub async fn get_or_refresh(&self) -> Result<Value> {
    if let Some(data) = self.fresh().await {
      return Ok(data);
    }

    let _gate = self.refresh.lock().await;
    if let Some(data) = self.fresh().await {
      debug!("cache refreshed by a concurrent caller");
      return Ok(data);
    }

    let started = self.clock.now_ms();
    let data = match self.fetcher.fetch().await {
      Ok(data) => data,
      Err(e) => {
        warn!(error = %e, "cache refresh failed; keeping previous payload");
        return Err(e);
      }
    };

    debug!(fetched_at_ms = started, "cache refreshed");
    *self.slot.write().await = Some(CachedPayload {
      data:          data.clone(),
      fetched_at_ms: started,
    });
    Ok(data)
  }

  async fn fresh(&self) -> Option<Value> {
    let now = self.clock.now_ms();
    self
      .slot
      .read()
      .await
      .as_ref()
      .filter(|p| now - p.fetched_at_ms < self.ttl_ms)
      .map(|p| p.data.clone())
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::VecDeque,
    sync::{
      Mutex as StdMutex,
      atomic::{AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
  };

  use serde_json::json;

  use super::*;

  #[derive(Clone, Default)]
  struct ManualClock(Arc<AtomicI64>);

  impl ManualClock {
    fn set(&self, ms: i64) { self.0.store(ms, Ordering::SeqCst); }
  }

  impl Clock for ManualClock {
    fn now_ms(&self) -> i64 { self.0.load(Ordering::SeqCst) }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("catalog unavailable")]
  struct Unavailable;

  /// Replays queued outcomes; once the queue is empty every call succeeds
  /// with the call number.
  #[derive(Default)]
  struct Scripted {
    calls:    AtomicUsize,
    outcomes: StdMutex<VecDeque<Option<Value>>>,
    delay:    Option<Duration>,
  }

  impl Scripted {
    fn then_ok(self, v: Value) -> Self {
      self.outcomes.lock().unwrap().push_back(Some(v));
      self
    }

    fn then_fail(self) -> Self {
      self.outcomes.lock().unwrap().push_back(None);
      self
    }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  impl Fetcher for Arc<Scripted> {
    async fn fetch(&self) -> Result<Value> {
      let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
      if let Some(d) = self.delay {
        tokio::time::sleep(d).await;
      }
      let next = self.outcomes.lock().unwrap().pop_front();
      match next {
        Some(Some(v)) => Ok(v),
        Some(None) => Err(Error::upstream(Unavailable)),
        None => Ok(json!({ "call": n })),
      }
    }
  }

  fn cache(
    fetcher: &Arc<Scripted>,
    ttl_ms: i64,
  ) -> (FetchCache<Arc<Scripted>, ManualClock>, ManualClock) {
    let clock = ManualClock::default();
    (FetchCache::with_clock(fetcher.clone(), ttl_ms, clock.clone()), clock)
  }

  #[tokio::test]
  async fn serves_from_cache_until_ttl_elapses() {
    let fetcher = Arc::new(Scripted::default());
    let (cache, clock) = cache(&fetcher, 1000);

    let first = cache.get_or_refresh().await.unwrap();
    assert_eq!(fetcher.calls(), 1);

    clock.set(500);
    assert_eq!(cache.get_or_refresh().await.unwrap(), first);
    assert_eq!(fetcher.calls(), 1);

    clock.set(1500);
    let third = cache.get_or_refresh().await.unwrap();
    assert_eq!(fetcher.calls(), 2);
    assert_ne!(third, first);
    assert_eq!(cache.peek().await.unwrap().fetched_at_ms, 1500);
  }

  #[tokio::test]
  async fn exact_ttl_boundary_is_stale() {
    let fetcher = Arc::new(Scripted::default());
    let (cache, clock) = cache(&fetcher, 1000);

    cache.get_or_refresh().await.unwrap();
    clock.set(999);
    cache.get_or_refresh().await.unwrap();
    assert_eq!(fetcher.calls(), 1);

    clock.set(1000);
    cache.get_or_refresh().await.unwrap();
    assert_eq!(fetcher.calls(), 2);
  }

  #[tokio::test]
  async fn failed_refresh_keeps_old_payload_but_does_not_serve_it() {
    let fetcher = Arc::new(
      Scripted::default()
        .then_ok(json!(["dune"]))
        .then_fail()
        .then_fail(),
    );
    let (cache, clock) = cache(&fetcher, 1000);

    assert_eq!(cache.get_or_refresh().await.unwrap(), json!(["dune"]));

    clock.set(1500);
    assert!(matches!(cache.get_or_refresh().await, Err(Error::UpstreamFetch(_))));

    // Still expired relative to t=0, so this call must try again itself.
    clock.set(1600);
    assert!(matches!(cache.get_or_refresh().await, Err(Error::UpstreamFetch(_))));
    assert_eq!(fetcher.calls(), 3);

    let kept = cache.peek().await.unwrap();
    assert_eq!(kept.data, json!(["dune"]));
    assert_eq!(kept.fetched_at_ms, 0);

    clock.set(1700);
    assert_eq!(cache.get_or_refresh().await.unwrap(), json!({ "call": 4 }));
    assert_eq!(cache.peek().await.unwrap().fetched_at_ms, 1700);
  }

  #[tokio::test]
  async fn first_call_failure_leaves_cache_empty() {
    let fetcher = Arc::new(Scripted::default().then_fail());
    let (cache, _clock) = cache(&fetcher, 1000);

    assert!(cache.get_or_refresh().await.is_err());
    assert!(cache.peek().await.is_none());
    assert!(cache.get_or_refresh().await.is_ok());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_misses_share_one_fetch() {
    let fetcher = Arc::new(Scripted {
      delay: Some(Duration::from_millis(20)),
      ..Default::default()
    });
    let (cache, _clock) = cache(&fetcher, 1000);
    let cache = Arc::new(cache);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
      let cache = cache.clone();
      tasks.spawn(async move { cache.get_or_refresh().await.unwrap() });
    }
    while let Some(res) = tasks.join_next().await {
      assert_eq!(res.unwrap(), json!({ "call": 1 }));
    }
    assert_eq!(fetcher.calls(), 1);
  }

  #[derive(Debug, thiserror::Error)]
  #[error("offline")]
  struct Offline;

  struct FixedCatalog;

  impl CatalogSource for FixedCatalog {
    type Error = Offline;

    async fn fetch_trending_books(&self, limit: usize) -> Result<Value, Offline> {
      Ok(json!({ "limit": limit }))
    }

    async fn fetch_work(&self, _: &str) -> Result<Value, Offline> { Err(Offline) }
  }

  #[tokio::test]
  async fn trending_books_passes_limit_through() {
    let cache = FetchCache::new(
      TrendingBooks::new(Arc::new(FixedCatalog), DEFAULT_TRENDING_LIMIT),
      DEFAULT_TTL_MS,
    );
    assert_eq!(cache.get_or_refresh().await.unwrap(), json!({ "limit": 8 }));
  }
}
