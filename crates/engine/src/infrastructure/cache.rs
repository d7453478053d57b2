//! Read-through cache with a staleness budget and a single-flight wait list.
//!
//! Holds at most one value. A read that finds the value missing or stale runs
//! the caller's loader; reads that arrive while that load is in flight wait on
//! it instead of starting their own. `invalidate()` drops the cached value and
//! detaches any in-flight load, so the result of a load that started before
//! the invalidation is handed to its own waiters but never stored.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::infrastructure::ports::{ClockPort, TransportError};

type Waiter<V> = oneshot::Sender<Result<V, TransportError>>;

pub struct ReadThroughCache<V> {
    name: &'static str,
    ttl: Duration,
    clock: Arc<dyn ClockPort>,
    inner: Mutex<Inner<V>>,
}

struct Inner<V> {
    slot: Slot<V>,
    /// Bumped by `invalidate()`. A load only stores its value if the epoch it
    /// started in is still current.
    epoch: u64,
    waiters: Vec<(u64, Waiter<V>)>,
}

enum Slot<V> {
    Empty,
    Loading,
    Ready { value: V, loaded_at: DateTime<Utc> },
}

enum Plan<V> {
    Hit(V),
    Wait(oneshot::Receiver<Result<V, TransportError>>),
    Load(u64),
}

impl<V> ReadThroughCache<V>
where
    V: Clone + Send + 'static,
{
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            name,
            ttl,
            clock,
            inner: Mutex::new(Inner {
                slot: Slot::Empty,
                epoch: 0,
                waiters: Vec::new(),
            }),
        }
    }

    /// Fresh cached value, or the result of `load`.
    ///
    /// `load` is only invoked when no fresh value exists and no other load is
    /// in flight.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<V, TransportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, TransportError>>,
    {
        let plan = {
            let mut inner = self.lock();
            let now = self.clock.now();
            let fresh = match &inner.slot {
                Slot::Ready { value, loaded_at } if self.is_fresh(*loaded_at, now) => {
                    Some(value.clone())
                }
                _ => None,
            };

            if let Some(value) = fresh {
                Plan::Hit(value)
            } else if matches!(inner.slot, Slot::Loading) {
                let (tx, rx) = oneshot::channel();
                let epoch = inner.epoch;
                inner.waiters.push((epoch, tx));
                Plan::Wait(rx)
            } else {
                inner.slot = Slot::Loading;
                Plan::Load(inner.epoch)
            }
        };

        match plan {
            Plan::Hit(value) => {
                tracing::trace!(cache = self.name, "Cache hit");
                Ok(value)
            }
            Plan::Wait(rx) => {
                tracing::trace!(cache = self.name, "Waiting on in-flight load");
                rx.await.unwrap_or_else(|_| {
                    Err(TransportError::unavailable(format!(
                        "{} load was abandoned",
                        self.name
                    )))
                })
            }
            Plan::Load(epoch) => {
                tracing::debug!(cache = self.name, epoch, "Loading");
                let mut guard = LoadGuard {
                    cache: self,
                    epoch,
                    armed: true,
                };
                let result = load().await;
                guard.armed = false;
                self.finish(epoch, &result);
                result
            }
        }
    }

    /// Drops the cached value. An in-flight load keeps serving its waiters
    /// but will not be stored.
    pub fn invalidate(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.slot = Slot::Empty;
        tracing::debug!(cache = self.name, epoch = inner.epoch, "Invalidated");
    }

    fn finish(&self, epoch: u64, result: &Result<V, TransportError>) {
        let waiters = {
            let mut inner = self.lock();
            let waiters = take_waiters(&mut inner, epoch);
            if inner.epoch == epoch {
                inner.slot = match result {
                    Ok(value) => Slot::Ready {
                        value: value.clone(),
                        loaded_at: self.clock.now(),
                    },
                    Err(_) => Slot::Empty,
                };
            }
            waiters
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }

    fn is_fresh(&self, loaded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - loaded_at).to_std() {
            Ok(age) => age < self.ttl,
            // Clock moved backwards
            Err(_) => true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn take_waiters<V>(inner: &mut Inner<V>, epoch: u64) -> Vec<Waiter<V>> {
    let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.waiters)
        .into_iter()
        .partition(|(e, _)| *e == epoch);
    inner.waiters = rest;
    mine.into_iter().map(|(_, tx)| tx).collect()
}

/// Resets the slot if the loading future is dropped before completing.
/// Dropping the senders wakes the waiters with an error.
struct LoadGuard<'a, V> {
    cache: &'a ReadThroughCache<V>,
    epoch: u64,
    armed: bool,
}

impl<V> Drop for LoadGuard<'_, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self
            .cache
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let abandoned = take_waiters(&mut inner, self.epoch);
        if inner.epoch == self.epoch {
            inner.slot = Slot::Empty;
        }
        drop(inner);
        drop(abandoned);
        tracing::debug!(cache = self.cache.name, epoch = self.epoch, "Load abandoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache(clock: Arc<ManualClock>) -> ReadThroughCache<u32> {
        ReadThroughCache::new("test", Duration::from_secs(300), clock)
    }

    #[tokio::test]
    async fn fresh_value_is_served_without_loading() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone());
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value, Ok(7));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_value_is_reloaded() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone());

        assert_eq!(cache.get_or_load(|| async { Ok(1) }).await, Ok(1));
        clock.advance_secs(299);
        assert_eq!(cache.get_or_load(|| async { Ok(2) }).await, Ok(1));
        clock.advance_secs(1);
        assert_eq!(cache.get_or_load(|| async { Ok(3) }).await, Ok(3));
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock);

        assert_eq!(cache.get_or_load(|| async { Ok(1) }).await, Ok(1));
        cache.invalidate();
        assert_eq!(cache.get_or_load(|| async { Ok(2) }).await, Ok(2));
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock);

        let failed = cache
            .get_or_load(|| async { Err(TransportError::unavailable("down")) })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.get_or_load(|| async { Ok(5) }).await, Ok(5));
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_load() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock);
        let loads = AtomicUsize::new(0);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = cache.get_or_load(|| async {
            loads.fetch_add(1, Ordering::SeqCst);
            let _ = release_rx.await;
            Ok(42)
        });
        let second = cache.get_or_load(|| async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        });
        let release = async {
            tokio::task::yield_now().await;
            let _ = release_tx.send(());
        };

        let (a, b, ()) = tokio::join!(first, second, release);

        assert_eq!(a, Ok(42));
        assert_eq!(b, Ok(42));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_started_before_invalidate_is_not_stored() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let old_load = cache.get_or_load(|| async {
            let _ = release_rx.await;
            Ok(1)
        });
        let invalidate_then_release = async {
            tokio::task::yield_now().await;
            cache.invalidate();
            let _ = release_tx.send(());
        };

        let (old, ()) = tokio::join!(old_load, invalidate_then_release);
        assert_eq!(old, Ok(1));

        assert_eq!(cache.get_or_load(|| async { Ok(2) }).await, Ok(2));
    }
}
