//! Progressive feature unlocks.
//!
//! Counters live on the onboarding service. This engine reads them (and the
//! per-feature progress) through read-through caches, reports events that
//! bump them, and announces each feature exactly once when it first shows
//! up as unlocked. Updates are pessimistic: nothing changes locally until
//! the service has accepted the event and the caches have been re-read.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use explore_domain::{FeatureProgress, FeatureUnlockState, OnboardingCounters, OnboardingEventType};

use crate::infrastructure::cache::ReadThroughCache;
use crate::infrastructure::ports::{
    ClockPort, FeatureProgressRecord, OnboardingPort, OnboardingSnapshot, TransportError,
};

/// Result of a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockUpdate {
    /// Merged state after this observation.
    pub state: FeatureUnlockState,
    /// Features unlocked since the previous observation. Empty for a
    /// baseline reading.
    pub newly_unlocked: Vec<String>,
}

pub struct ProgressiveUnlockEngine {
    port: Arc<dyn OnboardingPort>,
    state_cache: ReadThroughCache<OnboardingSnapshot>,
    progress_cache: ReadThroughCache<Vec<FeatureProgressRecord>>,
    /// Monotone merge of every observation so far. `None` until the first
    /// successful read.
    observed: Mutex<Option<FeatureUnlockState>>,
}

impl ProgressiveUnlockEngine {
    pub fn new(port: Arc<dyn OnboardingPort>, clock: Arc<dyn ClockPort>, ttl: Duration) -> Self {
        Self {
            port,
            state_cache: ReadThroughCache::new("onboarding_state", ttl, clock.clone()),
            progress_cache: ReadThroughCache::new("feature_progress", ttl, clock),
            observed: Mutex::new(None),
        }
    }

    pub async fn counters(&self) -> Result<OnboardingCounters, TransportError> {
        Ok(self.load_state().await?.counters)
    }

    /// Takes the mount-time reading. When nothing has been observed yet the
    /// reading is stored silently; otherwise this behaves like `refresh`.
    pub async fn take_baseline(&self) -> Result<UnlockUpdate, TransportError> {
        self.observe(true).await
    }

    /// Re-reads state and progress (through the caches) and diffs the
    /// unlocked set against the previous observation. Without one, every
    /// unlocked feature counts as new.
    pub async fn refresh(&self) -> Result<UnlockUpdate, TransportError> {
        self.observe(false).await
    }

    async fn observe(&self, baseline: bool) -> Result<UnlockUpdate, TransportError> {
        let (snapshot, progress) = tokio::try_join!(self.load_state(), self.load_progress())?;
        let latest = FeatureUnlockState::new(
            snapshot.features_unlocked,
            progress
                .into_iter()
                .map(|record| (record.feature, record.progress)),
        );

        let mut observed = self.lock_observed();
        let (state, newly_unlocked) = match observed.take() {
            None if baseline => {
                tracing::debug!(
                    unlocked = latest.unlocked().len(),
                    "Recorded onboarding baseline"
                );
                (latest, Vec::new())
            }
            previous => {
                let mut previous = previous.unwrap_or_default();
                let newly = previous.absorb(latest);
                (previous, newly)
            }
        };
        *observed = Some(state.clone());
        drop(observed);

        for feature in &newly_unlocked {
            tracing::info!(feature = %feature, "Feature unlocked");
        }
        Ok(UnlockUpdate {
            state,
            newly_unlocked,
        })
    }

    /// Against the last observed state. False before the first refresh.
    pub fn is_feature_unlocked(&self, feature: &str) -> bool {
        self.lock_observed()
            .as_ref()
            .is_some_and(|state| state.is_unlocked(feature))
    }

    pub fn progress(&self, feature: &str) -> FeatureProgress {
        self.lock_observed()
            .as_ref()
            .map(|state| state.progress(feature))
            .unwrap_or_default()
    }

    pub fn percentage(&self, feature: &str) -> f64 {
        self.progress(feature).percentage()
    }

    /// Reports an event. On success both caches are invalidated so the next
    /// read sees the server's new counters; on failure nothing changes.
    pub async fn track_event(&self, event: OnboardingEventType) -> bool {
        match self.port.track_event(event).await {
            Ok(()) => {
                self.state_cache.invalidate();
                self.progress_cache.invalidate();
                tracing::debug!(event = %event, "Onboarding event tracked");
                true
            }
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Failed to track onboarding event");
                false
            }
        }
    }

    /// Forgets the cached reads and the baseline, for a full counter reset.
    pub fn reset(&self) {
        self.state_cache.invalidate();
        self.progress_cache.invalidate();
        *self.lock_observed() = None;
        tracing::info!("Onboarding state reset");
    }

    async fn load_state(&self) -> Result<OnboardingSnapshot, TransportError> {
        self.state_cache
            .get_or_load(|| self.port.get_state())
            .await
    }

    async fn load_progress(&self) -> Result<Vec<FeatureProgressRecord>, TransportError> {
        self.progress_cache
            .get_or_load(|| self.port.get_feature_progress())
            .await
    }

    fn lock_observed(&self) -> MutexGuard<'_, Option<FeatureUnlockState>> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mockall::predicate::eq;

    use crate::infrastructure::in_memory::InMemoryExploreService;
    use crate::infrastructure::ports::MockOnboardingPort;
    use crate::test_fixtures::ManualClock;

    const TTL: Duration = Duration::from_secs(300);

    fn snapshot(views: u32, unlocked: &[&str]) -> OnboardingSnapshot {
        OnboardingSnapshot {
            counters: OnboardingCounters {
                content_view_count: views,
                ..OnboardingCounters::default()
            },
            features_unlocked: unlocked.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn filters_progress(views: u32) -> Vec<FeatureProgressRecord> {
        vec![FeatureProgressRecord {
            feature: "filters_save".to_string(),
            progress: FeatureProgress::new(10, views),
        }]
    }

    fn engine_over(port: Arc<dyn OnboardingPort>) -> (ProgressiveUnlockEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (
            ProgressiveUnlockEngine::new(port, clock.clone(), TTL),
            clock,
        )
    }

    #[tokio::test]
    async fn baseline_reading_is_silent() {
        let mut port = MockOnboardingPort::new();
        port.expect_get_state()
            .returning(|| Ok(snapshot(12, &["filters_save"])));
        port.expect_get_feature_progress()
            .returning(|| Ok(filters_progress(12)));
        let (engine, _clock) = engine_over(Arc::new(port));

        assert!(!engine.is_feature_unlocked("filters_save"));
        let update = engine.take_baseline().await.expect("baseline");

        assert!(update.newly_unlocked.is_empty());
        assert!(engine.is_feature_unlocked("filters_save"));
        assert_eq!(engine.percentage("filters_save"), 100.0);
    }

    #[tokio::test]
    async fn failed_baseline_leaves_later_unlocks_announced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut port = MockOnboardingPort::new();
        {
            let calls = calls.clone();
            port.expect_get_state().returning(move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TransportError::unavailable("down"))
                } else {
                    Ok(snapshot(0, &["topics"]))
                }
            });
        }
        port.expect_get_feature_progress()
            .returning(|| Ok(Vec::new()));
        let (engine, _clock) = engine_over(Arc::new(port));

        assert!(engine.take_baseline().await.is_err());
        assert!(!engine.is_feature_unlocked("topics"));

        let update = engine.refresh().await.expect("refresh");
        assert_eq!(update.newly_unlocked, vec!["topics".to_string()]);
        assert!(engine.is_feature_unlocked("topics"));
    }

    #[tokio::test]
    async fn later_baseline_reading_still_diffs() {
        let service = Arc::new(InMemoryExploreService::new(Vec::new()));
        let (engine, _clock) = engine_over(service.clone());
        engine.take_baseline().await.expect("baseline");

        engine.track_event(OnboardingEventType::PartnerEngagement).await;
        let update = engine.take_baseline().await.expect("second mount");

        assert_eq!(update.newly_unlocked, vec!["partner_profiles".to_string()]);
    }

    #[tokio::test]
    async fn reads_within_ttl_hit_the_cache() {
        let mut port = MockOnboardingPort::new();
        port.expect_get_state()
            .times(1)
            .returning(|| Ok(snapshot(7, &[])));
        port.expect_get_feature_progress()
            .times(1)
            .returning(|| Ok(filters_progress(7)));
        let (engine, clock) = engine_over(Arc::new(port));

        engine.refresh().await.expect("refresh");
        clock.advance_secs(120);
        engine.refresh().await.expect("refresh");
        assert_eq!(engine.counters().await.expect("counters").content_view_count, 7);

        assert_eq!(engine.percentage("filters_save"), 70.0);
    }

    #[tokio::test]
    async fn stale_cache_is_reloaded() {
        let mut port = MockOnboardingPort::new();
        port.expect_get_state()
            .times(2)
            .returning(|| Ok(snapshot(7, &[])));
        port.expect_get_feature_progress()
            .times(2)
            .returning(|| Ok(filters_progress(7)));
        let (engine, clock) = engine_over(Arc::new(port));

        engine.refresh().await.expect("refresh");
        clock.advance_secs(300);
        engine.refresh().await.expect("refresh");
    }

    #[tokio::test]
    async fn successful_track_invalidates_caches() {
        let views = Arc::new(AtomicUsize::new(9));
        let mut port = MockOnboardingPort::new();
        {
            let views = views.clone();
            port.expect_get_state().times(2).returning(move || {
                let n = views.load(Ordering::SeqCst) as u32;
                let unlocked: &[&str] = if n >= 10 { &["filters_save"] } else { &[] };
                Ok(snapshot(n, unlocked))
            });
        }
        {
            let views = views.clone();
            port.expect_get_feature_progress()
                .times(2)
                .returning(move || Ok(filters_progress(views.load(Ordering::SeqCst) as u32)));
        }
        {
            let views = views.clone();
            port.expect_track_event()
                .with(eq(OnboardingEventType::ContentView))
                .times(1)
                .returning(move |_| {
                    views.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
        }
        let (engine, _clock) = engine_over(Arc::new(port));

        engine.take_baseline().await.expect("baseline");
        assert!(engine.track_event(OnboardingEventType::ContentView).await);
        let update = engine.refresh().await.expect("refresh");

        assert_eq!(update.newly_unlocked, vec!["filters_save".to_string()]);
        assert!(engine.is_feature_unlocked("filters_save"));
    }

    #[tokio::test]
    async fn failed_track_leaves_caches_alone() {
        let mut port = MockOnboardingPort::new();
        port.expect_get_state()
            .times(1)
            .returning(|| Ok(snapshot(3, &[])));
        port.expect_get_feature_progress()
            .times(1)
            .returning(|| Ok(filters_progress(3)));
        port.expect_track_event()
            .times(1)
            .returning(|_| Err(TransportError::unavailable("down")));
        let (engine, _clock) = engine_over(Arc::new(port));

        engine.refresh().await.expect("refresh");
        assert!(!engine.track_event(OnboardingEventType::Save).await);
        engine.refresh().await.expect("refresh");

        assert_eq!(engine.progress("filters_save"), FeatureProgress::new(10, 3));
    }

    #[tokio::test]
    async fn unlocks_survive_server_regression() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut port = MockOnboardingPort::new();
        {
            let calls = calls.clone();
            port.expect_get_state().returning(move || {
                let unlocked: &[&str] = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    &["topics"]
                } else {
                    &[]
                };
                Ok(snapshot(0, unlocked))
            });
        }
        port.expect_get_feature_progress()
            .returning(|| Ok(Vec::new()));
        let (engine, _clock) = engine_over(Arc::new(port));

        engine.take_baseline().await.expect("baseline");
        engine.reset_caches_for_test();
        let update = engine.refresh().await.expect("refresh");

        assert!(update.newly_unlocked.is_empty());
        assert!(update.state.is_unlocked("topics"));
        assert!(engine.is_feature_unlocked("topics"));
    }

    #[tokio::test]
    async fn reset_starts_a_new_baseline() {
        let service = Arc::new(InMemoryExploreService::new(Vec::new()));
        let (engine, _clock) = engine_over(service.clone());

        engine.take_baseline().await.expect("baseline");
        engine.track_event(OnboardingEventType::PartnerEngagement).await;
        engine.reset();
        assert!(!engine.is_feature_unlocked("partner_profiles"));

        let update = engine.refresh().await.expect("refresh");
        assert!(update.newly_unlocked.is_empty());
        assert!(engine.is_feature_unlocked("partner_profiles"));
    }

    #[tokio::test]
    async fn announces_each_unlock_once() {
        let service = Arc::new(InMemoryExploreService::new(Vec::new()));
        let (engine, _clock) = engine_over(service.clone());
        engine.take_baseline().await.expect("baseline");

        for _ in 0..3 {
            engine.track_event(OnboardingEventType::Save).await;
        }
        let first = engine.refresh().await.expect("refresh");
        engine.track_event(OnboardingEventType::Save).await;
        let second = engine.refresh().await.expect("refresh");

        assert_eq!(first.newly_unlocked, vec!["topics".to_string()]);
        assert!(second.newly_unlocked.is_empty());
        assert_eq!(engine.counters().await.expect("counters").save_count, 4);
    }

    impl ProgressiveUnlockEngine {
        fn reset_caches_for_test(&self) {
            self.state_cache.invalidate();
            self.progress_cache.invalidate();
        }
    }
}
