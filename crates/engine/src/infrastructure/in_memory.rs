//! In-memory implementation of every service port.
//!
//! Backs the demo binary (`EXPLORE_BACKEND=memory`) and the end-to-end tests.
//! Catalog order stands in for the ranking: a feed fetch returns the first
//! `limit` items (after `offset`) that are not in the caller's history and
//! match the category filter.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use explore_domain::{
    CategoryId, ContentId, ContentItem, ContentStats, DeviceClass, EngagementEvent,
    FeatureUnlockState, MediaLocator, OnboardingCounters, OnboardingEventType, PartnerId,
    PropertyId, SessionId,
};

use crate::infrastructure::ports::{
    EngagementPort, FeatureProgressRecord, FeedPort, FeedQuery, OnboardingPort,
    OnboardingSnapshot, SessionPort, TransportError,
};

#[derive(Default)]
struct SessionRegistry {
    last_id: i64,
    open: BTreeMap<SessionId, DeviceClass>,
    closed: Vec<SessionId>,
}

#[derive(Default)]
struct OnboardingRecord {
    counters: OnboardingCounters,
    unlocked: BTreeSet<String>,
}

impl OnboardingRecord {
    fn apply(&mut self, event: OnboardingEventType) {
        self.counters.increment(event);
        let derived = FeatureUnlockState::derive_from_counters(&self.counters);
        self.unlocked.extend(derived.unlocked().iter().cloned());
    }
}

pub struct InMemoryExploreService {
    catalog: RwLock<Vec<ContentItem>>,
    sessions: RwLock<SessionRegistry>,
    engagements: RwLock<Vec<EngagementEvent>>,
    onboarding: RwLock<OnboardingRecord>,
    feed_queries: RwLock<Vec<FeedQuery>>,
}

impl InMemoryExploreService {
    pub fn new(catalog: Vec<ContentItem>) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            sessions: RwLock::new(SessionRegistry::default()),
            engagements: RwLock::new(Vec::new()),
            onboarding: RwLock::new(OnboardingRecord::default()),
            feed_queries: RwLock::new(Vec::new()),
        }
    }

    /// Service pre-loaded with [`demo_catalog`].
    pub fn with_demo_catalog(len: usize) -> Self {
        Self::new(demo_catalog(len))
    }

    /// Every engagement received, in arrival order.
    pub async fn engagements(&self) -> Vec<EngagementEvent> {
        self.engagements.read().await.clone()
    }

    pub async fn feed_queries(&self) -> Vec<FeedQuery> {
        self.feed_queries.read().await.clone()
    }

    pub async fn open_sessions(&self) -> Vec<SessionId> {
        self.sessions.read().await.open.keys().copied().collect()
    }

    pub async fn closed_sessions(&self) -> Vec<SessionId> {
        self.sessions.read().await.closed.clone()
    }

    pub async fn counters(&self) -> OnboardingCounters {
        self.onboarding.read().await.counters
    }
}

/// `len` synthetic items with ids `1..=len`. Items alternate between
/// categories 1 and 2; every fourth item is promoted by partner 1.
pub fn demo_catalog(len: usize) -> Vec<ContentItem> {
    (1..=len as i64)
        .filter_map(|n| {
            let media = MediaLocator::new(format!("https://cdn.explore.test/videos/{}.mp4", n))
                .ok()?
                .with_thumbnail(format!("https://cdn.explore.test/thumbs/{}.jpg", n));
            let mut item = ContentItem::new(ContentId::new(n).ok()?, media)
                .with_title(format!("Property tour #{}", n))
                .with_duration_secs(15 + (n % 4) as u32 * 15)
                .with_category(CategoryId::from_raw(1 + n % 2))
                .with_property(PropertyId::from_raw(100 + n))
                .with_stats(ContentStats {
                    view_count: (n as u64) * 37,
                    completion_rate: 0.5,
                    engagement_score: 1.0 / n as f64,
                });
            if n % 4 == 0 {
                item = item.with_partner(PartnerId::from_raw(1));
            }
            Some(item)
        })
        .collect()
}

#[async_trait]
impl SessionPort for InMemoryExploreService {
    async fn open_session(&self, device: DeviceClass) -> Result<SessionId, TransportError> {
        let mut sessions = self.sessions.write().await;
        sessions.last_id += 1;
        let id = SessionId::from_raw(sessions.last_id);
        sessions.open.insert(id, device);
        Ok(id)
    }

    async fn close_session(&self, session_id: SessionId) -> Result<(), TransportError> {
        let mut sessions = self.sessions.write().await;
        if sessions.open.remove(&session_id).is_none() {
            return Err(TransportError::unsuccessful(
                "explore/sessions/close",
                format!("session {} is not open", session_id),
            ));
        }
        sessions.closed.push(session_id);
        Ok(())
    }
}

#[async_trait]
impl FeedPort for InMemoryExploreService {
    async fn fetch_batch(&self, query: FeedQuery) -> Result<Vec<ContentItem>, TransportError> {
        let excluded: BTreeSet<ContentId> = query.history.iter().copied().collect();
        let batch = self
            .catalog
            .read()
            .await
            .iter()
            .filter(|item| !excluded.contains(&item.id()))
            .filter(|item| match query.category_id {
                Some(category) => item.category_id() == Some(category),
                None => true,
            })
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        self.feed_queries.write().await.push(query);
        Ok(batch)
    }
}

#[async_trait]
impl EngagementPort for InMemoryExploreService {
    async fn record(&self, event: EngagementEvent) -> Result<(), TransportError> {
        self.engagements.write().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl OnboardingPort for InMemoryExploreService {
    async fn get_state(&self) -> Result<OnboardingSnapshot, TransportError> {
        let record = self.onboarding.read().await;
        Ok(OnboardingSnapshot {
            counters: record.counters,
            features_unlocked: record.unlocked.iter().cloned().collect(),
        })
    }

    async fn get_feature_progress(&self) -> Result<Vec<FeatureProgressRecord>, TransportError> {
        let counters = self.onboarding.read().await.counters;
        let derived = FeatureUnlockState::derive_from_counters(&counters);
        Ok(explore_domain::GatedFeature::ALL
            .iter()
            .map(|feature| FeatureProgressRecord {
                feature: feature.as_str().to_string(),
                progress: derived.progress(feature.as_str()),
            })
            .collect())
    }

    async fn track_event(&self, event: OnboardingEventType) -> Result<(), TransportError> {
        self.onboarding.write().await.apply(event);
        Ok(())
    }
}
