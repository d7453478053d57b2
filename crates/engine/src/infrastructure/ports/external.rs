//! Remote service port traits (session, feed, engagement, onboarding).

use async_trait::async_trait;

use explore_domain::{
    CategoryId, ContentId, ContentItem, DeviceClass, EngagementEvent, FeatureProgress,
    OnboardingCounters, OnboardingEventType, SessionId,
};

use super::error::TransportError;

// =============================================================================
// Session
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionPort: Send + Sync {
    async fn open_session(&self, device: DeviceClass) -> Result<SessionId, TransportError>;
    async fn close_session(&self, session_id: SessionId) -> Result<(), TransportError>;
}

// =============================================================================
// Feed
// =============================================================================

/// Parameters of one feed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Full session history at call time; the ranking service should exclude it.
    pub history: Vec<ContentId>,
    pub category_id: Option<CategoryId>,
    pub limit: u32,
    pub offset: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedPort: Send + Sync {
    /// Ranked batch. Empty means no more content.
    async fn fetch_batch(&self, query: FeedQuery) -> Result<Vec<ContentItem>, TransportError>;
}

// =============================================================================
// Engagement
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementPort: Send + Sync {
    async fn record(&self, event: EngagementEvent) -> Result<(), TransportError>;
}

// =============================================================================
// Onboarding
// =============================================================================

/// Onboarding state read: counters plus unlocked feature names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingSnapshot {
    pub counters: OnboardingCounters,
    pub features_unlocked: Vec<String>,
}

/// Progress record for one gated feature, keyed by its wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureProgressRecord {
    pub feature: String,
    pub progress: FeatureProgress,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OnboardingPort: Send + Sync {
    async fn get_state(&self) -> Result<OnboardingSnapshot, TransportError>;
    async fn get_feature_progress(&self) -> Result<Vec<FeatureProgressRecord>, TransportError>;
    /// Triggers a server-side counter increment.
    async fn track_event(&self, event: OnboardingEventType) -> Result<(), TransportError>;
}
