//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    config::{BackendKind, DeliveryMode, ExploreConfig, MAX_PAGE_SIZE, MIN_PAGE_SIZE},
    http::HttpExploreClient,
    in_memory::InMemoryExploreService,
    ports::{ClockPort, EngagementPort, FeedPort, OnboardingPort, SessionPort},
};
use crate::use_cases::{
    EngagementRecorder, EngagementSink, ExploreFeed, FeedNavigator, FeedProvider,
    ProgressiveUnlockEngine, SequentialOutbox, SessionManager,
};

/// Catalog size for the in-memory backend.
const DEMO_CATALOG_LEN: usize = 60;

/// The four remote services, injected as port traits.
#[derive(Clone)]
pub struct ServicePorts {
    pub session: Arc<dyn SessionPort>,
    pub feed: Arc<dyn FeedPort>,
    pub engagement: Arc<dyn EngagementPort>,
    pub onboarding: Arc<dyn OnboardingPort>,
}

impl ServicePorts {
    /// All four ports backed by one adapter.
    pub fn shared<T>(adapter: Arc<T>) -> Self
    where
        T: SessionPort + FeedPort + EngagementPort + OnboardingPort + 'static,
    {
        Self {
            session: adapter.clone(),
            feed: adapter.clone(),
            engagement: adapter.clone(),
            onboarding: adapter,
        }
    }
}

/// Main application state.
///
/// The unlock engine is shared so every feed instance reads the same
/// onboarding caches.
pub struct App {
    pub config: ExploreConfig,
    pub ports: ServicePorts,
    pub clock: Arc<dyn ClockPort>,
    pub unlocks: Arc<ProgressiveUnlockEngine>,
}

impl App {
    /// Page sizes outside `MIN_PAGE_SIZE..=MAX_PAGE_SIZE` are clamped.
    pub fn new(mut config: ExploreConfig, ports: ServicePorts, clock: Arc<dyn ClockPort>) -> Self {
        let page_size = config.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        if page_size != config.page_size {
            tracing::warn!(
                requested = config.page_size,
                page_size,
                "Page size out of range, clamped"
            );
            config.page_size = page_size;
        }
        let unlocks = Arc::new(ProgressiveUnlockEngine::new(
            ports.onboarding.clone(),
            clock.clone(),
            config.onboarding_ttl,
        ));
        Self {
            config,
            ports,
            clock,
            unlocks,
        }
    }

    /// Builds the adapters named by `config.backend`.
    pub fn from_config(config: ExploreConfig) -> Self {
        let ports = match config.backend {
            BackendKind::Http => {
                tracing::info!(api_url = %config.api_url, "Using HTTP explore backend");
                ServicePorts::shared(Arc::new(HttpExploreClient::new(
                    &config.api_url,
                    config.request_timeout,
                )))
            }
            BackendKind::Memory => {
                tracing::info!(catalog = DEMO_CATALOG_LEN, "Using in-memory explore backend");
                ServicePorts::shared(Arc::new(InMemoryExploreService::with_demo_catalog(
                    DEMO_CATALOG_LEN,
                )))
            }
        };
        Self::new(config, ports, Arc::new(SystemClock::new()))
    }

    /// A fresh feed instance with its own session and navigator.
    ///
    /// Must be called from within a Tokio runtime when delivery is
    /// sequential, since the outbox worker is spawned here.
    pub fn explore_feed(&self) -> ExploreFeed {
        let sink: Arc<dyn EngagementSink> = match self.config.delivery {
            DeliveryMode::Concurrent => {
                Arc::new(EngagementRecorder::new(self.ports.engagement.clone()))
            }
            DeliveryMode::Sequential => {
                Arc::new(SequentialOutbox::spawn(self.ports.engagement.clone()))
            }
        };
        let session = Arc::new(SessionManager::new(self.ports.session.clone()));
        let navigator = FeedNavigator::new(
            FeedProvider::new(self.ports.feed.clone(), self.config.page_size),
            sink.clone(),
            session.handle(),
            self.clock.clone(),
            self.config.category_id,
        );
        ExploreFeed::new(session, navigator, sink, self.unlocks.clone())
    }
}
