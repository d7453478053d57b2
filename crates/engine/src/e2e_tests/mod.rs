//! End-to-end explore flows.
//!
//! Each test builds a complete [`App`] over the in-memory backend and a
//! manual clock, mounts a feed and drives it the way a viewer would.
//!
//! ```bash
//! cargo test -p explore-engine --lib e2e_tests
//! ```

mod explore_flow_tests;

use std::sync::Arc;

use crate::app::{App, ServicePorts};
use crate::infrastructure::config::{BackendKind, DeliveryMode, ExploreConfig};
use crate::infrastructure::in_memory::InMemoryExploreService;
use crate::test_fixtures::ManualClock;

pub(crate) struct E2EContext {
    pub app: App,
    pub service: Arc<InMemoryExploreService>,
    pub clock: Arc<ManualClock>,
}

impl E2EContext {
    pub fn with_catalog(catalog_len: usize) -> Self {
        Self::build(catalog_len, DeliveryMode::Concurrent)
    }

    pub fn sequential(catalog_len: usize) -> Self {
        Self::build(catalog_len, DeliveryMode::Sequential)
    }

    fn build(catalog_len: usize, delivery: DeliveryMode) -> Self {
        let service = Arc::new(InMemoryExploreService::with_demo_catalog(catalog_len));
        let clock = Arc::new(ManualClock::default());
        let config = ExploreConfig {
            backend: BackendKind::Memory,
            delivery,
            ..ExploreConfig::default()
        };
        let app = App::new(config, ServicePorts::shared(service.clone()), clock.clone());
        Self {
            app,
            service,
            clock,
        }
    }
}
