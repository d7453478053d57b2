//! Fire-and-forget delivery: one background task per event.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use explore_domain::EngagementEvent;

use super::{deliver, EngagementSink};
use crate::infrastructure::ports::EngagementPort;

/// Default sink. Events are delivered concurrently, so the service may see
/// them out of emission order.
pub struct EngagementRecorder {
    port: Arc<dyn EngagementPort>,
    tasks: TaskTracker,
}

impl EngagementRecorder {
    pub fn new(port: Arc<dyn EngagementPort>) -> Self {
        Self {
            port,
            tasks: TaskTracker::new(),
        }
    }
}

#[async_trait]
impl EngagementSink for EngagementRecorder {
    fn submit(&self, event: EngagementEvent) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(
                content_id = %event.content_id,
                engagement_type = %event.kind,
                "No async runtime, dropping engagement"
            );
            return;
        };

        let port = self.port.clone();
        self.tasks.spawn_on(
            async move {
                deliver(port.as_ref(), event).await;
            },
            &runtime,
        );
    }

    async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}
