//! Engagement event delivery.
//!
//! The navigator emits events synchronously and hands them to an
//! [`EngagementSink`]; delivery happens in the background and never blocks
//! navigation. Failures are logged and dropped. Duplicate submissions are
//! forwarded as-is.

mod outbox;
mod recorder;

use async_trait::async_trait;

use explore_domain::EngagementEvent;

use crate::infrastructure::ports::EngagementPort;

pub use outbox::SequentialOutbox;
pub use recorder::EngagementRecorder;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementSink: Send + Sync {
    /// Hands an event off for delivery. Never blocks.
    fn submit(&self, event: EngagementEvent);

    /// Waits until every event submitted so far has been delivered or has
    /// failed.
    async fn drain(&self);
}

/// Sends one event, logging the outcome. Returns whether it was accepted.
async fn deliver(port: &dyn EngagementPort, event: EngagementEvent) -> bool {
    let content_id = event.content_id;
    let kind = event.kind;
    let session_id = event.session_id;

    match port.record(event).await {
        Ok(()) => {
            tracing::debug!(
                content_id = %content_id,
                engagement_type = %kind,
                session_id = ?session_id.map(|id| id.get()),
                "Engagement recorded"
            );
            true
        }
        Err(e) => {
            tracing::warn!(
                content_id = %content_id,
                engagement_type = %kind,
                error = %e,
                "Failed to record engagement"
            );
            false
        }
    }
}
