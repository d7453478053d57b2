//! Ordered delivery: an append-only queue flushed one request at a time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use explore_domain::EngagementEvent;

use super::{deliver, EngagementSink};
use crate::infrastructure::ports::EngagementPort;

enum OutboxMessage {
    Event(EngagementEvent),
    Flush(oneshot::Sender<()>),
}

/// Delivers events in emission order. A failed delivery is logged and the
/// worker moves on to the next event.
pub struct SequentialOutbox {
    tx: mpsc::UnboundedSender<OutboxMessage>,
}

impl SequentialOutbox {
    /// Starts the delivery worker. Must be called from within a Tokio runtime.
    /// The worker stops when the outbox is dropped.
    pub fn spawn(port: Arc<dyn EngagementPort>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut delivered = 0usize;
            let mut failed = 0usize;
            while let Some(message) = rx.recv().await {
                match message {
                    OutboxMessage::Event(event) => {
                        if deliver(port.as_ref(), event).await {
                            delivered += 1;
                        } else {
                            failed += 1;
                        }
                    }
                    OutboxMessage::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            tracing::debug!(delivered, failed, "Engagement outbox stopped");
        });

        Self { tx }
    }
}

#[async_trait]
impl EngagementSink for SequentialOutbox {
    fn submit(&self, event: EngagementEvent) {
        if let Err(mpsc::error::SendError(OutboxMessage::Event(event))) =
            self.tx.send(OutboxMessage::Event(event))
        {
            tracing::warn!(
                content_id = %event.content_id,
                engagement_type = %event.kind,
                "Engagement outbox stopped, dropping event"
            );
        }
    }

    async fn drain(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(OutboxMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::infrastructure::ports::{MockEngagementPort, TransportError};
    use crate::test_fixtures::{at_secs, content_id};
    use explore_domain::EngagementType;

    fn event(id: i64, kind: EngagementType) -> EngagementEvent {
        EngagementEvent::new(content_id(id), kind, 0, None, at_secs(id))
    }

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let seen: Arc<Mutex<Vec<(i64, EngagementType)>>> = Arc::default();
        let mut port = MockEngagementPort::new();
        {
            let seen = seen.clone();
            port.expect_record().returning(move |e| {
                seen.lock()
                    .expect("seen lock")
                    .push((e.content_id.get(), e.kind));
                Ok(())
            });
        }

        let outbox = SequentialOutbox::spawn(Arc::new(port));
        outbox.submit(event(1, EngagementType::Complete));
        outbox.submit(event(1, EngagementType::Save));
        outbox.submit(event(2, EngagementType::Skip));
        outbox.submit(event(3, EngagementType::Click));
        outbox.drain().await;

        assert_eq!(
            *seen.lock().expect("seen lock"),
            vec![
                (1, EngagementType::Complete),
                (1, EngagementType::Save),
                (2, EngagementType::Skip),
                (3, EngagementType::Click),
            ]
        );
    }

    #[tokio::test]
    async fn failed_delivery_does_not_stop_the_queue() {
        let mut port = MockEngagementPort::new();
        port.expect_record()
            .withf(|e| e.content_id.get() == 1)
            .times(1)
            .returning(|_| Err(TransportError::unavailable("flaky")));
        port.expect_record()
            .withf(|e| e.content_id.get() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let outbox = SequentialOutbox::spawn(Arc::new(port));
        outbox.submit(event(1, EngagementType::Skip));
        outbox.submit(event(2, EngagementType::Skip));
        outbox.drain().await;
    }
}
