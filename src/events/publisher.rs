//! In-process event fan-out.
//!
//! ```rust
//! use transaction_enrichment::events::{EventPublisher, PipelineEvent, PipelineObserver};
//! use uuid::Uuid;
//!
//! # tokio_test::block_on(async {
//! let publisher = EventPublisher::default();
//! let mut events = publisher.subscribe();
//!
//! publisher.record(&PipelineEvent::EnrichmentNothingPending {
//!     organization_id: Uuid::new_v4(),
//!     requested: 3,
//! });
//!
//! let published = events.recv().await.unwrap();
//! assert_eq!(published.name, "enrichment.nothing_pending");
//! # });
//! ```

use super::{PipelineEvent, PipelineObserver};
use tokio::sync::broadcast;

/// Broadcasts pipeline events to in-process subscribers (activity feeds,
/// notification fan-out). Publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub event: PipelineEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl PipelineObserver for EventPublisher {
    fn record(&self, event: &PipelineEvent) {
        let published = PublishedEvent {
            name: event.name().to_string(),
            event: event.clone(),
            published_at: chrono::Utc::now(),
        };
        // Err only means nobody is listening
        let _ = self.sender.send(published);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new(16);
        let mut receiver = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        publisher.record(&PipelineEvent::EnrichmentCompleted {
            organization_id: Uuid::nil(),
            enriched_count: 2,
        });

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.name, "enrichment.completed");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::default();
        publisher.record(&PipelineEvent::EmbeddingNothingPending {
            organization_id: Uuid::nil(),
            requested: 0,
        });
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
