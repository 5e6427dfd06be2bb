// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded event publishing after a committed transition.

use std::sync::Arc;
use std::time::Duration;

use qdesk_core::{DeskEvent, NotificationPublisher};
use tracing::{debug, warn};

/// Publishes committed transitions. Failures and timeouts are logged and
/// swallowed; a transition is never undone because an event was lost.
///
/// `send` is awaited inline, so the operation that triggered it returns only
/// after the publish finishes or `timeout` elapses. A stalled publisher delays
/// each desk operation by up to `desk.publish_timeout_ms` per event.
#[derive(Clone)]
pub(crate) struct Notifier {
    publisher: Arc<dyn NotificationPublisher>,
    timeout: Duration,
}

impl Notifier {
    pub(crate) fn new(publisher: Arc<dyn NotificationPublisher>, timeout: Duration) -> Self {
        Self { publisher, timeout }
    }

    pub(crate) async fn send(&self, event: DeskEvent) {
        let kind = event.kind();
        let room_id = event.room_id();
        match tokio::time::timeout(self.timeout, self.publisher.publish(event)).await {
            Ok(Ok(delivered)) => debug!(kind, room_id, delivered, "event published"),
            Ok(Err(e)) => warn!(kind, room_id, error = %e, "event publish failed"),
            Err(_) => warn!(
                kind,
                room_id,
                timeout_ms = self.timeout.as_millis() as u64,
                "event publish timed out"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qdesk_core::events::QueueUpdated;
    use qdesk_core::QdeskError;
    use tracing_test::traced_test;

    struct Broken;

    #[async_trait]
    impl NotificationPublisher for Broken {
        async fn publish(&self, _event: DeskEvent) -> Result<usize, QdeskError> {
            Err(QdeskError::Notification {
                message: "bus closed".into(),
            })
        }
    }

    struct Hung;

    #[async_trait]
    impl NotificationPublisher for Hung {
        async fn publish(&self, _event: DeskEvent) -> Result<usize, QdeskError> {
            std::future::pending::<()>().await;
            Ok(0)
        }
    }

    fn event() -> DeskEvent {
        DeskEvent::QueueUpdated(QueueUpdated {
            room_id: 10,
            room_code: "XN1".into(),
            queue_size: 1,
            affected_numbers: vec!["XN-0001".into()],
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_publish_is_logged_not_raised() {
        Notifier::new(Arc::new(Broken), Duration::from_millis(100))
            .send(event())
            .await;
        assert!(logs_contain("event publish failed"));
        assert!(logs_contain("bus closed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn hung_publisher_is_cut_off_by_timeout() {
        let started = std::time::Instant::now();
        Notifier::new(Arc::new(Hung), Duration::from_millis(20))
            .send(event())
            .await;
        let waited = started.elapsed();
        assert!(logs_contain("event publish timed out"));
        assert!(waited >= Duration::from_millis(20), "returned after {waited:?}");
        assert!(waited < Duration::from_secs(5), "returned after {waited:?}");
    }
}
