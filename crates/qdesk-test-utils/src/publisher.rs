// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishers that capture, fail, or hang, for asserting event behavior.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qdesk_core::{DeskEvent, NotificationPublisher, QdeskError};
use tokio::sync::Mutex;

/// Captures every published event in order.
#[derive(Default, Clone)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<DeskEvent>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<DeskEvent> {
        self.events.lock().await.clone()
    }

    /// Event kinds in publish order, e.g. `["ticket_called", "queue_updated"]`.
    pub async fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().await.iter().map(DeskEvent::kind).collect()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, event: DeskEvent) -> Result<usize, QdeskError> {
        self.events.lock().await.push(event);
        Ok(1)
    }
}

/// Rejects every event.
#[derive(Default, Clone, Copy)]
pub struct FailingPublisher;

#[async_trait]
impl NotificationPublisher for FailingPublisher {
    async fn publish(&self, event: DeskEvent) -> Result<usize, QdeskError> {
        Err(QdeskError::Notification {
            message: format!("{} dropped: transport down", event.kind()),
        })
    }
}

/// Never completes within any reasonable publish timeout.
#[derive(Default, Clone, Copy)]
pub struct StalledPublisher;

#[async_trait]
impl NotificationPublisher for StalledPublisher {
    async fn publish(&self, _event: DeskEvent) -> Result<usize, QdeskError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(0)
    }
}
