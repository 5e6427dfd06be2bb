// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of desk events to displays and dashboards.

use async_trait::async_trait;

use crate::error::QdeskError;
use crate::events::DeskEvent;

/// Delivers desk events to every interested channel.
///
/// Callers publish only after the transition is committed, and treat an
/// error as a logging matter: a failed publish never undoes a transition.
#[async_trait]
pub trait NotificationPublisher: Send + Sync + 'static {
    /// Publishes `event`, returning how many subscribers received it.
    async fn publish(&self, event: DeskEvent) -> Result<usize, QdeskError>;
}
