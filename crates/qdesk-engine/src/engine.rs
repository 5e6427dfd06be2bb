// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the engine components over shared collaborators.

use std::sync::Arc;

use qdesk_core::types::{DisplayProfile, HealthStatus};
use qdesk_core::{Clock, NotificationPublisher, QdeskError, TicketStore, WorkingSessionGate};

use crate::desk::CallingDesk;
use crate::gate::ScheduleGate;
use crate::issuer::TicketIssuer;
use crate::notify::Notifier;
use crate::policy::PriorityPolicy;
use crate::settings::EngineSettings;
use crate::views::QueueViews;

/// The operation surface: issuance, the calling desk, and read models.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn TicketStore>,
    issuer: TicketIssuer,
    desk: CallingDesk,
    views: QueueViews,
}

impl Engine {
    /// Builds an engine gated by the stored working sessions.
    pub fn new(
        store: Arc<dyn TicketStore>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
        displays: Vec<DisplayProfile>,
    ) -> Self {
        let gate = Arc::new(ScheduleGate::new(Arc::clone(&store), Arc::clone(&clock)));
        Self::with_gate(store, publisher, clock, gate, settings, displays)
    }

    /// Builds an engine with a custom issuance gate.
    pub fn with_gate(
        store: Arc<dyn TicketStore>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
        gate: Arc<dyn WorkingSessionGate>,
        settings: EngineSettings,
        displays: Vec<DisplayProfile>,
    ) -> Self {
        let policy = PriorityPolicy::new(Arc::clone(&store), settings.default_interleave_interval);
        let notifier = Notifier::new(publisher, settings.publish_timeout);

        Self {
            issuer: TicketIssuer::new(
                Arc::clone(&store),
                gate,
                Arc::clone(&clock),
                policy.clone(),
                notifier.clone(),
                settings.estimate_minutes_per_ticket,
            ),
            desk: CallingDesk::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                policy.clone(),
                notifier,
                settings.interleave_window,
            ),
            views: QueueViews::new(
                Arc::clone(&store),
                clock,
                policy,
                displays,
                settings.estimate_minutes_per_ticket,
            ),
            store,
        }
    }

    pub fn issuer(&self) -> &TicketIssuer {
        &self.issuer
    }

    pub fn desk(&self) -> &CallingDesk {
        &self.desk
    }

    pub fn views(&self) -> &QueueViews {
        &self.views
    }

    pub async fn health(&self) -> Result<HealthStatus, QdeskError> {
        self.store.health_check().await
    }
}
