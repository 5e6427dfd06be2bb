// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Working-hours gate for ticket issuance.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use qdesk_core::types::{GateDecision, WorkingSession};
use qdesk_core::{Clock, QdeskError, TicketStore, WorkingSessionGate};

/// Gate backed by the stored working sessions, evaluated in site-local time.
pub struct ScheduleGate {
    store: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
}

impl ScheduleGate {
    pub fn new(store: Arc<dyn TicketStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl WorkingSessionGate for ScheduleGate {
    async fn check(&self, at: DateTime<Utc>) -> Result<GateDecision, QdeskError> {
        let sessions = self.store.working_sessions().await?;
        Ok(evaluate(&sessions, self.clock.local(at)))
    }
}

/// Open when no session is active at all, or when `local` falls inside a
/// session that applies on its weekday. Closed decisions list the windows
/// that apply that day.
pub fn evaluate(sessions: &[WorkingSession], local: NaiveDateTime) -> GateDecision {
    let active: Vec<&WorkingSession> = sessions.iter().filter(|s| s.is_active).collect();
    if active.is_empty() {
        return GateDecision::Open;
    }

    let today: Vec<&WorkingSession> = active
        .into_iter()
        .filter(|s| s.applies_on(local.weekday()))
        .collect();
    if today.iter().any(|s| s.contains(local.time())) {
        GateDecision::Open
    } else {
        GateDecision::Closed {
            windows: today.iter().map(|s| s.window_label()).collect(),
        }
    }
}
