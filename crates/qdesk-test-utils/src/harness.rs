// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles an [`Engine`] over a temp SQLite database seeded
//! with a small clinic catalog, a [`ManualClock`] and a [`RecordingPublisher`].

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use qdesk_config::model::StorageConfig;
use qdesk_core::types::{
    Catalog, DisplayProfile, PrioritySetting, PriorityStrategy, PriorityType, Room, RoomId,
    Service, TicketId, WorkingSession,
};
use qdesk_core::{NotificationPublisher, QdeskError, TicketStore};
use qdesk_engine::{CallOutcome, Engine, EngineSettings, IssueRequest, IssuedTicket};
use qdesk_storage::SqliteTicketStore;

use crate::clock::ManualClock;
use crate::publisher::RecordingPublisher;

/// Blood-test service with two rooms.
pub const XN: i64 = 1;
pub const XN1: RoomId = 10;
pub const XN2: RoomId = 11;
/// Consultation service with one room.
pub const KB: i64 = 2;
pub const KB1: RoomId = 20;

/// Services `XN` (rooms `XN1`, `XN2`) and `KB` (room `KB1`); no policy rows, no sessions.
pub fn clinic_catalog() -> Catalog {
    let service = |id, code: &str, name: &str| Service {
        id,
        code: code.into(),
        name: name.into(),
        is_active: true,
        display_order: 0,
    };
    let room = |id, service_id, code: &str| Room {
        id,
        service_id,
        code: code.into(),
        name: format!("Room {code}"),
        is_active: true,
    };
    Catalog {
        services: vec![service(XN, "XN", "Blood tests"), service(KB, "KB", "Consultation")],
        rooms: vec![room(XN1, XN, "XN1"), room(XN2, XN, "XN2"), room(KB1, KB, "KB1")],
        priority_settings: Vec::new(),
        working_sessions: Vec::new(),
    }
}

/// Builder for test environments.
pub struct TestHarnessBuilder {
    catalog: Catalog,
    displays: Vec<DisplayProfile>,
    start: DateTime<Utc>,
    offset: FixedOffset,
    settings: EngineSettings,
    publisher: Option<Arc<dyn NotificationPublisher>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            catalog: clinic_catalog(),
            displays: Vec::new(),
            // A Monday morning.
            start: Utc
                .with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
                .single()
                .expect("valid default start"),
            offset: Utc.fix(),
            settings: EngineSettings::default(),
            publisher: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Adds a policy row; ids are assigned in insertion order.
    pub fn with_policy(
        mut self,
        room_id: Option<RoomId>,
        service_id: Option<i64>,
        strategy: PriorityStrategy,
        interleave_interval: u32,
    ) -> Self {
        let id = self.catalog.priority_settings.len() as i64 + 1;
        self.catalog.priority_settings.push(PrioritySetting {
            id,
            room_id,
            service_id,
            strategy,
            interleave_interval,
            is_active: true,
        });
        self
    }

    pub fn with_session(mut self, session: WorkingSession) -> Self {
        self.catalog.working_sessions.push(session);
        self
    }

    pub fn with_display(mut self, display: DisplayProfile) -> Self {
        self.displays.push(display);
        self
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Site offset used to derive the queue day.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the recording publisher in the engine.
    pub fn with_publisher(mut self, publisher: Arc<dyn NotificationPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub async fn build(self) -> Result<TestHarness, QdeskError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| QdeskError::Storage {
            source: Box::new(e),
        })?;
        let store = SqliteTicketStore::new(StorageConfig {
            database_path: temp_dir.path().join("qdesk.db").display().to_string(),
            wal_mode: true,
        });
        store.initialize().await?;
        store.seed_catalog(&self.catalog).await?;
        let store = Arc::new(store);

        let clock = Arc::new(ManualClock::with_offset(self.start, self.offset));
        let recorder = RecordingPublisher::new();
        let publisher: Arc<dyn NotificationPublisher> = match self.publisher {
            Some(publisher) => publisher,
            None => Arc::new(recorder.clone()),
        };
        let engine = Engine::new(
            store.clone(),
            publisher,
            clock.clone(),
            self.settings,
            self.displays,
        );

        Ok(TestHarness {
            engine,
            store,
            clock,
            recorder,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine over temp storage.
pub struct TestHarness {
    pub engine: Engine,
    pub store: Arc<SqliteTicketStore>,
    pub clock: Arc<ManualClock>,
    /// Receives events unless the builder installed another publisher.
    pub recorder: RecordingPublisher,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default harness: clinic catalog, Strict everywhere, always open.
    pub async fn new() -> Result<Self, QdeskError> {
        Self::builder().build().await
    }

    pub async fn issue(
        &self,
        service_code: &str,
        priority_type: PriorityType,
    ) -> Result<IssuedTicket, QdeskError> {
        self.engine
            .issuer()
            .issue(IssueRequest::new(service_code, priority_type))
            .await
    }

    /// Issues into a specific room.
    pub async fn issue_in(
        &self,
        room_id: RoomId,
        service_code: &str,
        priority_type: PriorityType,
    ) -> Result<IssuedTicket, QdeskError> {
        self.engine
            .issuer()
            .issue(IssueRequest {
                room_id: Some(room_id),
                ..IssueRequest::new(service_code, priority_type)
            })
            .await
    }

    /// Printed number of a stored ticket.
    pub async fn number_of(&self, ticket_id: TicketId) -> Result<String, QdeskError> {
        self.store
            .ticket(ticket_id)
            .await?
            .map(|t| t.number)
            .ok_or_else(|| QdeskError::not_found("ticket", ticket_id))
    }

    /// Calls next and returns the called number, or `None` on an empty queue.
    pub async fn call_next(&self, room_id: RoomId) -> Result<Option<String>, QdeskError> {
        Ok(match self.engine.desk().call_next(room_id, None).await? {
            CallOutcome::Called(ticket) => Some(ticket.number),
            CallOutcome::QueueEmpty => None,
        })
    }

    /// Calls next and completes it, returning the served ticket id.
    pub async fn serve_next(&self, room_id: RoomId) -> Result<Option<TicketId>, QdeskError> {
        match self.engine.desk().call_next(room_id, None).await? {
            CallOutcome::Called(ticket) => {
                self.engine.desk().done(ticket.id, None).await?;
                Ok(Some(ticket.id))
            }
            CallOutcome::QueueEmpty => Ok(None),
        }
    }
}
