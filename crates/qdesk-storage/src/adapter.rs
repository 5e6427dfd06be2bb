// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`TicketStore`] trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use qdesk_config::model::StorageConfig;
use qdesk_core::types::{
    Catalog, ClaimOutcome, ClaimRequest, HealthStatus, NewTicket, PrioritySetting, PriorityType,
    Room, RoomId, Service, ServiceId, Ticket, TicketId, TicketStatus, WorkingSession,
};
use qdesk_core::{QdeskError, RankPlacer, TicketSelector, TicketStore};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed ticket store.
///
/// The database is opened lazily by [`SqliteTicketStore::initialize`]; every
/// other method fails with a storage error until then.
pub struct SqliteTicketStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteTicketStore {
    /// The database is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already opened database, e.g. an in-memory one.
    pub fn with_database(db: Database) -> Self {
        Self {
            config: StorageConfig::default(),
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, QdeskError> {
        self.db.get().ok_or_else(|| QdeskError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Opens the configured database and runs migrations.
    pub async fn initialize(&self) -> Result<(), QdeskError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| QdeskError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite ticket store initialized");
        Ok(())
    }

    /// Writes `catalog` over the stored reference data.
    pub async fn seed_catalog(&self, catalog: &Catalog) -> Result<(), QdeskError> {
        queries::catalog::seed(self.db()?, catalog).await?;
        debug!(
            services = catalog.services.len(),
            rooms = catalog.rooms.len(),
            "catalog seeded"
        );
        Ok(())
    }

    /// Checkpoints the WAL. Safe to call when the store was never initialized.
    pub async fn close(&self) -> Result<(), QdeskError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    // --- Queue queries ---

    async fn find_pending_by_room(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Vec<Ticket>, QdeskError> {
        queries::tickets::find_pending_by_room(self.db()?, room_id, date).await
    }

    async fn find_current(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Option<Ticket>, QdeskError> {
        queries::tickets::find_current(self.db()?, room_id, date).await
    }

    async fn count_active(&self, room_id: RoomId, date: NaiveDate) -> Result<u32, QdeskError> {
        queries::tickets::count_active(self.db()?, room_id, date).await
    }

    async fn count_completed_since(
        &self,
        room_id: RoomId,
        date: NaiveDate,
        since: DateTime<Utc>,
        status: TicketStatus,
        priority_type: Option<PriorityType>,
    ) -> Result<u32, QdeskError> {
        queries::tickets::count_completed_since(
            self.db()?,
            room_id,
            date,
            since,
            status,
            priority_type,
        )
        .await
    }

    async fn tickets_for_room(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Vec<Ticket>, QdeskError> {
        queries::tickets::tickets_for_room(self.db()?, room_id, date).await
    }

    // --- Ticket writes ---

    async fn append(&self, ticket: NewTicket, placer: RankPlacer) -> Result<Ticket, QdeskError> {
        queries::tickets::append(self.db()?, ticket, placer).await
    }

    async fn update(&self, ticket: &Ticket, expected: TicketStatus) -> Result<(), QdeskError> {
        queries::tickets::update(self.db()?, ticket, expected).await
    }

    async fn carry_over(
        &self,
        ticket: &Ticket,
        expected: TicketStatus,
        prefix: &str,
    ) -> Result<Ticket, QdeskError> {
        queries::tickets::carry_over(self.db()?, ticket, expected, prefix).await
    }

    async fn claim_next(
        &self,
        request: ClaimRequest,
        selector: TicketSelector,
    ) -> Result<ClaimOutcome, QdeskError> {
        queries::tickets::claim_next(self.db()?, request, selector).await
    }

    async fn upsert_sequence(
        &self,
        service_id: ServiceId,
        date: NaiveDate,
        priority_type: PriorityType,
    ) -> Result<u32, QdeskError> {
        queries::sequences::next_ordinal(self.db()?, service_id, date, priority_type).await
    }

    // --- Ticket lookups ---

    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, QdeskError> {
        queries::tickets::get_ticket(self.db()?, id).await
    }

    async fn ticket_by_number(
        &self,
        number: &str,
        date: NaiveDate,
    ) -> Result<Option<Ticket>, QdeskError> {
        queries::tickets::get_ticket_by_number(self.db()?, number, date).await
    }

    // --- Catalog ---

    async fn service(&self, id: ServiceId) -> Result<Option<Service>, QdeskError> {
        queries::catalog::get_service(self.db()?, id).await
    }

    async fn service_by_code(&self, code: &str) -> Result<Option<Service>, QdeskError> {
        queries::catalog::get_service_by_code(self.db()?, code).await
    }

    async fn room(&self, id: RoomId) -> Result<Option<Room>, QdeskError> {
        queries::catalog::get_room(self.db()?, id).await
    }

    async fn rooms(&self, service_id: Option<ServiceId>) -> Result<Vec<Room>, QdeskError> {
        queries::catalog::list_rooms(self.db()?, service_id).await
    }

    async fn least_loaded_room(
        &self,
        service_id: ServiceId,
        date: NaiveDate,
    ) -> Result<Option<Room>, QdeskError> {
        queries::catalog::least_loaded_room(self.db()?, service_id, date).await
    }

    async fn priority_settings(&self) -> Result<Vec<PrioritySetting>, QdeskError> {
        queries::catalog::list_priority_settings(self.db()?).await
    }

    async fn working_sessions(&self) -> Result<Vec<WorkingSession>, QdeskError> {
        queries::catalog::list_working_sessions(self.db()?).await
    }

    async fn health_check(&self) -> Result<HealthStatus, QdeskError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}
