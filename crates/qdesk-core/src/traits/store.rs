// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable ticket and catalog storage.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::QdeskError;
use crate::rank::QueueRank;
use crate::types::{
    ClaimOutcome, ClaimRequest, HealthStatus, NewTicket, PriorityType, PrioritySetting,
    QueueSnapshot, Room, RoomId, Service, ServiceId, Ticket, TicketId, TicketStatus,
    WorkingSession,
};

/// Computes the rank of a new ticket from the room's pending tickets (ascending by rank).
///
/// Runs inside the store's write transaction, so no ticket can slip into the
/// pending set between the read and the insert.
pub type RankPlacer = Box<dyn FnOnce(&[Ticket]) -> QueueRank + Send>;

/// Picks the ticket to call from a room snapshot. Runs inside the claim transaction.
pub type TicketSelector = Box<dyn FnOnce(&QueueSnapshot) -> Option<TicketId> + Send>;

/// Storage contract for tickets, daily sequences and the reference catalog.
///
/// Every method is a single atomic unit. Dates are queue days, not UTC dates.
#[async_trait]
pub trait TicketStore: Send + Sync + 'static {
    // --- Queue queries ---

    /// Pending tickets of a room for `date`, ascending by rank.
    async fn find_pending_by_room(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Vec<Ticket>, QdeskError>;

    /// The Calling or Serving ticket of a room for `date`.
    async fn find_current(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Option<Ticket>, QdeskError>;

    /// Pending plus Calling tickets of a room for `date`.
    async fn count_active(&self, room_id: RoomId, date: NaiveDate) -> Result<u32, QdeskError>;

    /// Tickets of a room for `date` in `status` completed at or after `since`,
    /// optionally restricted to one class.
    async fn count_completed_since(
        &self,
        room_id: RoomId,
        date: NaiveDate,
        since: DateTime<Utc>,
        status: TicketStatus,
        priority_type: Option<PriorityType>,
    ) -> Result<u32, QdeskError>;

    /// Every ticket of a room for `date`, any status, ascending by rank.
    async fn tickets_for_room(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Vec<Ticket>, QdeskError>;

    // --- Ticket writes ---

    /// Inserts a ticket whose rank is computed by `placer` over the room's
    /// pending set, in the same transaction.
    async fn append(&self, ticket: NewTicket, placer: RankPlacer) -> Result<Ticket, QdeskError>;

    /// Persists every mutable field of `ticket` if its stored status is still
    /// `expected`, the status the caller read before deciding the transition.
    ///
    /// Fails with `Conflict` when another write changed the status first or
    /// the write would break the one-active-ticket rule or ticket-number
    /// uniqueness, and `NotFound` for an unknown id.
    async fn update(&self, ticket: &Ticket, expected: TicketStatus) -> Result<(), QdeskError>;

    /// Status-checked write for a ticket moving into a new queue day: draws a
    /// fresh `{prefix}` number from that day's sequence in the same
    /// transaction and returns the stored ticket.
    async fn carry_over(
        &self,
        ticket: &Ticket,
        expected: TicketStatus,
        prefix: &str,
    ) -> Result<Ticket, QdeskError>;

    /// Atomically moves the ticket chosen by `selector` from Pending to Calling,
    /// unless the room already has an active ticket.
    async fn claim_next(
        &self,
        request: ClaimRequest,
        selector: TicketSelector,
    ) -> Result<ClaimOutcome, QdeskError>;

    /// Increments the `(service, date)` counter for `priority_type`, creating
    /// the row on first use, and returns the new ordinal.
    async fn upsert_sequence(
        &self,
        service_id: ServiceId,
        date: NaiveDate,
        priority_type: PriorityType,
    ) -> Result<u32, QdeskError>;

    // --- Ticket lookups ---

    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, QdeskError>;

    async fn ticket_by_number(
        &self,
        number: &str,
        date: NaiveDate,
    ) -> Result<Option<Ticket>, QdeskError>;

    // --- Catalog ---

    async fn service(&self, id: ServiceId) -> Result<Option<Service>, QdeskError>;

    async fn service_by_code(&self, code: &str) -> Result<Option<Service>, QdeskError>;

    async fn room(&self, id: RoomId) -> Result<Option<Room>, QdeskError>;

    /// Rooms ordered by id, optionally restricted to one service.
    async fn rooms(&self, service_id: Option<ServiceId>) -> Result<Vec<Room>, QdeskError>;

    /// The active room of a service with the fewest active tickets on `date`, lowest id on ties.
    async fn least_loaded_room(
        &self,
        service_id: ServiceId,
        date: NaiveDate,
    ) -> Result<Option<Room>, QdeskError>;

    async fn priority_settings(&self) -> Result<Vec<PrioritySetting>, QdeskError>;

    async fn working_sessions(&self) -> Result<Vec<WorkingSession>, QdeskError>;

    async fn health_check(&self) -> Result<HealthStatus, QdeskError>;
}
