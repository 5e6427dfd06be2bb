// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the qdesk ticket queue.
//!
//! Domain types, the error type, queue ranks, events, the clock, and the
//! collaborator traits the engine is written against. Storage, transport
//! and fan-out live in their own crates and implement the traits here.

pub mod clock;
pub mod error;
pub mod events;
pub mod rank;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::QdeskError;
pub use events::{CallAction, DeskEvent, QueueUpdated, TicketCalled, TicketStatusChanged};
pub use rank::QueueRank;
pub use traits::{NotificationPublisher, RankPlacer, TicketSelector, TicketStore, WorkingSessionGate};
pub use types::{
    Catalog, ClaimOutcome, ClaimRequest, DisplayProfile, GateDecision, HealthStatus, NewTicket,
    PrioritySetting, PriorityStrategy, PriorityType, QueueSnapshot, Room, RoomId, Service,
    ServiceId, Ticket, TicketId, TicketNumber, TicketStatus, UserId, WorkingSession,
};
