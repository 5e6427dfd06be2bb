// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain events emitted after committed desk transitions.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::types::{PriorityType, RoomId, TicketId, TicketStatus};

/// Why a ticket was announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    Call,
    Recall,
}

/// A ticket is being called (or re-called) to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCalled {
    pub ticket_id: TicketId,
    pub number: String,
    pub room_id: RoomId,
    pub room_code: String,
    pub room_name: String,
    pub service_code: String,
    pub priority_type: PriorityType,
    pub action: CallAction,
}

/// A room's pending queue changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueUpdated {
    pub room_id: RoomId,
    pub room_code: String,
    pub queue_size: u32,
    pub affected_numbers: Vec<String>,
}

/// A ticket moved between lifecycle states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketStatusChanged {
    pub ticket_id: TicketId,
    pub number: String,
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    pub room_id: RoomId,
    pub room_code: String,
}

/// Envelope for every event the desk publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    TicketCalled(TicketCalled),
    QueueUpdated(QueueUpdated),
    TicketStatusChanged(TicketStatusChanged),
}

impl DeskEvent {
    /// Room the event concerns.
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::TicketCalled(e) => e.room_id,
            Self::QueueUpdated(e) => e.room_id,
            Self::TicketStatusChanged(e) => e.room_id,
        }
    }

    /// Ticket number the event concerns, if it is about a single ticket.
    pub fn ticket_number(&self) -> Option<&str> {
        match self {
            Self::TicketCalled(e) => Some(&e.number),
            Self::TicketStatusChanged(e) => Some(&e.number),
            Self::QueueUpdated(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TicketCalled(_) => "ticket_called",
            Self::QueueUpdated(_) => "queue_updated",
            Self::TicketStatusChanged(_) => "ticket_status_changed",
        }
    }
}
