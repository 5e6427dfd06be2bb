// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, engine, bus and gateway.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::QdeskError;
use crate::rank::QueueRank;

pub type TicketId = i64;
pub type RoomId = i64;
pub type ServiceId = i64;
pub type UserId = i64;

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}

/// Lifecycle state of a ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Calling,
    Serving,
    Done,
    Passed,
    Cancelled,
}

impl TicketStatus {
    /// Calling or Serving: the ticket currently occupying its room's desk.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Calling | Self::Serving)
    }

    /// Done, Passed or Cancelled.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Passed | Self::Cancelled)
    }
}

/// Ticket class. `Priority` sorts above `Normal`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriorityType {
    #[default]
    Normal,
    Priority,
}

impl PriorityType {
    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Priority,
            Self::Priority => Self::Normal,
        }
    }
}

/// Ordering strategy applied to a room's queue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriorityStrategy {
    /// Every priority ticket precedes every normal ticket.
    #[default]
    Strict,
    /// Priority tickets are mixed in at a fixed ratio of normal tickets.
    Interleaved,
}

/// Human-readable ticket number such as `XN-0007` or `XN-U0002`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketNumber {
    pub prefix: String,
    pub priority_type: PriorityType,
    pub ordinal: u32,
}

impl TicketNumber {
    pub fn new(prefix: impl Into<String>, priority_type: PriorityType, ordinal: u32) -> Self {
        Self {
            prefix: prefix.into(),
            priority_type,
            ordinal,
        }
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.priority_type {
            PriorityType::Normal => write!(f, "{}-{:04}", self.prefix, self.ordinal),
            PriorityType::Priority => write!(f, "{}-U{:04}", self.prefix, self.ordinal),
        }
    }
}

impl FromStr for TicketNumber {
    type Err = QdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QdeskError::Rejected {
            message: format!("`{s}` is not a ticket number"),
        };
        let (prefix, tail) = s.rsplit_once('-').ok_or_else(invalid)?;
        if prefix.is_empty() {
            return Err(invalid());
        }
        let (priority_type, digits) = match tail.strip_prefix('U') {
            Some(digits) => (PriorityType::Priority, digits),
            None => (PriorityType::Normal, tail),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let ordinal = digits.parse().map_err(|_| invalid())?;
        Ok(Self::new(prefix, priority_type, ordinal))
    }
}

/// A service ticket.
///
/// `issued_at` is the wall-clock time the ticket (re-)entered the queue and
/// drives wait-time figures; `queue_rank` alone decides queue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub number: String,
    pub service_id: ServiceId,
    pub room_id: RoomId,
    pub priority_type: PriorityType,
    pub status: TicketStatus,
    pub queue_rank: QueueRank,
    pub issued_date: NaiveDate,
    pub issued_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub serving_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub wait_time_seconds: Option<i64>,
    pub service_time_seconds: Option<i64>,
    pub called_by_user_id: Option<UserId>,
    pub post_process_branch_id: Option<i64>,
    pub kiosk_id: Option<String>,
}

impl Ticket {
    /// Puts the ticket back at the end of `room_id`'s queue for `date`.
    ///
    /// Clears every lifecycle field set by calling or completion.
    pub fn requeue(&mut self, room_id: RoomId, date: NaiveDate, now: DateTime<Utc>) {
        self.room_id = room_id;
        self.status = TicketStatus::Pending;
        self.issued_date = date;
        self.issued_at = now;
        self.queue_rank = QueueRank::at(now);
        self.called_at = None;
        self.serving_at = None;
        self.completed_at = None;
        self.called_by_user_id = None;
        self.wait_time_seconds = None;
        self.service_time_seconds = None;
    }
}

/// A ticket about to be appended; the store assigns `id` and `queue_rank`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub number: String,
    pub service_id: ServiceId,
    pub room_id: RoomId,
    pub priority_type: PriorityType,
    pub issued_date: NaiveDate,
    pub issued_at: DateTime<Utc>,
    pub kiosk_id: Option<String>,
}

/// A service offered at the site; its code prefixes ticket numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub display_order: i32,
}

/// A room or counter serving one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub service_id: ServiceId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

/// Priority policy override bound to a room, a service, or neither (global).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritySetting {
    pub id: i64,
    pub room_id: Option<RoomId>,
    pub service_id: Option<ServiceId>,
    pub strategy: PriorityStrategy,
    pub interleave_interval: u32,
    pub is_active: bool,
}

/// A time-of-day window during which tickets may be issued.
///
/// `end_time` is exclusive. `day_of_week = None` applies every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSession {
    pub id: i64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub day_of_week: Option<Weekday>,
    pub is_active: bool,
}

impl WorkingSession {
    pub fn applies_on(&self, day: Weekday) -> bool {
        self.day_of_week.is_none_or(|d| d == day)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Label used when rejecting issuance, e.g. `Morning 07:30-11:30`.
    pub fn window_label(&self) -> String {
        format!(
            "{} {}-{}",
            self.name,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// A wall display watching a set of rooms. An empty room list watches every active room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayProfile {
    pub id: String,
    pub name: String,
    pub rooms: Vec<RoomId>,
}

impl DisplayProfile {
    pub fn watches(&self, room_id: RoomId) -> bool {
        self.rooms.is_empty() || self.rooms.contains(&room_id)
    }
}

/// Reference data the queue runs against, seeded from configuration.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub services: Vec<Service>,
    pub rooms: Vec<Room>,
    pub priority_settings: Vec<PrioritySetting>,
    pub working_sessions: Vec<WorkingSession>,
}

/// Everything next-ticket selection needs to know about a room, read in one transaction.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub room_id: RoomId,
    pub now: DateTime<Utc>,
    /// Pending tickets for the day, ascending by rank.
    pub pending: Vec<Ticket>,
    /// Done tickets completed inside the rolling window.
    pub recent_done: u32,
    /// Priority tickets among `recent_done`.
    pub recent_priority_done: u32,
}

/// Parameters of an atomic Pending to Calling claim.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub now: DateTime<Utc>,
    /// Start of the rolling window for completion counts.
    pub window_start: DateTime<Utc>,
    pub called_by: Option<UserId>,
}

/// Result of [`crate::TicketStore::claim_next`].
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The selected ticket, now Calling.
    Claimed(Ticket),
    /// The room already has an active ticket; nothing changed.
    Busy(Ticket),
    /// No pending ticket was selected.
    Empty,
}

/// Whether ticket issuance is currently allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Open,
    /// Closed; carries the labels of the windows that apply today.
    Closed { windows: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_number_formats_both_classes() {
        assert_eq!(
            TicketNumber::new("XN", PriorityType::Normal, 7).to_string(),
            "XN-0007"
        );
        assert_eq!(
            TicketNumber::new("XN", PriorityType::Priority, 2).to_string(),
            "XN-U0002"
        );
        assert_eq!(
            TicketNumber::new("XN", PriorityType::Normal, 12345).to_string(),
            "XN-12345"
        );
    }

    #[test]
    fn ticket_number_parses_back() {
        let n: TicketNumber = "XN-U0002".parse().unwrap();
        assert_eq!(n, TicketNumber::new("XN", PriorityType::Priority, 2));
        let n: TicketNumber = "LAB-A-0010".parse().unwrap();
        assert_eq!(n.prefix, "LAB-A");
        assert_eq!(n.ordinal, 10);
    }

    #[test]
    fn ticket_number_rejects_garbage() {
        assert!("XN0001".parse::<TicketNumber>().is_err());
        assert!("-0001".parse::<TicketNumber>().is_err());
        assert!("XN-U".parse::<TicketNumber>().is_err());
        assert!("XN-00a1".parse::<TicketNumber>().is_err());
    }

    #[test]
    fn status_round_trips_through_strum() {
        for status in [
            TicketStatus::Pending,
            TicketStatus::Calling,
            TicketStatus::Serving,
            TicketStatus::Done,
            TicketStatus::Passed,
            TicketStatus::Cancelled,
        ] {
            let parsed: TicketStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(TicketStatus::Calling.to_string(), "calling");
    }

    #[test]
    fn priority_sorts_above_normal() {
        assert!(PriorityType::Priority > PriorityType::Normal);
        assert_eq!(PriorityType::Normal.toggled(), PriorityType::Priority);
    }

    #[test]
    fn working_session_window_is_end_exclusive() {
        let session = WorkingSession {
            id: 1,
            name: "Morning".into(),
            start_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            day_of_week: Some(Weekday::Mon),
            is_active: true,
        };
        assert!(session.contains(NaiveTime::from_hms_opt(7, 30, 0).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(11, 30, 0).unwrap()));
        assert!(session.applies_on(Weekday::Mon));
        assert!(!session.applies_on(Weekday::Tue));
        assert_eq!(session.window_label(), "Morning 07:30-11:30");
    }

    #[test]
    fn empty_display_profile_watches_everything() {
        let all = DisplayProfile {
            id: "lobby".into(),
            name: "Lobby".into(),
            rooms: vec![],
        };
        let some = DisplayProfile {
            rooms: vec![2],
            ..all.clone()
        };
        assert!(all.watches(7));
        assert!(some.watches(2));
        assert!(!some.watches(7));
    }
}
