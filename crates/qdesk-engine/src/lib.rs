// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The qdesk ticket queue and calling-desk engine.
//!
//! - [`SequenceGenerator`]: daily per-service ticket numbers
//! - [`policy`]: Strict or Interleaved ordering by room/service/global specificity
//! - [`queue`]: rank placement at issuance and next-ticket selection
//! - [`CallingDesk`]: the ticket state machine and the one-active-ticket rule
//! - [`TicketIssuer`], [`ScheduleGate`] and the [`QueueViews`] read models
//!
//! The engine never touches SQL; it runs against [`qdesk_core::TicketStore`]
//! and publishes through [`qdesk_core::NotificationPublisher`].

pub mod desk;
pub mod engine;
pub mod gate;
pub mod issuer;
mod notify;
pub mod policy;
pub mod queue;
pub mod sequence;
pub mod settings;
pub mod views;

pub use desk::{CallOutcome, CallingDesk, RecallOutcome};
pub use engine::Engine;
pub use gate::ScheduleGate;
pub use issuer::{IssueRequest, IssuedTicket, TicketIssuer};
pub use policy::{PriorityPolicy, ResolvedPolicy};
pub use sequence::SequenceGenerator;
pub use settings::EngineSettings;
pub use views::{
    BoardRoom, DeskState, DeskTotals, DisplayBoard, QueueStatus, QueueViews, RoomOverview,
    TicketStatusView,
};
