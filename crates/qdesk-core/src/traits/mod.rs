// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the engine is written against.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod gate;
pub mod publisher;
pub mod store;

pub use gate::WorkingSessionGate;
pub use publisher::NotificationPublisher;
pub use store::{RankPlacer, TicketSelector, TicketStore};
