// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event fan-out for qdesk.
//!
//! [`EventBus`] implements [`qdesk_core::NotificationPublisher`] over tokio
//! broadcast channels keyed by [`Channel`]: a room, a ticket number, the
//! dashboard, all rooms, or a configured display profile.

pub mod bus;
pub mod channel;

pub use bus::EventBus;
pub use channel::Channel;
