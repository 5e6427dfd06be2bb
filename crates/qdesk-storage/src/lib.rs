// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for qdesk.
//!
//! WAL-mode SQLite with embedded refinery migrations, a single-writer model
//! via `tokio-rusqlite`, and the [`SqliteTicketStore`] implementation of
//! [`qdesk_core::TicketStore`]. Claims and appends run inside IMMEDIATE
//! transactions; a partial unique index backs the one-active-ticket rule.

pub mod adapter;
pub mod codec;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteTicketStore;
pub use database::Database;
