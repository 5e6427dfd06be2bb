// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway over the qdesk engine.
//!
//! REST routes under `/v1` drive issuance and the calling desk; `/ws`
//! streams bus events to displays and dashboards.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{router, start_server, GatewayState, ServerConfig};
