// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Working-hours gate for ticket issuance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::QdeskError;
use crate::types::GateDecision;

/// Decides whether tickets may be issued at a given instant.
#[async_trait]
pub trait WorkingSessionGate: Send + Sync + 'static {
    async fn check(&self, at: DateTime<Utc>) -> Result<GateDecision, QdeskError>;
}
