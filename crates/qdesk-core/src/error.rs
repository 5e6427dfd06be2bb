// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the qdesk ticket queue.

use thiserror::Error;

/// The primary error type used across the store, engine and gateway.
///
/// An empty queue is not an error: call-next and recall report it through
/// their outcome types instead.
#[derive(Debug, Error)]
pub enum QdeskError {
    /// Configuration errors (invalid TOML, broken catalog references).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, corrupt row).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced ticket, room or service does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The operation is not valid in the current state, e.g. calling while a
    /// ticket is already active in the room.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The request was understood but cannot be honored (inactive service or room).
    #[error("rejected: {message}")]
    Rejected { message: String },

    /// Ticket issuance attempted outside every configured working session.
    #[error("outside working hours (open: {})", windows.join(", "))]
    OutsideWorkingHours { windows: Vec<String> },

    /// A notification could not be delivered.
    #[error("notification error: {message}")]
    Notification { message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QdeskError {
    /// Shorthand for a [`QdeskError::NotFound`] keyed by anything displayable.
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`QdeskError::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}
