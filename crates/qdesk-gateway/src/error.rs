// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of engine errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use qdesk_core::QdeskError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Machine-readable class, e.g. `conflict`.
    pub kind: &'static str,
    /// Today's working windows when issuance was refused for the hour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows: Option<Vec<String>>,
}

/// A [`QdeskError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub QdeskError);

impl From<QdeskError> for ApiError {
    fn from(err: QdeskError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            QdeskError::NotFound { .. } => StatusCode::NOT_FOUND,
            QdeskError::Conflict { .. } => StatusCode::CONFLICT,
            QdeskError::Rejected { .. } | QdeskError::OutsideWorkingHours { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match &self.0 {
            QdeskError::NotFound { .. } => "not_found",
            QdeskError::Conflict { .. } => "conflict",
            QdeskError::Rejected { .. } => "rejected",
            QdeskError::OutsideWorkingHours { .. } => "outside_working_hours",
            _ => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let windows = match &self.0 {
            QdeskError::OutsideWorkingHours { windows } => Some(windows.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            // Server-side details stay in the log.
            error: if status.is_server_error() {
                "internal error".to_string()
            } else {
                self.0.to_string()
            },
            kind: self.kind(),
            windows,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (QdeskError::not_found("ticket", 7), StatusCode::NOT_FOUND),
            (QdeskError::conflict("busy"), StatusCode::CONFLICT),
            (
                QdeskError::Rejected {
                    message: "inactive".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                QdeskError::OutsideWorkingHours { windows: vec![] },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                QdeskError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn error_body_skips_absent_windows() {
        let body = ErrorResponse {
            error: "room XN1 is busy".into(),
            kind: "conflict",
            windows: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"room XN1 is busy","kind":"conflict"}"#);
    }
}
