// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use qdesk_core::types::{HealthStatus, RoomId, ServiceId, Ticket, TicketId, UserId};
use qdesk_core::QdeskError;
use qdesk_engine::{
    CallOutcome, DeskState, DisplayBoard, IssueRequest, IssuedTicket, QueueStatus, RecallOutcome,
    RoomOverview, TicketStatusView,
};

use crate::error::ApiError;
use crate::server::GatewayState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// Store detail when not healthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Query for POST /v1/rooms/{id}/call-next.
#[derive(Debug, Default, Deserialize)]
pub struct CallNextQuery {
    #[serde(default)]
    pub called_by: Option<UserId>,
}

/// Query for POST /v1/tickets/{id}/done.
#[derive(Debug, Default, Deserialize)]
pub struct DoneQuery {
    #[serde(default)]
    pub branch: Option<i64>,
}

/// Body for POST /v1/tickets/{id}/transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

/// Query for GET /v1/rooms.
#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub service_id: Option<ServiceId>,
}

/// GET /health
///
/// Liveness plus store health; 503 when the store is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (status, detail) = match state.engine.health().await {
        Ok(HealthStatus::Healthy) => ("ok", None),
        Ok(HealthStatus::Degraded(reason)) => ("degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => ("unhealthy", Some(reason)),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        detail,
    };
    (code, Json(body)).into_response()
}

/// POST /v1/tickets
pub async fn issue_ticket(
    State(state): State<GatewayState>,
    Json(request): Json<IssueRequest>,
) -> Result<(StatusCode, Json<IssuedTicket>), ApiError> {
    let issued = state.engine.issuer().issue(request).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// GET /v1/tickets/{number}/status
pub async fn ticket_status(
    State(state): State<GatewayState>,
    Path(number): Path<String>,
) -> ApiResult<TicketStatusView> {
    Ok(Json(state.engine.views().ticket_status(&number).await?))
}

/// POST /v1/tickets/{id}/serve
pub async fn start_serving(
    State(state): State<GatewayState>,
    Path(id): Path<TicketId>,
) -> ApiResult<Ticket> {
    Ok(Json(state.engine.desk().start_serving(id).await?))
}

/// POST /v1/tickets/{id}/pass
pub async fn pass(State(state): State<GatewayState>, Path(id): Path<TicketId>) -> ApiResult<Ticket> {
    Ok(Json(state.engine.desk().pass(id).await?))
}

/// POST /v1/tickets/{id}/done?branch=
pub async fn done(
    State(state): State<GatewayState>,
    Path(id): Path<TicketId>,
    Query(query): Query<DoneQuery>,
) -> ApiResult<Ticket> {
    Ok(Json(state.engine.desk().done(id, query.branch).await?))
}

/// POST /v1/tickets/{id}/return
pub async fn return_to_queue(
    State(state): State<GatewayState>,
    Path(id): Path<TicketId>,
) -> ApiResult<Ticket> {
    Ok(Json(state.engine.desk().return_to_queue(id).await?))
}

/// POST /v1/tickets/{id}/transfer
///
/// At least one of `service_id` and `room_id` is required.
pub async fn transfer(
    State(state): State<GatewayState>,
    Path(id): Path<TicketId>,
    Json(body): Json<TransferRequest>,
) -> ApiResult<Ticket> {
    if body.service_id.is_none() && body.room_id.is_none() {
        return Err(QdeskError::Rejected {
            message: "transfer needs a service_id or room_id".into(),
        }
        .into());
    }
    let ticket = state
        .engine
        .desk()
        .transfer(id, body.service_id, body.room_id)
        .await?;
    Ok(Json(ticket))
}

/// POST /v1/tickets/{id}/toggle-priority
pub async fn toggle_priority(
    State(state): State<GatewayState>,
    Path(id): Path<TicketId>,
) -> ApiResult<Ticket> {
    Ok(Json(state.engine.desk().toggle_priority(id).await?))
}

/// POST /v1/rooms/{id}/call-next?called_by=
///
/// 200 with the called ticket, 204 when nothing is waiting.
pub async fn call_next(
    State(state): State<GatewayState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<CallNextQuery>,
) -> Result<Response, ApiError> {
    match state.engine.desk().call_next(room_id, query.called_by).await? {
        CallOutcome::Called(ticket) => Ok(Json(ticket).into_response()),
        CallOutcome::QueueEmpty => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /v1/rooms/{id}/recall
pub async fn recall(
    State(state): State<GatewayState>,
    Path(room_id): Path<RoomId>,
) -> Result<Response, ApiError> {
    match state.engine.desk().recall(room_id).await? {
        RecallOutcome::Recalled(ticket) => Ok(Json(ticket).into_response()),
        RecallOutcome::NothingToRecall => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// GET /v1/rooms/{id}/desk
pub async fn desk_state(
    State(state): State<GatewayState>,
    Path(room_id): Path<RoomId>,
) -> ApiResult<DeskState> {
    Ok(Json(state.engine.views().desk_state(room_id).await?))
}

/// GET /v1/rooms/{id}/queue
pub async fn queue(
    State(state): State<GatewayState>,
    Path(room_id): Path<RoomId>,
) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.engine.views().queue(room_id).await?))
}

/// GET /v1/rooms/{id}/status
pub async fn queue_status(
    State(state): State<GatewayState>,
    Path(room_id): Path<RoomId>,
) -> ApiResult<QueueStatus> {
    Ok(Json(state.engine.views().queue_status(room_id).await?))
}

/// GET /v1/rooms?service_id=
pub async fn room_overview(
    State(state): State<GatewayState>,
    Query(query): Query<OverviewQuery>,
) -> ApiResult<Vec<RoomOverview>> {
    Ok(Json(state.engine.views().room_overview(query.service_id).await?))
}

/// GET /v1/displays/{id}
pub async fn display_board(
    State(state): State<GatewayState>,
    Path(profile_id): Path<String>,
) -> ApiResult<DisplayBoard> {
    Ok(Json(state.engine.views().display_board(&profile_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_request_accepts_either_target() {
        let req: TransferRequest = serde_json::from_str(r#"{"room_id": 11}"#).unwrap();
        assert_eq!(req.room_id, Some(11));
        assert!(req.service_id.is_none());
    }

    #[test]
    fn health_response_omits_detail_when_healthy() {
        let resp = HealthResponse {
            status: "ok",
            version: "0.1.0",
            uptime_secs: 42,
            detail: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(!json.contains("detail"));
    }
}
