// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket issuance: service and room resolution, working-hours gate,
//! numbering, and policy-driven placement.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use qdesk_core::types::{GateDecision, NewTicket, PriorityType, Room, RoomId, Service, TicketId};
use qdesk_core::{
    Clock, DeskEvent, QdeskError, QueueUpdated, RankPlacer, TicketStore, WorkingSessionGate,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::notify::Notifier;
use crate::policy::PriorityPolicy;
use crate::queue;
use crate::sequence::SequenceGenerator;

/// What a kiosk asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub service_code: String,
    #[serde(default)]
    pub priority_type: PriorityType,
    /// Explicit room; otherwise the least loaded active room of the service.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub kiosk_id: Option<String>,
}

impl IssueRequest {
    pub fn new(service_code: impl Into<String>, priority_type: PriorityType) -> Self {
        Self {
            service_code: service_code.into(),
            priority_type,
            room_id: None,
            kiosk_id: None,
        }
    }
}

/// The printed-slip view of a freshly issued ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedTicket {
    pub ticket_id: TicketId,
    pub number: String,
    pub service_code: String,
    pub service_name: String,
    pub room_id: RoomId,
    pub room_code: String,
    pub room_name: String,
    pub priority_type: PriorityType,
    /// Pending plus Calling tickets in the room, this one included.
    pub queue_position: u32,
    pub estimated_wait_minutes: u32,
    pub issued_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TicketIssuer {
    store: Arc<dyn TicketStore>,
    gate: Arc<dyn WorkingSessionGate>,
    clock: Arc<dyn Clock>,
    sequences: SequenceGenerator,
    policy: PriorityPolicy,
    notifier: Notifier,
    estimate_minutes_per_ticket: u32,
}

impl TicketIssuer {
    pub(crate) fn new(
        store: Arc<dyn TicketStore>,
        gate: Arc<dyn WorkingSessionGate>,
        clock: Arc<dyn Clock>,
        policy: PriorityPolicy,
        notifier: Notifier,
        estimate_minutes_per_ticket: u32,
    ) -> Self {
        Self {
            sequences: SequenceGenerator::new(Arc::clone(&store)),
            store,
            gate,
            clock,
            policy,
            notifier,
            estimate_minutes_per_ticket,
        }
    }

    pub async fn issue(&self, request: IssueRequest) -> Result<IssuedTicket, QdeskError> {
        let now = self.clock.now();
        let today = self.clock.day_of(now);

        let service = self
            .store
            .service_by_code(&request.service_code)
            .await?
            .ok_or_else(|| QdeskError::not_found("service", &request.service_code))?;
        if !service.is_active {
            return Err(QdeskError::Rejected {
                message: format!("service {} is not active", service.code),
            });
        }
        let room = self.pick_room(&service, request.room_id, today).await?;

        if let GateDecision::Closed { windows } = self.gate.check(now).await? {
            return Err(QdeskError::OutsideWorkingHours { windows });
        }

        let priority_type = request.priority_type;
        let number = self.sequences.next_for(&service, today, priority_type).await?;
        let policy = self.policy.resolve(room.id, service.id).await?;
        let placer: RankPlacer =
            Box::new(move |pending| queue::place(&policy, priority_type, pending, now));
        let ticket = self
            .store
            .append(
                NewTicket {
                    number: number.to_string(),
                    service_id: service.id,
                    room_id: room.id,
                    priority_type,
                    issued_date: today,
                    issued_at: now,
                    kiosk_id: request.kiosk_id,
                },
                placer,
            )
            .await?;

        let queue_position = self.store.count_active(room.id, today).await?;
        info!(
            number = %ticket.number,
            room_id = room.id,
            %priority_type,
            queue_position,
            "ticket issued"
        );
        self.notifier
            .send(DeskEvent::QueueUpdated(QueueUpdated {
                room_id: room.id,
                room_code: room.code.clone(),
                queue_size: queue_position,
                affected_numbers: vec![ticket.number.clone()],
            }))
            .await;

        Ok(IssuedTicket {
            ticket_id: ticket.id,
            number: ticket.number,
            service_code: service.code,
            service_name: service.name,
            room_id: room.id,
            room_code: room.code,
            room_name: room.name,
            priority_type,
            queue_position,
            estimated_wait_minutes: queue_position.saturating_mul(self.estimate_minutes_per_ticket),
            issued_at: ticket.issued_at,
        })
    }

    async fn pick_room(
        &self,
        service: &Service,
        room_id: Option<RoomId>,
        today: NaiveDate,
    ) -> Result<Room, QdeskError> {
        let Some(room_id) = room_id else {
            return self
                .store
                .least_loaded_room(service.id, today)
                .await?
                .ok_or_else(|| QdeskError::Rejected {
                    message: format!("service {} has no active room", service.code),
                });
        };

        let room = self
            .store
            .room(room_id)
            .await?
            .ok_or_else(|| QdeskError::not_found("room", room_id))?;
        if !room.is_active {
            return Err(QdeskError::Rejected {
                message: format!("room {} is not active", room.code),
            });
        }
        if room.service_id != service.id {
            return Err(QdeskError::Rejected {
                message: format!("room {} does not serve {}", room.code, service.code),
            });
        }
        Ok(room)
    }
}
