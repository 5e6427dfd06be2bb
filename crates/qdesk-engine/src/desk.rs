// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calling-desk state machine.
//!
//! `Pending -> Calling -> Serving -> {Done, Passed}`, with Recall refreshing
//! the current call and ReturnToQueue/Transfer forcing a fresh Pending state.
//! A room has at most one Calling or Serving ticket per queue day; CallNext
//! claims atomically through the store so concurrent desks cannot both win.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use qdesk_core::types::{
    ClaimOutcome, ClaimRequest, Room, RoomId, ServiceId, Ticket, TicketId, TicketNumber,
    TicketStatus, UserId,
};
use qdesk_core::{
    CallAction, Clock, DeskEvent, QdeskError, QueueUpdated, TicketCalled, TicketSelector,
    TicketStatusChanged, TicketStore,
};
use tracing::{debug, info, warn};

use crate::notify::Notifier;
use crate::policy::PriorityPolicy;
use crate::queue;

/// Result of [`CallingDesk::call_next`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Called(Ticket),
    /// Nothing was pending; not an error.
    QueueEmpty,
}

/// Result of [`CallingDesk::recall`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecallOutcome {
    Recalled(Ticket),
    NothingToRecall,
}

/// The only component that changes ticket status and timing fields.
#[derive(Clone)]
pub struct CallingDesk {
    store: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    policy: PriorityPolicy,
    notifier: Notifier,
    interleave_window: chrono::Duration,
}

impl CallingDesk {
    pub(crate) fn new(
        store: Arc<dyn TicketStore>,
        clock: Arc<dyn Clock>,
        policy: PriorityPolicy,
        notifier: Notifier,
        interleave_window: chrono::Duration,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            notifier,
            interleave_window,
        }
    }

    /// Calls the next ticket of `room_id` per its priority policy.
    ///
    /// Fails with `Conflict` while the room has a Calling or Serving ticket.
    pub async fn call_next(
        &self,
        room_id: RoomId,
        called_by: Option<UserId>,
    ) -> Result<CallOutcome, QdeskError> {
        let room = self.room(room_id).await?;
        let now = self.clock.now();
        let policy = self.policy.resolve(room.id, room.service_id).await?;
        let request = ClaimRequest {
            room_id,
            date: self.clock.day_of(now),
            now,
            window_start: now - self.interleave_window,
            called_by,
        };
        let selector: TicketSelector =
            Box::new(move |snapshot| queue::select_next(&policy, snapshot));

        match self.store.claim_next(request, selector).await? {
            ClaimOutcome::Busy(current) => Err(QdeskError::conflict(format!(
                "room {} is still handling ticket {}",
                room.code, current.number
            ))),
            ClaimOutcome::Empty => {
                debug!(room_id, "call-next on empty queue");
                Ok(CallOutcome::QueueEmpty)
            }
            ClaimOutcome::Claimed(ticket) => {
                info!(room_id, number = %ticket.number, ticket_id = ticket.id, "ticket called");
                self.publish_called(&ticket, &room, CallAction::Call).await;
                Ok(CallOutcome::Called(ticket))
            }
        }
    }

    /// Re-announces the room's current ticket and refreshes its `called_at`.
    pub async fn recall(&self, room_id: RoomId) -> Result<RecallOutcome, QdeskError> {
        let room = self.room(room_id).await?;
        let now = self.clock.now();
        let Some(mut ticket) = self.store.find_current(room_id, self.clock.day_of(now)).await?
        else {
            return Ok(RecallOutcome::NothingToRecall);
        };

        ticket.called_at = Some(now);
        self.store.update(&ticket, ticket.status).await?;
        info!(room_id, number = %ticket.number, "ticket recalled");
        self.publish_called(&ticket, &room, CallAction::Recall).await;
        Ok(RecallOutcome::Recalled(ticket))
    }

    /// Calling to Serving.
    pub async fn start_serving(&self, ticket_id: TicketId) -> Result<Ticket, QdeskError> {
        let mut ticket = self.ticket(ticket_id).await?;
        if ticket.status != TicketStatus::Calling {
            return Err(QdeskError::conflict(format!(
                "ticket {} is {}, only a calling ticket can start serving",
                ticket.number, ticket.status
            )));
        }
        let room = self.room(ticket.room_id).await?;

        ticket.status = TicketStatus::Serving;
        ticket.serving_at = Some(self.clock.now());
        self.store.update(&ticket, TicketStatus::Calling).await?;
        info!(number = %ticket.number, room_id = room.id, "serving started");
        self.publish_status(&ticket, TicketStatus::Calling, &room).await;
        Ok(ticket)
    }

    /// Marks the ticket Passed (the visitor did not show up).
    pub async fn pass(&self, ticket_id: TicketId) -> Result<Ticket, QdeskError> {
        let mut ticket = self.ticket(ticket_id).await?;
        let old_status = require_open(&ticket, "pass")?;
        let room = self.room(ticket.room_id).await?;

        ticket.status = TicketStatus::Passed;
        ticket.completed_at = Some(self.clock.now());
        self.store.update(&ticket, old_status).await?;
        info!(number = %ticket.number, room_id = room.id, "ticket passed");
        self.publish_status(&ticket, old_status, &room).await;
        Ok(ticket)
    }

    /// Completes the ticket, recording the post-process branch if given.
    pub async fn done(
        &self,
        ticket_id: TicketId,
        post_process_branch_id: Option<i64>,
    ) -> Result<Ticket, QdeskError> {
        let mut ticket = self.ticket(ticket_id).await?;
        let old_status = require_open(&ticket, "complete")?;
        let room = self.room(ticket.room_id).await?;
        let now = self.clock.now();

        ticket.status = TicketStatus::Done;
        ticket.completed_at = Some(now);
        if post_process_branch_id.is_some() {
            ticket.post_process_branch_id = post_process_branch_id;
        }
        ticket.service_time_seconds = ticket.serving_at.map(|s| seconds_between(s, now));
        self.store.update(&ticket, old_status).await?;
        info!(
            number = %ticket.number,
            room_id = room.id,
            service_time_seconds = ?ticket.service_time_seconds,
            "ticket done"
        );
        self.publish_status(&ticket, old_status, &room).await;
        Ok(ticket)
    }

    /// Puts the ticket back at the end of its room's queue for today.
    pub async fn return_to_queue(&self, ticket_id: TicketId) -> Result<Ticket, QdeskError> {
        let ticket = self.ticket(ticket_id).await?;
        let old_status = require_not_cancelled(&ticket, "return to the queue")?;
        let room = self.room(ticket.room_id).await?;
        let now = self.clock.now();
        let today = self.clock.day_of(now);

        let ticket = self.requeue(ticket, old_status, room.id, today, now).await?;
        info!(number = %ticket.number, room_id = room.id, %old_status, "ticket returned to queue");
        self.publish_status(&ticket, old_status, &room).await;
        self.publish_queue(&room, today, &ticket.number).await;
        Ok(ticket)
    }

    /// Moves the ticket to another service and/or room as a fresh Pending ticket.
    pub async fn transfer(
        &self,
        ticket_id: TicketId,
        target_service_id: Option<ServiceId>,
        target_room_id: Option<RoomId>,
    ) -> Result<Ticket, QdeskError> {
        let mut ticket = self.ticket(ticket_id).await?;
        let old_status = require_not_cancelled(&ticket, "transfer")?;
        let old_room = self.room(ticket.room_id).await?;
        if let Some(service_id) = target_service_id {
            self.store
                .service(service_id)
                .await?
                .ok_or_else(|| QdeskError::not_found("service", service_id))?;
            ticket.service_id = service_id;
        }
        let target_room = match target_room_id {
            Some(room_id) => self.room(room_id).await?,
            None => old_room.clone(),
        };
        let now = self.clock.now();
        let today = self.clock.day_of(now);

        let ticket = self.requeue(ticket, old_status, target_room.id, today, now).await?;
        info!(
            number = %ticket.number,
            from_room = old_room.id,
            to_room = target_room.id,
            "ticket transferred"
        );
        self.publish_status(&ticket, old_status, &old_room).await;
        self.publish_queue(&target_room, today, &ticket.number).await;
        Ok(ticket)
    }

    /// Flips Normal/Priority without touching status or rank.
    pub async fn toggle_priority(&self, ticket_id: TicketId) -> Result<Ticket, QdeskError> {
        let mut ticket = self.ticket(ticket_id).await?;
        let room = self.room(ticket.room_id).await?;

        ticket.priority_type = ticket.priority_type.toggled();
        self.store.update(&ticket, ticket.status).await?;
        info!(number = %ticket.number, priority_type = %ticket.priority_type, "priority toggled");
        self.publish_queue(&room, ticket.issued_date, &ticket.number).await;
        Ok(ticket)
    }

    /// Resets the ticket to Pending at the back of `room_id`'s queue for
    /// `today`. A ticket from an earlier day is renumbered from today's
    /// sequence so it cannot collide with tickets issued later today.
    async fn requeue(
        &self,
        mut ticket: Ticket,
        old_status: TicketStatus,
        room_id: RoomId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Ticket, QdeskError> {
        let carried_over = ticket.issued_date != today;
        ticket.requeue(room_id, today, now);
        if !carried_over {
            self.store.update(&ticket, old_status).await?;
            return Ok(ticket);
        }

        let service = self
            .store
            .service(ticket.service_id)
            .await?
            .ok_or_else(|| QdeskError::not_found("service", ticket.service_id))?;
        let previous = ticket.number.clone();
        let ticket = self.store.carry_over(&ticket, old_status, &service.code).await?;
        debug!(from = %previous, to = %ticket.number, "carried-over ticket renumbered");
        Ok(ticket)
    }

    async fn ticket(&self, ticket_id: TicketId) -> Result<Ticket, QdeskError> {
        self.store
            .ticket(ticket_id)
            .await?
            .ok_or_else(|| QdeskError::not_found("ticket", ticket_id))
    }

    async fn room(&self, room_id: RoomId) -> Result<Room, QdeskError> {
        self.store
            .room(room_id)
            .await?
            .ok_or_else(|| QdeskError::not_found("room", room_id))
    }

    // --- Publishing, after commit; failures never reach the caller ---

    async fn publish_called(&self, ticket: &Ticket, room: &Room, action: CallAction) {
        let service_code = match self.store.service(ticket.service_id).await {
            Ok(Some(service)) => service.code,
            other => {
                if let Err(e) = other {
                    warn!(ticket_id = ticket.id, error = %e, "service lookup for event failed");
                }
                ticket
                    .number
                    .parse::<TicketNumber>()
                    .map(|n| n.prefix)
                    .unwrap_or_default()
            }
        };
        self.notifier
            .send(DeskEvent::TicketCalled(TicketCalled {
                ticket_id: ticket.id,
                number: ticket.number.clone(),
                room_id: room.id,
                room_code: room.code.clone(),
                room_name: room.name.clone(),
                service_code,
                priority_type: ticket.priority_type,
                action,
            }))
            .await;
    }

    async fn publish_status(&self, ticket: &Ticket, old_status: TicketStatus, room: &Room) {
        self.notifier
            .send(DeskEvent::TicketStatusChanged(TicketStatusChanged {
                ticket_id: ticket.id,
                number: ticket.number.clone(),
                old_status,
                new_status: ticket.status,
                room_id: room.id,
                room_code: room.code.clone(),
            }))
            .await;
    }

    async fn publish_queue(&self, room: &Room, date: NaiveDate, number: &str) {
        let queue_size = match self.store.count_active(room.id, date).await {
            Ok(size) => size,
            Err(e) => {
                warn!(room_id = room.id, error = %e, "queue size for event failed");
                0
            }
        };
        self.notifier
            .send(DeskEvent::QueueUpdated(QueueUpdated {
                room_id: room.id,
                room_code: room.code.clone(),
                queue_size,
                affected_numbers: vec![number.to_string()],
            }))
            .await;
    }
}

/// Pass and Done need a ticket that is still in play.
fn require_open(ticket: &Ticket, action: &str) -> Result<TicketStatus, QdeskError> {
    if ticket.status.is_terminal() {
        return Err(QdeskError::conflict(format!(
            "cannot {action} ticket {}: it is already {}",
            ticket.number, ticket.status
        )));
    }
    Ok(ticket.status)
}

fn require_not_cancelled(ticket: &Ticket, action: &str) -> Result<TicketStatus, QdeskError> {
    if ticket.status == TicketStatus::Cancelled {
        return Err(QdeskError::conflict(format!(
            "cannot {action} cancelled ticket {}",
            ticket.number
        )));
    }
    Ok(ticket.status)
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0)
}
