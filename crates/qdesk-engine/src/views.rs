// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read models for desks, kiosks, dashboards and wall displays.
//!
//! All views cover the current queue day only.

use std::sync::Arc;

use qdesk_core::types::{
    DisplayProfile, PriorityType, Room, RoomId, ServiceId, Ticket, TicketId, TicketNumber,
    TicketStatus,
};
use qdesk_core::{Clock, QdeskError, TicketStore};
use serde::Serialize;

use crate::policy::PriorityPolicy;
use crate::queue;

/// Upcoming numbers shown per room on a display board.
const BOARD_NEXT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeskTotals {
    pub waiting: u32,
    pub done: u32,
    pub passed: u32,
}

/// Everything a calling desk shows for its room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskState {
    pub room: Room,
    pub current: Option<Ticket>,
    /// Pending tickets in display order.
    pub waiting: Vec<Ticket>,
    /// Most recently completed first.
    pub passed: Vec<Ticket>,
    pub done: Vec<Ticket>,
    pub totals: DeskTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatus {
    pub room_id: RoomId,
    pub room_code: String,
    pub waiting: u32,
    pub waiting_normal: u32,
    pub waiting_priority: u32,
    /// Mean wait of today's called tickets, in minutes.
    pub average_wait_minutes: f64,
    pub current: Option<Ticket>,
}

/// What a visitor sees when looking up their number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketStatusView {
    pub ticket_id: TicketId,
    pub number: String,
    pub status: TicketStatus,
    pub room_id: RoomId,
    /// 1-based position in the room's waiting order; 0 unless Pending.
    pub queue_position: u32,
    pub estimated_wait_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoomOverview {
    pub room_id: RoomId,
    pub room_code: String,
    pub room_name: String,
    pub service_id: ServiceId,
    pub pending: u32,
    pub calling: u32,
    pub serving: u32,
    pub done: u32,
    pub passed: u32,
    pub waiting_normal: u32,
    pub waiting_priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRoom {
    pub room_id: RoomId,
    pub room_code: String,
    pub room_name: String,
    pub current: Option<String>,
    pub next: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayBoard {
    pub profile_id: String,
    pub name: String,
    pub rooms: Vec<BoardRoom>,
}

#[derive(Clone)]
pub struct QueueViews {
    store: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    policy: PriorityPolicy,
    displays: Arc<Vec<DisplayProfile>>,
    estimate_minutes_per_ticket: u32,
}

impl QueueViews {
    pub(crate) fn new(
        store: Arc<dyn TicketStore>,
        clock: Arc<dyn Clock>,
        policy: PriorityPolicy,
        displays: Vec<DisplayProfile>,
        estimate_minutes_per_ticket: u32,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            displays: Arc::new(displays),
            estimate_minutes_per_ticket,
        }
    }

    pub async fn desk_state(&self, room_id: RoomId) -> Result<DeskState, QdeskError> {
        let room = self.room(room_id).await?;
        let tickets = self
            .store
            .tickets_for_room(room.id, self.clock.today())
            .await?;

        let mut current = None;
        let mut pending = Vec::new();
        let mut passed = Vec::new();
        let mut done = Vec::new();
        for ticket in tickets {
            match ticket.status {
                TicketStatus::Calling | TicketStatus::Serving => current = Some(ticket),
                TicketStatus::Pending => pending.push(ticket),
                TicketStatus::Passed => passed.push(ticket),
                TicketStatus::Done => done.push(ticket),
                TicketStatus::Cancelled => {}
            }
        }
        passed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        done.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        let waiting = self.ordered(&room, pending).await?;

        let totals = DeskTotals {
            waiting: count(waiting.len()),
            done: count(done.len()),
            passed: count(passed.len()),
        };
        Ok(DeskState {
            room,
            current,
            waiting,
            passed,
            done,
            totals,
        })
    }

    /// Pending tickets of the room in display order.
    pub async fn queue(&self, room_id: RoomId) -> Result<Vec<Ticket>, QdeskError> {
        let room = self.room(room_id).await?;
        let pending = self
            .store
            .find_pending_by_room(room.id, self.clock.today())
            .await?;
        self.ordered(&room, pending).await
    }

    pub async fn current(&self, room_id: RoomId) -> Result<Option<Ticket>, QdeskError> {
        let room = self.room(room_id).await?;
        self.store.find_current(room.id, self.clock.today()).await
    }

    pub async fn queue_status(&self, room_id: RoomId) -> Result<QueueStatus, QdeskError> {
        let room = self.room(room_id).await?;
        let tickets = self
            .store
            .tickets_for_room(room.id, self.clock.today())
            .await?;

        let pending = tickets.iter().filter(|t| t.status == TicketStatus::Pending);
        let waiting_priority = count(
            pending
                .clone()
                .filter(|t| t.priority_type == PriorityType::Priority)
                .count(),
        );
        let waiting = count(pending.count());
        let waits: Vec<i64> = tickets.iter().filter_map(|t| t.wait_time_seconds).collect();
        let average_wait_minutes = if waits.is_empty() {
            0.0
        } else {
            let mean_seconds = waits.iter().sum::<i64>() as f64 / waits.len() as f64;
            (mean_seconds / 60.0 * 10.0).round() / 10.0
        };

        Ok(QueueStatus {
            room_id: room.id,
            room_code: room.code,
            waiting,
            waiting_normal: waiting - waiting_priority,
            waiting_priority,
            average_wait_minutes,
            current: tickets.into_iter().find(|t| t.status.is_active()),
        })
    }

    /// Today's ticket by its printed number.
    pub async fn ticket_status(&self, number: &str) -> Result<TicketStatusView, QdeskError> {
        let number: TicketNumber = number.parse()?;
        let number = number.to_string();
        let ticket = self
            .store
            .ticket_by_number(&number, self.clock.today())
            .await?
            .ok_or_else(|| QdeskError::not_found("ticket", &number))?;

        let queue_position = if ticket.status == TicketStatus::Pending {
            let room = self.room(ticket.room_id).await?;
            let pending = self
                .store
                .find_pending_by_room(room.id, ticket.issued_date)
                .await?;
            self.ordered(&room, pending)
                .await?
                .iter()
                .position(|t| t.id == ticket.id)
                .map_or(0, |i| count(i + 1))
        } else {
            0
        };

        Ok(TicketStatusView {
            ticket_id: ticket.id,
            number: ticket.number,
            status: ticket.status,
            room_id: ticket.room_id,
            queue_position,
            estimated_wait_minutes: queue_position.saturating_mul(self.estimate_minutes_per_ticket),
        })
    }

    /// Per-room counters for active rooms, optionally for one service.
    pub async fn room_overview(
        &self,
        service_id: Option<ServiceId>,
    ) -> Result<Vec<RoomOverview>, QdeskError> {
        let today = self.clock.today();
        let mut overview = Vec::new();
        for room in self.store.rooms(service_id).await? {
            if !room.is_active {
                continue;
            }
            let mut entry = RoomOverview {
                room_id: room.id,
                room_code: room.code,
                room_name: room.name,
                service_id: room.service_id,
                ..RoomOverview::default()
            };
            for ticket in self.store.tickets_for_room(room.id, today).await? {
                match ticket.status {
                    TicketStatus::Pending => {
                        entry.pending += 1;
                        match ticket.priority_type {
                            PriorityType::Normal => entry.waiting_normal += 1,
                            PriorityType::Priority => entry.waiting_priority += 1,
                        }
                    }
                    TicketStatus::Calling => entry.calling += 1,
                    TicketStatus::Serving => entry.serving += 1,
                    TicketStatus::Done => entry.done += 1,
                    TicketStatus::Passed => entry.passed += 1,
                    TicketStatus::Cancelled => {}
                }
            }
            overview.push(entry);
        }
        Ok(overview)
    }

    /// Current and upcoming numbers for each room a display watches.
    pub async fn display_board(&self, profile_id: &str) -> Result<DisplayBoard, QdeskError> {
        let profile = self
            .displays
            .iter()
            .find(|d| d.id == profile_id)
            .ok_or_else(|| QdeskError::not_found("display", profile_id))?;

        let today = self.clock.today();
        let mut rooms = Vec::new();
        for room in self.store.rooms(None).await? {
            if !room.is_active || !profile.watches(room.id) {
                continue;
            }
            let current = self.store.find_current(room.id, today).await?;
            let pending = self.store.find_pending_by_room(room.id, today).await?;
            let next = self
                .ordered(&room, pending)
                .await?
                .into_iter()
                .take(BOARD_NEXT)
                .map(|t| t.number)
                .collect();
            rooms.push(BoardRoom {
                room_id: room.id,
                room_code: room.code,
                room_name: room.name,
                current: current.map(|t| t.number),
                next,
            });
        }

        Ok(DisplayBoard {
            profile_id: profile.id.clone(),
            name: profile.name.clone(),
            rooms,
        })
    }

    async fn room(&self, room_id: RoomId) -> Result<Room, QdeskError> {
        self.store
            .room(room_id)
            .await?
            .ok_or_else(|| QdeskError::not_found("room", room_id))
    }

    async fn ordered(&self, room: &Room, pending: Vec<Ticket>) -> Result<Vec<Ticket>, QdeskError> {
        let policy = self.policy.resolve(room.id, room.service_id).await?;
        Ok(queue::waiting_order(pending, policy.strategy))
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
