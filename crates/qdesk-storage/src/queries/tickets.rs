// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket reads, writes and the atomic claim.

use chrono::{DateTime, NaiveDate, Utc};
use qdesk_core::types::{
    ClaimOutcome, ClaimRequest, NewTicket, PriorityType, QueueSnapshot, RoomId, Ticket, TicketId,
    TicketNumber, TicketStatus,
};
use qdesk_core::{QdeskError, RankPlacer, TicketSelector};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::warn;

use crate::codec;
use crate::database::{Database, Guarded, guard, map_tr_err};
use crate::queries::sequences;

const TICKET_COLUMNS: &str = "id, number, service_id, room_id, priority_type, status, queue_rank, \
     issued_date, issued_at, called_at, serving_at, completed_at, wait_time_seconds, \
     service_time_seconds, called_by_user_id, post_process_branch_id, kiosk_id";

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        number: row.get(1)?,
        service_id: row.get(2)?,
        room_id: row.get(3)?,
        priority_type: codec::get_enum(row, 4)?,
        status: codec::get_enum(row, 5)?,
        queue_rank: codec::get_rank(row, 6)?,
        issued_date: codec::get_date(row, 7)?,
        issued_at: codec::get_timestamp(row, 8)?,
        called_at: codec::get_opt_timestamp(row, 9)?,
        serving_at: codec::get_opt_timestamp(row, 10)?,
        completed_at: codec::get_opt_timestamp(row, 11)?,
        wait_time_seconds: row.get(12)?,
        service_time_seconds: row.get(13)?,
        called_by_user_id: row.get(14)?,
        post_process_branch_id: row.get(15)?,
        kiosk_id: row.get(16)?,
    })
}

// --- Connection-level helpers, usable inside a transaction ---

fn pending_in(conn: &Connection, room_id: RoomId, date: NaiveDate) -> rusqlite::Result<Vec<Ticket>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets
         WHERE room_id = ?1 AND issued_date = ?2 AND status = 'pending'
         ORDER BY queue_rank ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![room_id, codec::date(&date)], ticket_from_row)?;
    rows.collect()
}

fn current_in(conn: &Connection, room_id: RoomId, date: NaiveDate) -> rusqlite::Result<Option<Ticket>> {
    conn.query_row(
        &format!(
            "SELECT {TICKET_COLUMNS} FROM tickets
             WHERE room_id = ?1 AND issued_date = ?2 AND status IN ('calling', 'serving')
             ORDER BY id DESC LIMIT 1"
        ),
        params![room_id, codec::date(&date)],
        ticket_from_row,
    )
    .optional()
}

fn completed_in(
    conn: &Connection,
    room_id: RoomId,
    date: NaiveDate,
    since: &DateTime<Utc>,
    status: TicketStatus,
    priority_type: Option<PriorityType>,
) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM tickets
         WHERE room_id = ?1 AND issued_date = ?2 AND status = ?3
           AND completed_at >= ?4
           AND (?5 IS NULL OR priority_type = ?5)",
        params![
            room_id,
            codec::date(&date),
            status.to_string(),
            codec::timestamp(since),
            priority_type.map(|p| p.to_string()),
        ],
        |row| row.get(0),
    )
}

fn by_id_in(conn: &Connection, id: TicketId) -> rusqlite::Result<Option<Ticket>> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
        params![id],
        ticket_from_row,
    )
    .optional()
}

/// Writes every mutable column of `ticket` if its stored status is still
/// `expected`, returning the number of rows changed.
fn write_in(conn: &Connection, ticket: &Ticket, expected: TicketStatus) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tickets SET
            service_id = ?2, room_id = ?3, priority_type = ?4, status = ?5, queue_rank = ?6,
            issued_date = ?7, issued_at = ?8, called_at = ?9, serving_at = ?10,
            completed_at = ?11, wait_time_seconds = ?12, service_time_seconds = ?13,
            called_by_user_id = ?14, post_process_branch_id = ?15, number = ?16
         WHERE id = ?1 AND status = ?17",
        params![
            ticket.id,
            ticket.service_id,
            ticket.room_id,
            ticket.priority_type.to_string(),
            ticket.status.to_string(),
            ticket.queue_rank.encode(),
            codec::date(&ticket.issued_date),
            codec::timestamp(&ticket.issued_at),
            codec::opt_timestamp(&ticket.called_at),
            codec::opt_timestamp(&ticket.serving_at),
            codec::opt_timestamp(&ticket.completed_at),
            ticket.wait_time_seconds,
            ticket.service_time_seconds,
            ticket.called_by_user_id,
            ticket.post_process_branch_id,
            ticket.number,
            expected.to_string(),
        ],
    )
}

/// Outcome of a status-checked write.
enum Written {
    Applied(Ticket),
    Missing,
    Stale(TicketStatus),
}

impl Written {
    fn into_result(self, ticket_id: TicketId, expected: TicketStatus) -> Result<Ticket, QdeskError> {
        match self {
            Written::Applied(ticket) => Ok(ticket),
            Written::Missing => Err(QdeskError::not_found("ticket", ticket_id)),
            Written::Stale(status) => Err(QdeskError::conflict(format!(
                "ticket {ticket_id} is now {status}, expected {expected}"
            ))),
        }
    }
}

/// Tells a missing row from one whose status moved on since it was read.
fn classify_miss(conn: &Connection, ticket_id: TicketId) -> rusqlite::Result<Written> {
    Ok(match by_id_in(conn, ticket_id)? {
        Some(stored) => Written::Stale(stored.status),
        None => Written::Missing,
    })
}

// --- Async operations ---

/// Pending tickets of a room, ascending by rank.
pub async fn find_pending_by_room(
    db: &Database,
    room_id: RoomId,
    date: NaiveDate,
) -> Result<Vec<Ticket>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Ticket>, rusqlite::Error> {
            pending_in(conn, room_id, date)
        })
        .await
        .map_err(map_tr_err)
}

/// The Calling or Serving ticket of a room.
pub async fn find_current(
    db: &Database,
    room_id: RoomId,
    date: NaiveDate,
) -> Result<Option<Ticket>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Option<Ticket>, rusqlite::Error> {
            current_in(conn, room_id, date)
        })
        .await
        .map_err(map_tr_err)
}

/// Pending plus Calling tickets of a room.
pub async fn count_active(db: &Database, room_id: RoomId, date: NaiveDate) -> Result<u32, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<u32, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM tickets
                 WHERE room_id = ?1 AND issued_date = ?2 AND status IN ('pending', 'calling')",
                params![room_id, codec::date(&date)],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Tickets completed with `status` at or after `since`.
pub async fn count_completed_since(
    db: &Database,
    room_id: RoomId,
    date: NaiveDate,
    since: DateTime<Utc>,
    status: TicketStatus,
    priority_type: Option<PriorityType>,
) -> Result<u32, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<u32, rusqlite::Error> {
            completed_in(conn, room_id, date, &since, status, priority_type)
        })
        .await
        .map_err(map_tr_err)
}

/// Every ticket of a room for the day, ascending by rank.
pub async fn tickets_for_room(
    db: &Database,
    room_id: RoomId,
    date: NaiveDate,
) -> Result<Vec<Ticket>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Ticket>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE room_id = ?1 AND issued_date = ?2
                 ORDER BY queue_rank ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![room_id, codec::date(&date)], ticket_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_ticket(db: &Database, id: TicketId) -> Result<Option<Ticket>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Option<Ticket>, rusqlite::Error> { by_id_in(conn, id) })
        .await
        .map_err(map_tr_err)
}

pub async fn get_ticket_by_number(
    db: &Database,
    number: &str,
    date: NaiveDate,
) -> Result<Option<Ticket>, QdeskError> {
    let number = number.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Ticket>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE number = ?1 AND issued_date = ?2"),
                params![number, codec::date(&date)],
                ticket_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts a Pending ticket whose rank `placer` derives from the room's
/// pending set, read in the same IMMEDIATE transaction.
pub async fn append(
    db: &Database,
    ticket: NewTicket,
    placer: RankPlacer,
) -> Result<Ticket, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Guarded<Ticket>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let pending = pending_in(&tx, ticket.room_id, ticket.issued_date)?;
            let rank = placer(&pending);

            let inserted = guard(tx.execute(
                "INSERT INTO tickets
                    (number, service_id, room_id, priority_type, status, queue_rank,
                     issued_date, issued_at, kiosk_id)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8)",
                params![
                    ticket.number,
                    ticket.service_id,
                    ticket.room_id,
                    ticket.priority_type.to_string(),
                    rank.encode(),
                    codec::date(&ticket.issued_date),
                    codec::timestamp(&ticket.issued_at),
                    ticket.kiosk_id,
                ],
            ))?;
            if let Guarded::Violated(message) = inserted {
                return Ok(Guarded::Violated(message));
            }

            let id = tx.last_insert_rowid();
            let stored = by_id_in(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(Guarded::Done(stored))
        })
        .await
        .map_err(map_tr_err)?
        .into_result()
}

/// Persists every mutable field of `ticket`, provided no other write changed
/// its status away from `expected` in the meantime.
pub async fn update(
    db: &Database,
    ticket: &Ticket,
    expected: TicketStatus,
) -> Result<(), QdeskError> {
    let ticket = ticket.clone();
    let id = ticket.id;
    db.connection()
        .call(move |conn| -> Result<Guarded<Written>, rusqlite::Error> {
            match guard(write_in(conn, &ticket, expected))? {
                Guarded::Violated(message) => Ok(Guarded::Violated(message)),
                Guarded::Done(0) => Ok(Guarded::Done(classify_miss(conn, ticket.id)?)),
                Guarded::Done(_) => Ok(Guarded::Done(Written::Applied(ticket))),
            }
        })
        .await
        .map_err(map_tr_err)?
        .into_result()?
        .into_result(id, expected)
        .map(drop)
}

/// Like [`update`], but first renumbers `ticket` from the sequence of its
/// (new) `issued_date`, all in one IMMEDIATE transaction.
///
/// A failed write rolls the counter back with it, so no ordinal is lost.
pub async fn carry_over(
    db: &Database,
    ticket: &Ticket,
    expected: TicketStatus,
    prefix: &str,
) -> Result<Ticket, QdeskError> {
    let mut ticket = ticket.clone();
    let prefix = prefix.to_string();
    let id = ticket.id;
    db.connection()
        .call(move |conn| -> Result<Guarded<Written>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let ordinal =
                sequences::next_in(&tx, ticket.service_id, ticket.issued_date, ticket.priority_type)?;
            ticket.number = TicketNumber::new(prefix, ticket.priority_type, ordinal).to_string();

            match guard(write_in(&tx, &ticket, expected))? {
                Guarded::Violated(message) => Ok(Guarded::Violated(message)),
                Guarded::Done(0) => Ok(Guarded::Done(classify_miss(&tx, ticket.id)?)),
                Guarded::Done(_) => {
                    tx.commit()?;
                    Ok(Guarded::Done(Written::Applied(ticket)))
                }
            }
        })
        .await
        .map_err(map_tr_err)?
        .into_result()?
        .into_result(id, expected)
}

/// Moves the selected Pending ticket to Calling in one IMMEDIATE transaction.
///
/// The busy check, snapshot, selection and write all happen under the write
/// lock, so concurrent claims on a room can never both succeed.
pub async fn claim_next(
    db: &Database,
    request: ClaimRequest,
    selector: TicketSelector,
) -> Result<ClaimOutcome, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Guarded<ClaimOutcome>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if let Some(current) = current_in(&tx, request.room_id, request.date)? {
                return Ok(Guarded::Done(ClaimOutcome::Busy(current)));
            }

            let snapshot = QueueSnapshot {
                room_id: request.room_id,
                now: request.now,
                pending: pending_in(&tx, request.room_id, request.date)?,
                recent_done: completed_in(
                    &tx,
                    request.room_id,
                    request.date,
                    &request.window_start,
                    TicketStatus::Done,
                    None,
                )?,
                recent_priority_done: completed_in(
                    &tx,
                    request.room_id,
                    request.date,
                    &request.window_start,
                    TicketStatus::Done,
                    Some(PriorityType::Priority),
                )?,
            };

            let Some(selected) = selector(&snapshot) else {
                return Ok(Guarded::Done(ClaimOutcome::Empty));
            };
            let Some(mut ticket) = snapshot.pending.into_iter().find(|t| t.id == selected) else {
                warn!(ticket_id = selected, room_id = request.room_id, "selected ticket is not pending");
                return Ok(Guarded::Done(ClaimOutcome::Empty));
            };

            ticket.status = TicketStatus::Calling;
            ticket.called_at = Some(request.now);
            ticket.called_by_user_id = request.called_by;
            if ticket.wait_time_seconds.is_none() {
                ticket.wait_time_seconds =
                    Some((request.now - ticket.issued_at).num_seconds().max(0));
            }

            if let Guarded::Violated(message) = guard(write_in(&tx, &ticket, TicketStatus::Pending))? {
                return Ok(Guarded::Violated(message));
            }
            tx.commit()?;
            Ok(Guarded::Done(ClaimOutcome::Claimed(ticket)))
        })
        .await
        .map_err(map_tr_err)?
        .into_result()
}
