// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference catalog: services, rooms, priority settings and working sessions.

use chrono::NaiveDate;
use qdesk_core::QdeskError;
use qdesk_core::types::{
    Catalog, PrioritySetting, Room, RoomId, Service, ServiceId, WorkingSession,
};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};

use crate::codec;
use crate::database::{Database, map_tr_err};

const SERVICE_COLUMNS: &str = "id, code, name, is_active, display_order";
const ROOM_COLUMNS: &str = "id, service_id, code, name, is_active";

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        is_active: row.get(3)?,
        display_order: row.get(4)?,
    })
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        service_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        is_active: row.get(4)?,
    })
}

/// Replaces the stored catalog with `catalog` in one transaction.
///
/// Services and rooms are upserted by id and those missing from `catalog` are
/// deactivated rather than deleted, since tickets reference them. Priority
/// settings and working sessions are replaced wholesale.
pub async fn seed(db: &Database, catalog: &Catalog) -> Result<(), QdeskError> {
    let catalog = catalog.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("UPDATE services SET is_active = 0", [])?;
            tx.execute("UPDATE rooms SET is_active = 0", [])?;
            tx.execute("DELETE FROM priority_settings", [])?;
            tx.execute("DELETE FROM working_sessions", [])?;

            for service in &catalog.services {
                tx.execute(
                    "INSERT INTO services (id, code, name, is_active, display_order)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (id) DO UPDATE SET
                        code = excluded.code, name = excluded.name,
                        is_active = excluded.is_active, display_order = excluded.display_order",
                    params![
                        service.id,
                        service.code,
                        service.name,
                        service.is_active,
                        service.display_order
                    ],
                )?;
            }
            for room in &catalog.rooms {
                tx.execute(
                    "INSERT INTO rooms (id, service_id, code, name, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (id) DO UPDATE SET
                        service_id = excluded.service_id, code = excluded.code,
                        name = excluded.name, is_active = excluded.is_active",
                    params![room.id, room.service_id, room.code, room.name, room.is_active],
                )?;
            }
            for setting in &catalog.priority_settings {
                tx.execute(
                    "INSERT INTO priority_settings
                        (id, room_id, service_id, strategy, interleave_interval, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        setting.id,
                        setting.room_id,
                        setting.service_id,
                        setting.strategy.to_string(),
                        setting.interleave_interval,
                        setting.is_active
                    ],
                )?;
            }
            for session in &catalog.working_sessions {
                tx.execute(
                    "INSERT INTO working_sessions
                        (id, name, start_time, end_time, day_of_week, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        session.id,
                        session.name,
                        codec::clock_time(&session.start_time),
                        codec::clock_time(&session.end_time),
                        session.day_of_week.as_ref().map(codec::weekday),
                        session.is_active
                    ],
                )?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_service(db: &Database, id: ServiceId) -> Result<Option<Service>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Option<Service>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
                params![id],
                service_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_service_by_code(db: &Database, code: &str) -> Result<Option<Service>, QdeskError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Service>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE code = ?1"),
                params![code],
                service_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_room(db: &Database, id: RoomId) -> Result<Option<Room>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Option<Room>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
                params![id],
                room_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Rooms ordered by id, optionally filtered by service.
pub async fn list_rooms(
    db: &Database,
    service_id: Option<ServiceId>,
) -> Result<Vec<Room>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Room>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms
                 WHERE ?1 IS NULL OR service_id = ?1
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![service_id], room_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Active room of a service with the fewest Pending/Calling tickets on `date`.
pub async fn least_loaded_room(
    db: &Database,
    service_id: ServiceId,
    date: NaiveDate,
) -> Result<Option<Room>, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<Option<Room>, rusqlite::Error> {
            conn.query_row(
                "SELECT r.id, r.service_id, r.code, r.name, r.is_active
                 FROM rooms r
                 WHERE r.service_id = ?1 AND r.is_active = 1
                 ORDER BY (
                     SELECT COUNT(*) FROM tickets t
                     WHERE t.room_id = r.id AND t.issued_date = ?2
                       AND t.status IN ('pending', 'calling')
                 ) ASC, r.id ASC
                 LIMIT 1",
                params![service_id, codec::date(&date)],
                room_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_priority_settings(db: &Database) -> Result<Vec<PrioritySetting>, QdeskError> {
    db.connection()
        .call(|conn| -> Result<Vec<PrioritySetting>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, service_id, strategy, interleave_interval, is_active
                 FROM priority_settings ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(PrioritySetting {
                    id: row.get(0)?,
                    room_id: row.get(1)?,
                    service_id: row.get(2)?,
                    strategy: codec::get_enum(row, 3)?,
                    interleave_interval: row.get(4)?,
                    is_active: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_working_sessions(db: &Database) -> Result<Vec<WorkingSession>, QdeskError> {
    db.connection()
        .call(|conn| -> Result<Vec<WorkingSession>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, name, start_time, end_time, day_of_week, is_active
                 FROM working_sessions ORDER BY start_time ASC, id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(WorkingSession {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    start_time: codec::get_clock_time(row, 2)?,
                    end_time: codec::get_clock_time(row, 3)?,
                    day_of_week: codec::get_weekday(row, 4)?,
                    is_active: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
