// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily per-service ticket counters.

use chrono::NaiveDate;
use qdesk_core::QdeskError;
use qdesk_core::types::{PriorityType, ServiceId};
use rusqlite::{Connection, TransactionBehavior, params};

use crate::codec;
use crate::database::{Database, map_tr_err};

/// Increments and returns the counter for one class of `(service, date)`.
///
/// The row is created on first use. Both statements share one IMMEDIATE
/// transaction, so concurrent callers always receive distinct ordinals.
pub async fn next_ordinal(
    db: &Database,
    service_id: ServiceId,
    date: NaiveDate,
    priority_type: PriorityType,
) -> Result<u32, QdeskError> {
    db.connection()
        .call(move |conn| -> Result<u32, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let ordinal = next_in(&tx, service_id, date, priority_type)?;
            tx.commit()?;
            Ok(ordinal)
        })
        .await
        .map_err(map_tr_err)
}

/// Counter increment for callers already holding the write transaction.
pub(crate) fn next_in(
    conn: &Connection,
    service_id: ServiceId,
    date: NaiveDate,
    priority_type: PriorityType,
) -> rusqlite::Result<u32> {
    let increment = match priority_type {
        PriorityType::Normal => {
            "UPDATE ticket_sequences SET normal_last_number = normal_last_number + 1
             WHERE service_id = ?1 AND sequence_date = ?2
             RETURNING normal_last_number"
        }
        PriorityType::Priority => {
            "UPDATE ticket_sequences SET priority_last_number = priority_last_number + 1
             WHERE service_id = ?1 AND sequence_date = ?2
             RETURNING priority_last_number"
        }
    };
    let day = codec::date(&date);
    conn.execute(
        "INSERT INTO ticket_sequences (service_id, sequence_date) VALUES (?1, ?2)
         ON CONFLICT (service_id, sequence_date) DO NOTHING",
        params![service_id, day],
    )?;
    conn.query_row(increment, params![service_id, day], |row| row.get(0))
}
