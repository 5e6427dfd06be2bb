// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column encodings shared by the query modules.
//!
//! Timestamps are fixed-width UTC text (`2026-03-01T08:15:00.000000Z`) so SQL
//! string comparison matches time order. Queue days are `YYYY-MM-DD`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use qdesk_core::QueueRank;
use rusqlite::Row;
use rusqlite::types::Type;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const DATE_FORMAT: &str = "%Y-%m-%d";
const CLOCK_FORMAT: &str = "%H:%M";

pub fn timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

pub fn opt_timestamp(instant: &Option<DateTime<Utc>>) -> Option<String> {
    instant.as_ref().map(timestamp)
}

pub fn date(day: &NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

pub fn clock_time(time: &NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// ISO weekday number, Monday = 1.
pub fn weekday(day: &Weekday) -> u32 {
    day.number_from_monday()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| conversion_error(idx, e))
}

pub fn get_opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        NaiveDateTime::parse_from_str(&t, TIMESTAMP_FORMAT)
            .map(|t| t.and_utc())
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub fn get_clock_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let text: String = row.get(idx)?;
    NaiveTime::parse_from_str(&text, CLOCK_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub fn get_weekday(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Weekday>> {
    let number: Option<u8> = row.get(idx)?;
    number
        .map(|n| {
            n.checked_sub(1)
                .and_then(|n| Weekday::try_from(n).ok())
                .ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        idx,
                        Type::Integer,
                        format!("weekday out of range: {n}").into(),
                    )
                })
        })
        .transpose()
}

pub fn get_rank(row: &Row<'_>, idx: usize) -> rusqlite::Result<QueueRank> {
    let text: String = row.get(idx)?;
    QueueRank::decode(&text).map_err(|e| conversion_error(idx, e))
}

/// Parses a strum-backed enum column such as `status` or `strategy`.
pub fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}
