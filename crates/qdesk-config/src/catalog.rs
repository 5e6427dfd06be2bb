// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of the configured catalog arrays into domain types.

use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};

use qdesk_core::types::{
    Catalog, DisplayProfile, PrioritySetting, Room, Service, WorkingSession,
};
use qdesk_core::QdeskError;

use crate::model::QdeskConfig;

/// Parses an `HH:MM` time of day.
pub fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

/// Parses a weekday name such as `mon` or `Friday`.
pub fn parse_weekday(text: &str) -> Option<Weekday> {
    text.trim().parse().ok()
}

impl QdeskConfig {
    /// Builds the storage catalog from `[[services]]`, `[[rooms]]`, `[[priority]]` and `[[sessions]]`.
    ///
    /// Priority rows and sessions are numbered in file order starting at 1.
    pub fn catalog(&self) -> Result<Catalog, QdeskError> {
        let service_ids: HashMap<&str, i64> = self
            .services
            .iter()
            .map(|s| (s.code.as_str(), s.id))
            .collect();
        let room_ids = self.room_ids();

        let services = self
            .services
            .iter()
            .map(|s| Service {
                id: s.id,
                code: s.code.clone(),
                name: s.name.clone(),
                is_active: s.active,
                display_order: s.display_order,
            })
            .collect();

        let rooms = self
            .rooms
            .iter()
            .map(|r| {
                let service_id = *service_ids.get(r.service.as_str()).ok_or_else(|| {
                    QdeskError::Config(format!(
                        "room `{}` references unknown service `{}`",
                        r.code, r.service
                    ))
                })?;
                Ok(Room {
                    id: r.id,
                    service_id,
                    code: r.code.clone(),
                    name: r.name.clone(),
                    is_active: r.active,
                })
            })
            .collect::<Result<Vec<_>, QdeskError>>()?;

        let priority_settings = self
            .priority
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let room_id = p
                    .room
                    .as_deref()
                    .map(|code| {
                        room_ids.get(code).copied().ok_or_else(|| {
                            QdeskError::Config(format!("priority[{i}] references unknown room `{code}`"))
                        })
                    })
                    .transpose()?;
                let service_id = p
                    .service
                    .as_deref()
                    .map(|code| {
                        service_ids.get(code).copied().ok_or_else(|| {
                            QdeskError::Config(format!(
                                "priority[{i}] references unknown service `{code}`"
                            ))
                        })
                    })
                    .transpose()?;
                Ok(PrioritySetting {
                    id: i as i64 + 1,
                    room_id,
                    service_id,
                    strategy: p.strategy,
                    interleave_interval: p
                        .interleave_interval
                        .unwrap_or(self.desk.default_interleave_interval),
                    is_active: p.active,
                })
            })
            .collect::<Result<Vec<_>, QdeskError>>()?;

        let working_sessions = self
            .sessions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let start_time = parse_clock_time(&s.start).ok_or_else(|| {
                    QdeskError::Config(format!("sessions[{i}].start `{}` is not HH:MM", s.start))
                })?;
                let end_time = parse_clock_time(&s.end).ok_or_else(|| {
                    QdeskError::Config(format!("sessions[{i}].end `{}` is not HH:MM", s.end))
                })?;
                let day_of_week = s
                    .day
                    .as_deref()
                    .map(|d| {
                        parse_weekday(d).ok_or_else(|| {
                            QdeskError::Config(format!("sessions[{i}].day `{d}` is not a weekday"))
                        })
                    })
                    .transpose()?;
                Ok(WorkingSession {
                    id: i as i64 + 1,
                    name: s.name.clone(),
                    start_time,
                    end_time,
                    day_of_week,
                    is_active: s.active,
                })
            })
            .collect::<Result<Vec<_>, QdeskError>>()?;

        Ok(Catalog {
            services,
            rooms,
            priority_settings,
            working_sessions,
        })
    }

    /// Display profiles with room codes resolved to ids.
    pub fn display_profiles(&self) -> Result<Vec<DisplayProfile>, QdeskError> {
        let room_ids = self.room_ids();
        self.displays
            .iter()
            .map(|d| {
                let rooms = d
                    .rooms
                    .iter()
                    .map(|code| {
                        room_ids.get(code.as_str()).copied().ok_or_else(|| {
                            QdeskError::Config(format!(
                                "display `{}` references unknown room `{code}`",
                                d.id
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, QdeskError>>()?;
                Ok(DisplayProfile {
                    id: d.id.clone(),
                    name: d.name.clone().unwrap_or_else(|| d.id.clone()),
                    rooms,
                })
            })
            .collect()
    }

    fn room_ids(&self) -> HashMap<&str, i64> {
        self.rooms.iter().map(|r| (r.code.as_str(), r.id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const SITE: &str = r#"
[[services]]
id = 1
code = "XN"
name = "Blood tests"

[[rooms]]
id = 10
code = "R1"
name = "Room 1"
service = "XN"

[[priority]]
room = "R1"
strategy = "interleaved"

[[priority]]
strategy = "strict"
interleave_interval = 3

[[sessions]]
name = "Morning"
start = "07:30"
end = "11:30"
day = "mon"

[[displays]]
id = "lobby"
rooms = ["R1"]
"#;

    #[test]
    fn catalog_resolves_codes_to_ids() {
        let config = load_config_from_str(SITE).unwrap();
        let catalog = config.catalog().unwrap();

        assert_eq!(catalog.rooms[0].service_id, 1);
        assert_eq!(catalog.priority_settings[0].room_id, Some(10));
        assert_eq!(catalog.priority_settings[0].interleave_interval, 5);
        assert_eq!(catalog.priority_settings[1].id, 2);
        assert_eq!(catalog.priority_settings[1].interleave_interval, 3);
        assert_eq!(catalog.working_sessions[0].day_of_week, Some(Weekday::Mon));
        assert_eq!(
            catalog.working_sessions[0].start_time,
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );

        let displays = config.display_profiles().unwrap();
        assert_eq!(displays[0].rooms, vec![10]);
        assert_eq!(displays[0].name, "lobby");
    }

    #[test]
    fn unknown_room_service_is_a_config_error() {
        let config = load_config_from_str(
            r#"
[[rooms]]
id = 1
code = "R1"
name = "Room 1"
service = "NOPE"
"#,
        )
        .unwrap();
        assert!(matches!(config.catalog(), Err(QdeskError::Config(_))));
    }

    #[test]
    fn clock_time_and_weekday_parsing() {
        assert_eq!(parse_clock_time("07:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_clock_time("25:00"), None);
        assert_eq!(parse_weekday("Friday"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("someday"), None);
    }
}
