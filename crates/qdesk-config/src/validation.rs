// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Checks the constraints serde cannot express: catalog references,
//! uniqueness, time windows and numeric ranges. All problems are collected.

use std::collections::HashSet;

use crate::catalog::{parse_clock_time, parse_weekday};
use crate::diagnostic::ConfigError;
use crate::model::QdeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest accepted site offset; chrono's fixed offsets stay below one day.
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Validates a deserialized configuration, returning every problem found.
pub fn validate_config(config: &QdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_ambient(config, &mut errors);
    validate_catalog(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_ambient(config: &QdeskConfig, errors: &mut Vec<ConfigError>) {
    if !LOG_LEVELS.contains(&config.site.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "site.log_level `{}` must be one of {}",
            config.site.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation("storage.database_path must not be empty"));
    }

    if config.desk.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
        errors.push(ConfigError::validation(format!(
            "desk.utc_offset_minutes must be within ±{MAX_OFFSET_MINUTES}, got {}",
            config.desk.utc_offset_minutes
        )));
    }

    if config.desk.default_interleave_interval < 1 {
        errors.push(ConfigError::validation(
            "desk.default_interleave_interval must be at least 1",
        ));
    }

    if config.desk.interleave_window_minutes < 1 {
        errors.push(ConfigError::validation(
            "desk.interleave_window_minutes must be at least 1",
        ));
    }

    if config.gateway.enabled && config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "gateway.bearer_token must not be blank; remove it to disable auth",
        ));
    }

    if config.bus.channel_capacity == 0 {
        errors.push(ConfigError::validation("bus.channel_capacity must be at least 1"));
    }
}

fn validate_catalog(config: &QdeskConfig, errors: &mut Vec<ConfigError>) {
    let mut service_ids = HashSet::new();
    let mut service_codes = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        if !service_ids.insert(service.id) {
            errors.push(ConfigError::validation(format!(
                "duplicate service id {} in [[services]]",
                service.id
            )));
        }
        if service.code.trim().is_empty() {
            errors.push(ConfigError::validation(format!("services[{i}].code must not be empty")));
        } else if !service_codes.insert(service.code.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate service code `{}` in [[services]]",
                service.code
            )));
        }
    }

    let mut room_ids = HashSet::new();
    let mut room_codes = HashSet::new();
    for (i, room) in config.rooms.iter().enumerate() {
        if !room_ids.insert(room.id) {
            errors.push(ConfigError::validation(format!(
                "duplicate room id {} in [[rooms]]",
                room.id
            )));
        }
        if !room_codes.insert(room.code.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate room code `{}` in [[rooms]]",
                room.code
            )));
        }
        if !service_codes.contains(room.service.as_str()) {
            errors.push(ConfigError::validation(format!(
                "rooms[{i}].service `{}` is not a configured service code",
                room.service
            )));
        }
    }

    for (i, entry) in config.priority.iter().enumerate() {
        if let Some(room) = &entry.room
            && !room_codes.contains(room.as_str())
        {
            errors.push(ConfigError::validation(format!(
                "priority[{i}].room `{room}` is not a configured room code"
            )));
        }
        if let Some(service) = &entry.service
            && !service_codes.contains(service.as_str())
        {
            errors.push(ConfigError::validation(format!(
                "priority[{i}].service `{service}` is not a configured service code"
            )));
        }
        if entry.interleave_interval == Some(0) {
            errors.push(ConfigError::validation(format!(
                "priority[{i}].interleave_interval must be at least 1"
            )));
        }
    }

    for (i, session) in config.sessions.iter().enumerate() {
        let start = parse_clock_time(&session.start);
        let end = parse_clock_time(&session.end);
        if start.is_none() {
            errors.push(ConfigError::validation(format!(
                "sessions[{i}].start `{}` must be HH:MM",
                session.start
            )));
        }
        if end.is_none() {
            errors.push(ConfigError::validation(format!(
                "sessions[{i}].end `{}` must be HH:MM",
                session.end
            )));
        }
        if let (Some(start), Some(end)) = (start, end)
            && start >= end
        {
            errors.push(ConfigError::validation(format!(
                "sessions[{i}] `{}` must start before it ends",
                session.name
            )));
        }
        if let Some(day) = &session.day
            && parse_weekday(day).is_none()
        {
            errors.push(ConfigError::validation(format!(
                "sessions[{i}].day `{day}` is not a weekday name"
            )));
        }
    }

    let mut display_ids = HashSet::new();
    for display in &config.displays {
        if !display_ids.insert(display.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate display id `{}` in [[displays]]",
                display.id
            )));
        }
        for room in &display.rooms {
            if !room_codes.contains(room.as_str()) {
                errors.push(ConfigError::validation(format!(
                    "display `{}` lists unknown room `{room}`",
                    display.id
                )));
            }
        }
    }
}
