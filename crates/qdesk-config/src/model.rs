// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for qdesk.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

use qdesk_core::types::PriorityStrategy;

/// Top-level qdesk configuration.
///
/// Every section is optional. The catalog arrays (`[[services]]`, `[[rooms]]`,
/// `[[priority]]`, `[[sessions]]`, `[[displays]]`) are seeded into storage at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QdeskConfig {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Calling-desk tuning.
    #[serde(default)]
    pub desk: DeskConfig,

    /// HTTP/WebSocket gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// In-process event bus.
    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub services: Vec<ServiceEntry>,

    #[serde(default)]
    pub rooms: Vec<RoomEntry>,

    #[serde(default)]
    pub priority: Vec<PriorityEntry>,

    #[serde(default)]
    pub sessions: Vec<SessionEntry>,

    #[serde(default)]
    pub displays: Vec<DisplayEntry>,
}

/// Site identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_site_name() -> String {
    "qdesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journaling.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("qdesk").join("qdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("qdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_true() -> bool {
    true
}

/// Calling-desk tuning knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeskConfig {
    /// Site offset from UTC in minutes. Defines the queue day and working-session clock.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Minutes per queued ticket used for wait estimates.
    #[serde(default = "default_estimate_minutes")]
    pub estimate_minutes_per_ticket: u32,

    /// Interleave interval used when a policy row does not set one.
    #[serde(default = "default_interleave_interval")]
    pub default_interleave_interval: u32,

    /// Rolling window for completion counts in interleaved selection.
    #[serde(default = "default_interleave_window")]
    pub interleave_window_minutes: u32,

    /// Upper bound on a single event publish.
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_ms: u64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            estimate_minutes_per_ticket: default_estimate_minutes(),
            default_interleave_interval: default_interleave_interval(),
            interleave_window_minutes: default_interleave_window(),
            publish_timeout_ms: default_publish_timeout(),
        }
    }
}

fn default_estimate_minutes() -> u32 {
    5
}

fn default_interleave_interval() -> u32 {
    5
}

fn default_interleave_window() -> u32 {
    120
}

fn default_publish_timeout() -> u64 {
    500
}

/// HTTP/WebSocket gateway settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*`. `None` leaves the API open.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8470
}

/// Event bus settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Buffered events per channel before slow subscribers start lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// `[[services]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
    pub id: i64,
    /// Ticket number prefix, e.g. `XN`.
    pub code: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// `[[rooms]]` entry. `service` references a service code.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoomEntry {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub service: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// `[[priority]]` entry. Bind to a room code, a service code, or neither for the global default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PriorityEntry {
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub strategy: PriorityStrategy,
    #[serde(default)]
    pub interleave_interval: Option<u32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// `[[sessions]]` entry. Times are `HH:MM` in site-local time; `end` is exclusive.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionEntry {
    pub name: String,
    pub start: String,
    pub end: String,
    /// Weekday name (`mon`, `Tuesday`, ...). Omit for every day.
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// `[[displays]]` entry. An empty `rooms` list shows every active room.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rooms: Vec<String>,
}
