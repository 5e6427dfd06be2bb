// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine tunables derived from the `[desk]` config section.

use std::time::Duration;

use qdesk_config::model::DeskConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Minutes per queued ticket in wait estimates.
    pub estimate_minutes_per_ticket: u32,
    /// Interval used when no policy row sets one.
    pub default_interleave_interval: u32,
    /// Rolling window for completion counts in interleaved selection.
    pub interleave_window: chrono::Duration,
    /// Upper bound on a single publish.
    pub publish_timeout: Duration,
}

impl EngineSettings {
    pub fn from_config(desk: &DeskConfig) -> Self {
        Self {
            estimate_minutes_per_ticket: desk.estimate_minutes_per_ticket,
            default_interleave_interval: desk.default_interleave_interval.max(1),
            interleave_window: chrono::Duration::minutes(i64::from(
                desk.interleave_window_minutes.max(1),
            )),
            publish_timeout: Duration::from_millis(desk.publish_timeout_ms),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&DeskConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_desk_config() {
        let settings = EngineSettings::default();
        assert_eq!(settings.estimate_minutes_per_ticket, 5);
        assert_eq!(settings.default_interleave_interval, 5);
        assert_eq!(settings.interleave_window, chrono::Duration::hours(2));
        assert_eq!(settings.publish_timeout, Duration::from_millis(500));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let desk = DeskConfig {
            default_interleave_interval: 0,
            ..DeskConfig::default()
        };
        assert_eq!(EngineSettings::from_config(&desk).default_interleave_interval, 1);
    }
}
