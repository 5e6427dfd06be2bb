// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Priority policy resolution by specificity: room, then service, then global.

use std::sync::Arc;

use qdesk_core::types::{PrioritySetting, PriorityStrategy, RoomId, ServiceId};
use qdesk_core::{QdeskError, TicketStore};
use tracing::trace;

/// Strategy and interval in force for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub strategy: PriorityStrategy,
    /// Normal tickets served between priority tickets; always at least 1.
    pub interleave_interval: u32,
}

impl ResolvedPolicy {
    pub fn strict(interleave_interval: u32) -> Self {
        Self {
            strategy: PriorityStrategy::Strict,
            interleave_interval: interleave_interval.max(1),
        }
    }
}

/// Picks the most specific active row for `(room_id, service_id)`.
///
/// A row naming a room is room-specific even if it also names a service.
/// Equal specificity resolves to the lowest row id. With no match the
/// policy is Strict with `default_interval`.
pub fn resolve(
    settings: &[PrioritySetting],
    room_id: RoomId,
    service_id: ServiceId,
    default_interval: u32,
) -> ResolvedPolicy {
    let lowest = |matches: &dyn Fn(&PrioritySetting) -> bool| {
        settings
            .iter()
            .filter(|s| s.is_active && matches(s))
            .min_by_key(|s| s.id)
    };

    lowest(&|s: &PrioritySetting| s.room_id == Some(room_id))
        .or_else(|| {
            lowest(&|s: &PrioritySetting| s.room_id.is_none() && s.service_id == Some(service_id))
        })
        .or_else(|| lowest(&|s: &PrioritySetting| s.room_id.is_none() && s.service_id.is_none()))
        .map(|s| ResolvedPolicy {
            strategy: s.strategy,
            interleave_interval: s.interleave_interval.max(1),
        })
        .unwrap_or_else(|| ResolvedPolicy::strict(default_interval))
}

/// Store-backed resolver. Settings are re-read on every call, so catalog
/// changes apply to the next issuance or call.
#[derive(Clone)]
pub struct PriorityPolicy {
    store: Arc<dyn TicketStore>,
    default_interval: u32,
}

impl PriorityPolicy {
    pub fn new(store: Arc<dyn TicketStore>, default_interval: u32) -> Self {
        Self {
            store,
            default_interval,
        }
    }

    pub async fn resolve(
        &self,
        room_id: RoomId,
        service_id: ServiceId,
    ) -> Result<ResolvedPolicy, QdeskError> {
        let settings = self.store.priority_settings().await?;
        let policy = resolve(&settings, room_id, service_id, self.default_interval);
        trace!(room_id, strategy = %policy.strategy, interval = policy.interleave_interval, "policy resolved");
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        id: i64,
        room_id: Option<RoomId>,
        service_id: Option<ServiceId>,
        strategy: PriorityStrategy,
        interval: u32,
    ) -> PrioritySetting {
        PrioritySetting {
            id,
            room_id,
            service_id,
            strategy,
            interleave_interval: interval,
            is_active: true,
        }
    }

    #[test]
    fn nothing_configured_is_strict_with_default_interval() {
        assert_eq!(resolve(&[], 1, 1, 5), ResolvedPolicy::strict(5));
    }

    #[test]
    fn room_beats_service_beats_global() {
        let rows = [
            row(1, None, None, PriorityStrategy::Interleaved, 9),
            row(2, None, Some(7), PriorityStrategy::Interleaved, 4),
            row(3, Some(70), None, PriorityStrategy::Strict, 2),
        ];
        assert_eq!(resolve(&rows, 70, 7, 5).strategy, PriorityStrategy::Strict);
        assert_eq!(resolve(&rows, 71, 7, 5).interleave_interval, 4);
        assert_eq!(resolve(&rows, 80, 8, 5).interleave_interval, 9);
    }

    #[test]
    fn inactive_rows_are_skipped() {
        let mut room_row = row(1, Some(70), None, PriorityStrategy::Interleaved, 3);
        room_row.is_active = false;
        let rows = [room_row, row(2, None, Some(7), PriorityStrategy::Interleaved, 6)];
        assert_eq!(resolve(&rows, 70, 7, 5).interleave_interval, 6);
    }

    #[test]
    fn ties_go_to_lowest_id_and_room_rows_win_with_service() {
        let rows = [
            row(5, None, Some(7), PriorityStrategy::Interleaved, 5),
            row(4, None, Some(7), PriorityStrategy::Interleaved, 8),
            row(6, Some(70), Some(7), PriorityStrategy::Interleaved, 2),
        ];
        assert_eq!(resolve(&rows, 71, 7, 5).interleave_interval, 8);
        assert_eq!(resolve(&rows, 70, 7, 5).interleave_interval, 2);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let rows = [row(1, None, None, PriorityStrategy::Interleaved, 0)];
        assert_eq!(resolve(&rows, 1, 1, 5).interleave_interval, 1);
    }
}
