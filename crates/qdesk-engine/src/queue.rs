// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue ordering: rank placement at issuance, next-ticket selection at
//! call time, and the display order of a room's waiting list.
//!
//! Everything here is a pure function of the tickets handed in. The store
//! runs [`place`] and [`select_next`] inside its write transactions.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use qdesk_core::types::{PriorityStrategy, PriorityType, QueueSnapshot, Ticket, TicketId};
use qdesk_core::QueueRank;
use tracing::warn;

use crate::policy::ResolvedPolicy;

/// Rank for a new ticket given the room's pending tickets, ascending by rank.
///
/// Normal tickets always join the back of the queue at "now".
pub fn place(
    policy: &ResolvedPolicy,
    priority_type: PriorityType,
    pending: &[Ticket],
    now: DateTime<Utc>,
) -> QueueRank {
    match (priority_type, policy.strategy) {
        (PriorityType::Normal, _) => QueueRank::at(now),
        (PriorityType::Priority, PriorityStrategy::Strict) => place_strict(pending, now),
        (PriorityType::Priority, PriorityStrategy::Interleaved) => {
            place_interleaved(pending, policy.interleave_interval, now)
        }
    }
}

/// Just ahead of the earliest pending normal ticket, behind any priority
/// tickets already waiting in front of it.
fn place_strict(pending: &[Ticket], now: DateTime<Utc>) -> QueueRank {
    let Some(first_normal) = pending
        .iter()
        .position(|t| t.priority_type == PriorityType::Normal)
    else {
        return QueueRank::at(now);
    };
    let normal_rank = pending[first_normal].queue_rank;
    match first_normal.checked_sub(1).map(|i| pending[i].queue_rank) {
        Some(before) => between(before, normal_rank),
        None => normal_rank.shifted_micros(-1),
    }
}

/// Splices the ticket `interval` places behind the last pending priority
/// ticket (or the head of the queue), falling back to just behind that
/// priority ticket, or "now", when the queue is too short.
fn place_interleaved(pending: &[Ticket], interval: u32, now: DateTime<Utc>) -> QueueRank {
    let interval = interval.max(1) as usize;
    let last_priority = pending
        .iter()
        .rposition(|t| t.priority_type == PriorityType::Priority);

    match last_priority {
        Some(last) if pending.len() - last - 1 >= interval => {
            splice_at(pending, last + 1 + interval, now)
        }
        Some(last) => {
            let after = pending[last].queue_rank.shifted_secs(1);
            match pending.get(last + 1) {
                Some(next) if after >= next.queue_rank => {
                    between(pending[last].queue_rank, next.queue_rank)
                }
                _ => after,
            }
        }
        None if pending.len() >= interval => splice_at(pending, interval, now),
        None => QueueRank::at(now),
    }
}

/// Rank that sorts at index `position` of `pending`.
fn splice_at(pending: &[Ticket], position: usize, now: DateTime<Utc>) -> QueueRank {
    match (position.checked_sub(1).and_then(|i| pending.get(i)), pending.get(position)) {
        (Some(before), Some(after)) => between(before.queue_rank, after.queue_rank),
        (Some(before), None) => QueueRank::at(now).max(before.queue_rank.shifted_micros(1)),
        (None, Some(after)) => after.queue_rank.shifted_micros(-1),
        (None, None) => QueueRank::at(now),
    }
}

/// Midpoint of two ranks. When the gap is exhausted the lower rank is
/// reused; the id tie-break then orders the new ticket right after it.
fn between(before: QueueRank, after: QueueRank) -> QueueRank {
    before.midpoint(after).unwrap_or_else(|| {
        warn!(%before, %after, "rank gap exhausted, reusing lower rank");
        before
    })
}

fn oldest(snapshot: &QueueSnapshot, class: PriorityType) -> Option<&Ticket> {
    snapshot
        .pending
        .iter()
        .filter(|t| t.priority_type == class)
        .min_by_key(|t| (t.queue_rank, t.id))
}

/// The ticket the room should call next, or `None` when nothing is pending.
pub fn select_next(policy: &ResolvedPolicy, snapshot: &QueueSnapshot) -> Option<TicketId> {
    let priority = oldest(snapshot, PriorityType::Priority);
    let normal = oldest(snapshot, PriorityType::Normal);

    let chosen = match (priority, normal) {
        (None, None) => return None,
        (Some(p), None) => p,
        (None, Some(n)) => n,
        (Some(p), Some(n)) => match policy.strategy {
            PriorityStrategy::Strict => p,
            PriorityStrategy::Interleaved => {
                if priority_is_due(policy, snapshot) {
                    p
                } else {
                    n
                }
            }
        },
    };
    Some(chosen.id)
}

/// Interleaved rule: enough normal completions since the last priority
/// ticket, or a priority ticket has waited more than twice the interval in minutes.
fn priority_is_due(policy: &ResolvedPolicy, snapshot: &QueueSnapshot) -> bool {
    let interval = i64::from(policy.interleave_interval);
    let normal_since_priority =
        i64::from(snapshot.recent_done) - i64::from(snapshot.recent_priority_done) * interval;
    let longest_priority_wait = snapshot
        .pending
        .iter()
        .filter(|t| t.priority_type == PriorityType::Priority)
        .map(|t| (snapshot.now - t.issued_at).num_minutes())
        .max()
        .unwrap_or(0);

    normal_since_priority >= interval || longest_priority_wait > interval * 2
}

/// Waiting list as displays show it: Strict lists priority tickets first,
/// Interleaved follows the rank splice.
pub fn waiting_order(mut tickets: Vec<Ticket>, strategy: PriorityStrategy) -> Vec<Ticket> {
    match strategy {
        PriorityStrategy::Strict => {
            tickets.sort_by_key(|t| (Reverse(t.priority_type), t.queue_rank, t.id))
        }
        PriorityStrategy::Interleaved => tickets.sort_by_key(|t| (t.queue_rank, t.id)),
    }
    tickets
}
