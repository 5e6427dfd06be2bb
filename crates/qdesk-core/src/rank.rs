// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue ordering keys.
//!
//! A [`QueueRank`] is a 128-bit fixed-point timestamp: the upper 64 bits hold
//! microseconds since the Unix epoch, the lower 64 bits are free slots for
//! splicing a ticket between two neighbours. Ranks are persisted as 32 hex
//! digits with the sign bit flipped, so text ordering equals numeric ordering.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QdeskError;

const SLOT_BITS: u32 = 64;
const ONE_MICRO: i128 = 1 << SLOT_BITS;
const SIGN_FLIP: u128 = 1 << 127;
const ENCODED_LEN: usize = 32;

/// Ordering key of a ticket inside its room's pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueRank(i128);

impl QueueRank {
    /// Rank of a ticket joining the queue at `instant`.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(i128::from(instant.timestamp_micros()) << SLOT_BITS)
    }

    /// Moves the rank by a whole number of microseconds (negative moves it forward in the queue).
    pub fn shifted_micros(self, micros: i64) -> Self {
        Self(self.0.saturating_add(i128::from(micros).saturating_mul(ONE_MICRO)))
    }

    /// Moves the rank by whole seconds.
    pub fn shifted_secs(self, secs: i64) -> Self {
        self.shifted_micros(secs.saturating_mul(1_000_000))
    }

    /// A rank strictly between `self` and `other`, or `None` when the two are adjacent.
    pub fn midpoint(self, other: QueueRank) -> Option<QueueRank> {
        let (lo, hi) = if self.0 <= other.0 {
            (self.0, other.0)
        } else {
            (other.0, self.0)
        };
        let gap = hi.checked_sub(lo)?;
        if gap < 2 {
            return None;
        }
        Some(Self(lo + gap / 2))
    }

    /// Fixed-width, order-preserving text form used by storage.
    pub fn encode(&self) -> String {
        format!("{:032x}", (self.0 as u128) ^ SIGN_FLIP)
    }

    /// Parses the text form produced by [`QueueRank::encode`].
    pub fn decode(text: &str) -> Result<Self, QdeskError> {
        if text.len() != ENCODED_LEN {
            return Err(QdeskError::Internal(format!(
                "queue rank `{text}` must be {ENCODED_LEN} hex digits"
            )));
        }
        let raw = u128::from_str_radix(text, 16)
            .map_err(|e| QdeskError::Internal(format!("queue rank `{text}`: {e}")))?;
        Ok(Self((raw ^ SIGN_FLIP) as i128))
    }
}

impl fmt::Display for QueueRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for QueueRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for QueueRank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        QueueRank::decode(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn instant(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn later_instant_ranks_after() {
        let a = QueueRank::at(instant(1_700_000_000));
        let b = QueueRank::at(instant(1_700_000_001));
        assert!(a < b);
        assert_eq!(a.shifted_secs(1), b);
    }

    #[test]
    fn shifting_back_one_micro_moves_ahead() {
        let a = QueueRank::at(instant(1_700_000_000));
        assert!(a.shifted_micros(-1) < a);
    }

    #[test]
    fn adjacent_ranks_have_no_midpoint() {
        let a = QueueRank(10);
        assert_eq!(a.midpoint(QueueRank(11)), None);
        assert_eq!(a.midpoint(a), None);
        assert_eq!(a.midpoint(QueueRank(12)), Some(QueueRank(11)));
    }

    #[test]
    fn decode_rejects_malformed_text() {
        assert!(QueueRank::decode("abc").is_err());
        assert!(QueueRank::decode(&"z".repeat(32)).is_err());
    }

    #[test]
    fn pre_epoch_ranks_encode_before_post_epoch() {
        let before = QueueRank::at(instant(-5));
        let after = QueueRank::at(instant(5));
        assert!(before.encode() < after.encode());
    }

    #[test]
    fn serde_uses_hex_text() {
        let rank = QueueRank::at(instant(1_700_000_000));
        let json = serde_json::to_string(&rank).unwrap();
        assert_eq!(json, format!("\"{}\"", rank.encode()));
        let back: QueueRank = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rank);
    }

    proptest! {
        #[test]
        fn encoding_preserves_order(a in any::<i128>(), b in any::<i128>()) {
            let (ra, rb) = (QueueRank(a), QueueRank(b));
            prop_assert_eq!(ra.cmp(&rb), ra.encode().cmp(&rb.encode()));
            prop_assert_eq!(QueueRank::decode(&ra.encode()).unwrap(), ra);
        }

        #[test]
        fn midpoint_is_strictly_between(a in -1_000_000_000_000i64..1_000_000_000_000i64, gap in 0i64..1_000_000) {
            let lo = QueueRank::at(DateTime::from_timestamp_micros(a).unwrap());
            let hi = lo.shifted_micros(gap);
            match lo.midpoint(hi) {
                Some(mid) => prop_assert!(lo < mid && mid < hi),
                None => prop_assert!(gap < 2),
            }
        }
    }
}
