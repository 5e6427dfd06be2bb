// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time source for the engine.
//!
//! The queue day and working-session windows are evaluated in the site's
//! local time, expressed as a fixed offset from UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::QdeskError;

/// Supplies the current instant and the site's UTC offset.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn offset(&self) -> FixedOffset;

    /// Site-local wall time at `instant`.
    fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset()).naive_local()
    }

    /// Queue day containing `instant`.
    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date()
    }

    /// Current queue day.
    fn today(&self) -> NaiveDate {
        self.day_of(self.now())
    }
}

/// Wall clock with a configured site offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Builds a clock from an offset in minutes east of UTC.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, QdeskError> {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).ok_or_else(|| {
            QdeskError::Config(format!("utc offset of {minutes} minutes is out of range"))
        })?;
        Ok(Self::new(offset))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Fixed(DateTime<Utc>, FixedOffset);

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
        fn offset(&self) -> FixedOffset {
            self.1
        }
    }

    #[test]
    fn queue_day_follows_site_offset() {
        // 2026-03-01 23:30 UTC is already 2026-03-02 in UTC+07:00.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        let utc = Fixed(now, Utc.fix());
        let ict = Fixed(now, FixedOffset::east_opt(7 * 3600).unwrap());
        assert_eq!(utc.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(ict.today(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn out_of_range_offset_is_a_config_error() {
        assert!(SystemClock::from_offset_minutes(7 * 60).is_ok());
        assert!(matches!(
            SystemClock::from_offset_minutes(48 * 60),
            Err(QdeskError::Config(_))
        ));
    }
}
