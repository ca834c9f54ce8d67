//! Day-of-week and time-of-day derivation

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};

use crate::error::{PipelineError, Result};
use crate::models::TimeOfDay;

/// Bucket an hour of day. Bounds are inclusive at the top: 12:xx is still
/// morning, 18:xx afternoon, 23:xx evening; 0-5 wraps to night.
pub fn time_of_day(hour: u32) -> TimeOfDay {
    match hour {
        6..=12 => TimeOfDay::Morning,
        13..=18 => TimeOfDay::Afternoon,
        19..=23 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    }
}

/// Converts timestamps into the bucketing timezone before deriving fields.
#[derive(Debug, Clone, Copy)]
pub struct TemporalEnricher {
    offset: FixedOffset,
}

impl TemporalEnricher {
    pub fn new(utc_offset_hours: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("invalid utc offset {}h", utc_offset_hours))
        })?;
        Ok(Self { offset })
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn derive(&self, created_at: &DateTime<FixedOffset>) -> (Weekday, TimeOfDay) {
        let local = created_at.with_timezone(&self.offset);
        (local.weekday(), time_of_day(local.hour()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timestamp;

    #[test]
    fn test_every_hour_has_one_bucket() {
        let mut counts = std::collections::HashMap::new();
        for hour in 0..24 {
            *counts.entry(time_of_day(hour)).or_insert(0) += 1;
        }
        assert_eq!(counts.values().sum::<i32>(), 24);
        assert_eq!(counts[&TimeOfDay::Morning], 7);
        assert_eq!(counts[&TimeOfDay::Afternoon], 6);
        assert_eq!(counts[&TimeOfDay::Evening], 5);
        assert_eq!(counts[&TimeOfDay::Night], 6);
    }

    #[test]
    fn test_bucket_edges() {
        assert_eq!(time_of_day(7), TimeOfDay::Morning);
        assert_eq!(time_of_day(12), TimeOfDay::Morning);
        assert_eq!(time_of_day(13), TimeOfDay::Afternoon);
        assert_eq!(time_of_day(18), TimeOfDay::Afternoon);
        assert_eq!(time_of_day(20), TimeOfDay::Evening);
        assert_eq!(time_of_day(23), TimeOfDay::Evening);
        assert_eq!(time_of_day(2), TimeOfDay::Night);
        assert_eq!(time_of_day(5), TimeOfDay::Night);
        assert_eq!(time_of_day(6), TimeOfDay::Morning);
    }

    #[test]
    fn test_offset_shifts_day_and_bucket() {
        // 2021-12-05 is a Sunday
        let ts = parse_timestamp("2021-12-05T22:30:00Z").unwrap();

        let (day, bucket) = TemporalEnricher::utc().derive(&ts);
        assert_eq!(day, Weekday::Sun);
        assert_eq!(bucket, TimeOfDay::Evening);

        let moscow = TemporalEnricher::new(3).unwrap();
        let (day, bucket) = moscow.derive(&ts);
        assert_eq!(day, Weekday::Mon);
        assert_eq!(bucket, TimeOfDay::Night);
    }
}
