use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Raw row from the order CSV. Any other columns in the source (address,
/// customer name, phone) are ignored by the deserializer.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvOrder {
    pub id: String,
    pub created_at: String,
    pub location_latitude: f64,
    pub location_longitude: f64,
    pub amount_charged: f64,
    #[serde(default)]
    pub user_agent: String,
}

/// One delivery order as loaded from the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<FixedOffset>,
    pub location_latitude: f64,
    pub location_longitude: f64,
    pub amount_charged: f64,
    pub user_agent: String,
}

/// Coarse bucket of the order hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full English weekday name
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Order with temporal and geographic attributes attached.
///
/// `district` and `okrug` are `None` until classification; the final dataset
/// only ever holds orders where both are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub day_of_week: Weekday,
    pub time_of_day: TimeOfDay,
    pub distance_from_center_km: f64,
    pub district: Option<String>,
    pub okrug: Option<String>,
}

impl EnrichedOrder {
    pub fn is_classified(&self) -> bool {
        self.district.is_some() && self.okrug.is_some()
    }

    pub fn day_name(&self) -> &'static str {
        weekday_name(self.day_of_week)
    }
}

/// Output row in the enriched dataset column order
#[derive(Debug, Clone, Serialize)]
pub struct CsvEnrichedOrder<'a> {
    pub id: &'a str,
    pub created_at: String,
    pub location_latitude: f64,
    pub location_longitude: f64,
    pub amount_charged: f64,
    pub user_agent: &'a str,
    pub day_of_week: &'static str,
    pub time_of_day: &'static str,
    pub distance_from_center_km: f64,
    pub district: &'a str,
    pub okrug: &'a str,
}

impl<'a> From<&'a EnrichedOrder> for CsvEnrichedOrder<'a> {
    fn from(row: &'a EnrichedOrder) -> Self {
        CsvEnrichedOrder {
            id: &row.order.id,
            created_at: row.order.created_at.to_rfc3339(),
            location_latitude: row.order.location_latitude,
            location_longitude: row.order.location_longitude,
            amount_charged: row.order.amount_charged,
            user_agent: &row.order.user_agent,
            day_of_week: row.day_name(),
            time_of_day: row.time_of_day.as_str(),
            distance_from_center_km: row.distance_from_center_km,
            district: row.district.as_deref().unwrap_or_default(),
            okrug: row.okrug.as_deref().unwrap_or_default(),
        }
    }
}

/// Parse an ISO-8601 timestamp. Offsets are kept.
///
/// Order exports are expected to carry an offset. A timestamp without one is
/// accepted anyway and read as UTC, the same way the export was normalised
/// to UTC upstream.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    None
}

impl CsvOrder {
    /// Validate and convert; `row` is the 1-based data row for error reporting.
    pub fn to_order(&self, row: usize) -> Result<Order> {
        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| PipelineError::Timestamp {
            id: self.id.clone(),
            value: self.created_at.clone(),
        })?;

        if !(-90.0..=90.0).contains(&self.location_latitude) {
            return Err(PipelineError::MalformedRow {
                row,
                reason: format!("latitude {} out of range", self.location_latitude),
            });
        }
        if !(-180.0..=180.0).contains(&self.location_longitude) {
            return Err(PipelineError::MalformedRow {
                row,
                reason: format!("longitude {} out of range", self.location_longitude),
            });
        }
        if !self.amount_charged.is_finite() {
            return Err(PipelineError::MalformedRow {
                row,
                reason: "amount_charged is not a number".to_string(),
            });
        }

        Ok(Order {
            id: self.id.trim().to_string(),
            created_at,
            location_latitude: self.location_latitude,
            location_longitude: self.location_longitude,
            amount_charged: self.amount_charged,
            user_agent: self.user_agent.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn raw(created_at: &str, lat: f64) -> CsvOrder {
        CsvOrder {
            id: "42".into(),
            created_at: created_at.into(),
            location_latitude: lat,
            location_longitude: 37.6,
            amount_charged: 990.0,
            user_agent: "Android".into(),
        }
    }

    #[test]
    fn test_timestamp_formats() {
        let rfc = parse_timestamp("2021-12-01T07:15:00+03:00").unwrap();
        assert_eq!(rfc.hour(), 7);
        assert_eq!(rfc.offset().local_minus_utc(), 3 * 3600);

        let spaced = parse_timestamp("2021-12-01 07:15:00.123+00:00").unwrap();
        assert_eq!(spaced.hour(), 7);

        let naive = parse_timestamp("2021-12-01 23:59:59").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_timestamp_without_offset_is_utc() {
        let naive = parse_timestamp("2021-12-01T21:30:00").unwrap();
        let explicit = parse_timestamp("2021-12-01T21:30:00Z").unwrap();
        assert_eq!(naive, explicit);
        assert_eq!(naive.hour(), 21);
    }

    #[test]
    fn test_to_order_rejects_bad_rows() {
        assert!(matches!(
            raw("not a date", 55.7).to_order(1),
            Err(PipelineError::Timestamp { .. })
        ));
        assert!(matches!(
            raw("2021-12-01T07:15:00Z", 123.0).to_order(2),
            Err(PipelineError::MalformedRow { row: 2, .. })
        ));
        let order = raw("2021-12-01T07:15:00Z", 55.7).to_order(3).unwrap();
        assert_eq!(order.id, "42");
    }

    #[test]
    fn test_time_of_day_labels() {
        assert_eq!(TimeOfDay::Morning.to_string(), "morning");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }
}
