//! Order batch loading.
//!
//! Rows are parsed strictly: one malformed row fails the whole batch.

use csv::ReaderBuilder;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::{CsvOrder, Order};
use crate::source::RawSource;

/// Parse orders from CSV text, keeping at most `row_cap` rows (0 = all).
pub fn parse_orders(csv_text: &str, row_cap: usize) -> Result<Vec<Order>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let limit = if row_cap == 0 { usize::MAX } else { row_cap };
    let mut orders = Vec::new();

    for (i, record) in reader.deserialize::<CsvOrder>().take(limit).enumerate() {
        let row = i + 1;
        let record = record.map_err(|e| PipelineError::MalformedRow {
            row,
            reason: e.to_string(),
        })?;
        orders.push(record.to_order(row)?);
    }

    Ok(orders)
}

/// Load the order batch from a `.csv` or zipped csv source.
pub fn load_orders(source: &RawSource, row_cap: usize) -> Result<Vec<Order>> {
    info!("Reading orders from {:?}", source.path);
    let text = source.text(&[".csv"])?;
    let orders = parse_orders(&text, row_cap)?;
    info!("Parsed {} orders (row cap {})", orders.len(), row_cap);
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id,created_at,address_full,location_latitude,location_longitude,amount_charged,user_agent,phone_number
1,2021-12-01 07:10:00+00:00,\"Tverskaya 1\",55.757,37.615,450.0,Android,+7000
2,2021-12-01 20:45:00+00:00,\"Arbat 10\",55.749,37.591,1200.5,iOS,+7001
3,2021-12-02 02:05:00+00:00,\"Lenina 3\",55.700,37.500,99.0,,+7002
";

    #[test]
    fn test_parse_ignores_personal_columns() {
        let orders = parse_orders(SAMPLE, 0).unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[1].id, "2");
        assert_eq!(orders[1].amount_charged, 1200.5);
        assert_eq!(orders[2].user_agent, "");
    }

    #[test]
    fn test_row_cap_trims_batch() {
        let orders = parse_orders(SAMPLE, 2).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "1");
    }

    #[test]
    fn test_bad_timestamp_fails_whole_batch() {
        let csv = "\
id,created_at,location_latitude,location_longitude,amount_charged,user_agent
1,2021-12-01 07:10:00+00:00,55.75,37.61,100,a
2,whenever,55.75,37.61,100,b
";
        let err = parse_orders(csv, 0).unwrap_err();
        assert!(matches!(err, PipelineError::Timestamp { ref id, .. } if id == "2"));
    }

    #[test]
    fn test_non_numeric_latitude_is_malformed() {
        let csv = "\
id,created_at,location_latitude,location_longitude,amount_charged,user_agent
1,2021-12-01 07:10:00+00:00,north,37.61,100,a
";
        let err = parse_orders(csv, 0).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let csv = "id,created_at\n1,2021-12-01 07:10:00+00:00\n";
        assert!(parse_orders(csv, 0).is_err());
    }
}
