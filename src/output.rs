//! Writing the enriched dataset for downstream consumers

use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::error::Result;
use crate::models::CsvEnrichedOrder;
use crate::pipeline::EnrichedDataset;

/// Write the dataset as CSV to any writer, header first.
pub fn write_enriched<W: std::io::Write>(writer: W, dataset: &EnrichedDataset) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in dataset.iter() {
        writer.serialize(CsvEnrichedOrder::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_enriched_csv(path: &Path, dataset: &EnrichedDataset) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_enriched(std::io::BufWriter::new(file), dataset)?;
    info!("Wrote {} enriched orders to {:?}", dataset.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_timestamp, EnrichedOrder, Order, TimeOfDay};
    use chrono::Weekday;

    #[test]
    fn test_column_order_and_values() {
        let (dataset, _) = EnrichedDataset::from_classified(vec![EnrichedOrder {
            order: Order {
                id: "17".into(),
                created_at: parse_timestamp("2021-12-01T07:15:00+00:00").unwrap(),
                location_latitude: 55.75,
                location_longitude: 37.62,
                amount_charged: 450.5,
                user_agent: "Android 12".into(),
            },
            day_of_week: Weekday::Wed,
            time_of_day: TimeOfDay::Morning,
            distance_from_center_km: 0.25,
            district: Some("Tverskoy".into()),
            okrug: Some("Central".into()),
        }]);

        let mut buf = Vec::new();
        write_enriched(&mut buf, &dataset).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,created_at,location_latitude,location_longitude,amount_charged,user_agent,day_of_week,time_of_day,distance_from_center_km,district,okrug"
        );
        assert_eq!(
            lines.next().unwrap(),
            "17,2021-12-01T07:15:00+00:00,55.75,37.62,450.5,Android 12,Wednesday,morning,0.25,Tverskoy,Central"
        );
        assert!(lines.next().is_none());
    }
}
