//! Group-by summaries over the enriched dataset, the tables the dashboard
//! charts are drawn from.

use std::collections::BTreeMap;

use chrono::Weekday;

use crate::models::{EnrichedOrder, TimeOfDay};
use crate::pipeline::EnrichedDataset;

/// Order count and mean charged amount for one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: String,
    pub orders: usize,
    pub mean_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayTimeStats {
    pub day_of_week: Weekday,
    pub time_of_day: TimeOfDay,
    pub orders: usize,
    pub mean_amount: f64,
}

#[derive(Default)]
struct Accumulator {
    orders: usize,
    total_amount: f64,
}

impl Accumulator {
    fn push(&mut self, amount: f64) {
        self.orders += 1;
        self.total_amount += amount;
    }

    fn mean(&self) -> f64 {
        if self.orders == 0 {
            0.0
        } else {
            self.total_amount / self.orders as f64
        }
    }
}

fn group_by<F>(dataset: &EnrichedDataset, key: F) -> Vec<GroupStats>
where
    F: Fn(&EnrichedOrder) -> Option<&str>,
{
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for row in dataset.iter() {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push(row.order.amount_charged);
        }
    }
    groups
        .into_iter()
        .map(|(key, acc)| GroupStats {
            key: key.to_string(),
            orders: acc.orders,
            mean_amount: acc.mean(),
        })
        .collect()
}

/// Per-district counts, sorted by district name
pub fn by_district(dataset: &EnrichedDataset) -> Vec<GroupStats> {
    group_by(dataset, |row| row.district.as_deref())
}

/// Per-okrug counts, sorted by okrug name
pub fn by_okrug(dataset: &EnrichedDataset) -> Vec<GroupStats> {
    group_by(dataset, |row| row.okrug.as_deref())
}

/// Counts per (weekday, bucket), Monday first, morning to night
pub fn by_weekday_time(dataset: &EnrichedDataset) -> Vec<WeekdayTimeStats> {
    let mut groups: BTreeMap<(u32, TimeOfDay), (Weekday, Accumulator)> = BTreeMap::new();
    for row in dataset.iter() {
        groups
            .entry((row.day_of_week.num_days_from_monday(), row.time_of_day))
            .or_insert_with(|| (row.day_of_week, Accumulator::default()))
            .1
            .push(row.order.amount_charged);
    }
    groups
        .into_iter()
        .map(|((_, time_of_day), (day_of_week, acc))| WeekdayTimeStats {
            day_of_week,
            time_of_day,
            orders: acc.orders,
            mean_amount: acc.mean(),
        })
        .collect()
}

/// Quantiles with linear interpolation between order statistics, used as
/// choropleth bin edges. Empty input yields no breaks.
pub fn quantile_breaks(values: &[f64], quantiles: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let last = (sorted.len() - 1) as f64;
    quantiles
        .iter()
        .map(|q| {
            let pos = q.clamp(0.0, 1.0) * last;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        })
        .collect()
}
