//! Order density hotspots for synthetic data generation
//!
//! Rough demand centres across Moscow and the nearby suburbs. Weights are
//! relative. The last group lies outside the city outline.

use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::*;

/// One demand centre
#[derive(Debug, Clone, Copy)]
pub struct Hotspot {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub weight: u32,
}

/// (name, lat, lon, radius_km, weight)
pub const HOTSPOTS: &[(&str, f64, f64, f64, u32)] = &[
    // ===== CENTRE =====
    ("Kitay-gorod", 55.7557, 37.6300, 1.5, 60),
    ("Tverskaya", 55.7650, 37.6040, 2.0, 55),
    ("Arbat", 55.7494, 37.5900, 1.5, 40),
    ("Zamoskvorechye", 55.7360, 37.6330, 2.0, 35),
    ("Presnya / Moscow City", 55.7490, 37.5390, 1.5, 45),
    // ===== RESIDENTIAL =====
    ("Maryino", 55.6500, 37.7440, 3.0, 30),
    ("Butovo", 55.5450, 37.5600, 3.0, 22),
    ("Medvedkovo", 55.8870, 37.6530, 2.5, 20),
    ("Strogino", 55.8040, 37.4020, 2.5, 20),
    ("Vykhino", 55.7160, 37.8180, 2.5, 18),
    ("Zelenograd", 55.9910, 37.2140, 3.0, 8),
    // ===== OUTSIDE THE CITY =====
    ("Khimki", 55.8890, 37.4450, 3.0, 6),
    ("Balashikha", 55.7960, 37.9380, 3.0, 6),
    ("Podolsk", 55.4310, 37.5450, 3.0, 4),
];

const KM_PER_DEG_LAT: f64 = 111.2;

/// Samples coordinates around hotspots in proportion to their weight
pub struct HotspotSampler {
    hotspots: Vec<Hotspot>,
    index: WeightedIndex<u32>,
}

impl HotspotSampler {
    pub fn new() -> Result<Self, WeightedError> {
        let hotspots: Vec<Hotspot> = HOTSPOTS
            .iter()
            .map(|&(name, latitude, longitude, radius_km, weight)| Hotspot {
                name,
                latitude,
                longitude,
                radius_km,
                weight,
            })
            .collect();
        let index = WeightedIndex::new(hotspots.iter().map(|h| h.weight))?;
        Ok(Self { hotspots, index })
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    /// Pick a hotspot, then a uniform point within its radius
    pub fn sample(&self, rng: &mut impl Rng) -> (&Hotspot, f64, f64) {
        let hotspot = &self.hotspots[self.index.sample(rng)];
        let r = hotspot.radius_km * rng.gen::<f64>().sqrt();
        let theta = rng.gen_range(0.0..std::f64::consts::TAU);
        let dlat = r * theta.sin() / KM_PER_DEG_LAT;
        let dlon = r * theta.cos() / (KM_PER_DEG_LAT * hotspot.latitude.to_radians().cos());
        (hotspot, hotspot.latitude + dlat, hotspot.longitude + dlon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeoCoordinate;
    use crate::distance::geodesic_km;
    use std::collections::HashMap;

    #[test]
    fn test_samples_stay_within_radius() {
        let sampler = HotspotSampler::new().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        for _ in 0..2000 {
            let (hotspot, lat, lon) = sampler.sample(&mut rng);
            let km = geodesic_km(
                GeoCoordinate::new(hotspot.latitude, hotspot.longitude),
                GeoCoordinate::new(lat, lon),
            );
            assert!(km <= hotspot.radius_km * 1.02, "{} sample {km} km out", hotspot.name);
        }
    }

    #[test]
    fn test_weighting_favours_centre() {
        let sampler = HotspotSampler::new().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..10000 {
            let (hotspot, _, _) = sampler.sample(&mut rng);
            *counts.entry(hotspot.name).or_insert(0) += 1;
        }

        let centre = counts.get("Kitay-gorod").unwrap_or(&0);
        let podolsk = counts.get("Podolsk").unwrap_or(&0);
        assert!(centre > podolsk, "weighting not applied: {centre} vs {podolsk}");
    }
}
