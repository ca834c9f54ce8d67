//! Geodesic distance to the reference point.
//!
//! Uses Karney's algorithm on the WGS-84 ellipsoid via `geo`.

use geo::{GeodesicDistance, Point};

use crate::config::GeoCoordinate;

/// Kilometers between two coordinates along the ellipsoid
pub fn geodesic_km(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let pa = Point::new(a.longitude, a.latitude);
    let pb = Point::new(b.longitude, b.latitude);
    pa.geodesic_distance(&pb) / 1000.0
}

/// Distance from a fixed reference coordinate
#[derive(Debug, Clone, Copy)]
pub struct DistanceFromCenter {
    center: GeoCoordinate,
}

impl DistanceFromCenter {
    pub fn new(center: GeoCoordinate) -> Self {
        Self { center }
    }

    pub fn center(&self) -> GeoCoordinate {
        self.center
    }

    pub fn km(&self, latitude: f64, longitude: f64) -> f64 {
        geodesic_km(GeoCoordinate::new(latitude, longitude), self.center)
    }
}

impl Default for DistanceFromCenter {
    fn default() -> Self {
        Self::new(GeoCoordinate::city_center())
    }
}
