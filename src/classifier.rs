//! Point-in-district classification.
//!
//! District bounding rectangles are bucketed into a uniform grid. A lookup
//! only tests the records listed in the point's cell, in catalog order, so
//! the earliest matching district wins exactly as a plain scan would.

use std::sync::Arc;

use geo::{BoundingRect, Coord, Intersects, Point, Rect};

use crate::boundaries::{BoundaryCatalog, BoundaryRecord};
use crate::models::EnrichedOrder;

const MAX_CELLS_PER_AXIS: usize = 64;

/// Record indices per grid cell over the catalog's extent
#[derive(Debug, Default)]
struct GridIndex {
    extent: Option<Rect<f64>>,
    columns: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl GridIndex {
    fn build(catalog: &BoundaryCatalog) -> Self {
        let bounds: Vec<(usize, Rect<f64>)> = catalog
            .records()
            .iter()
            .enumerate()
            .filter_map(|(i, record)| record.polygon.bounding_rect().map(|rect| (i, rect)))
            .collect();

        let Some(extent) = bounds.iter().map(|(_, rect)| *rect).reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        }) else {
            return Self::default();
        };

        let side = ((bounds.len() as f64).sqrt().ceil() as usize * 2).clamp(1, MAX_CELLS_PER_AXIS);
        let mut grid = Self {
            extent: Some(extent),
            columns: side,
            rows: side,
            cells: vec![Vec::new(); side * side],
        };

        // records are visited in catalog order, so every cell list stays sorted
        for (i, rect) in bounds {
            let (c0, r0) = grid.cell_of(rect.min());
            let (c1, r1) = grid.cell_of(rect.max());
            for row in r0..=r1 {
                for col in c0..=c1 {
                    grid.cells[row * grid.columns + col].push(i);
                }
            }
        }
        grid
    }

    fn cell_of(&self, coord: Coord<f64>) -> (usize, usize) {
        let Some(extent) = self.extent else {
            return (0, 0);
        };
        let axis = |value: f64, min: f64, span: f64, count: usize| {
            if span <= 0.0 {
                return 0;
            }
            let pos = ((value - min) / span * count as f64).floor();
            (pos.max(0.0) as usize).min(count - 1)
        };
        (
            axis(coord.x, extent.min().x, extent.width(), self.columns),
            axis(coord.y, extent.min().y, extent.height(), self.rows),
        )
    }

    fn candidates(&self, coord: Coord<f64>) -> &[usize] {
        match self.extent {
            Some(extent) if extent.intersects(&coord) => {
                let (col, row) = self.cell_of(coord);
                self.cells[row * self.columns + col].as_slice()
            }
            _ => &[],
        }
    }
}

/// Shared, read-only classifier over a built catalog
#[derive(Debug, Clone)]
pub struct GeoClassifier {
    catalog: Arc<BoundaryCatalog>,
    index: Arc<GridIndex>,
}

impl GeoClassifier {
    pub fn new(catalog: Arc<BoundaryCatalog>) -> Self {
        let index = GridIndex::build(&catalog);
        Self {
            catalog,
            index: Arc::new(index),
        }
    }

    pub fn catalog(&self) -> &BoundaryCatalog {
        &self.catalog
    }

    /// First catalog record whose polygon contains the point, boundary included
    pub fn locate(&self, latitude: f64, longitude: f64) -> Option<&BoundaryRecord> {
        let point = Point::new(longitude, latitude);
        let records = self.catalog.records();
        self.index
            .candidates(point.0)
            .iter()
            .map(|&i| &records[i])
            .find(|record| record.polygon.intersects(&point))
    }

    /// Unindexed scan over the whole catalog
    pub fn locate_linear(&self, latitude: f64, longitude: f64) -> Option<&BoundaryRecord> {
        let point = Point::new(longitude, latitude);
        self.catalog
            .records()
            .iter()
            .find(|record| record.polygon.intersects(&point))
    }

    /// Tag the order with its district and okrug. Returns whether it matched;
    /// unmatched orders have both fields cleared.
    pub fn classify(&self, order: &mut EnrichedOrder) -> bool {
        match self.locate(order.order.location_latitude, order.order.location_longitude) {
            Some(record) => {
                order.district = Some(record.district.clone());
                order.okrug = Some(record.okrug.clone());
                true
            }
            None => {
                order.district = None;
                order.okrug = None;
                false
            }
        }
    }
}
