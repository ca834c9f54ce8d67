//! Boundary catalog: districts inside the city outline, tagged with their okrug.
//!
//! Boundary data comes from osm-boundaries style GeoJSON feature collections
//! where each feature carries its name in a `local_name` property.

use std::path::Path;

use geo::{Contains, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::source::{RawSource, SourceSnapshot};

const GEOJSON_EXTENSIONS: &[&str] = &[".geojson", ".json"];

/// A named administrative polygon from one of the boundary sources
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArea {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// One district polygon paired with the okrug that encloses it
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRecord {
    pub district: String,
    pub okrug: String,
    pub polygon: MultiPolygon<f64>,
}

/// Counts gathered while reconciling the three sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub districts_total: usize,
    pub outside_city: usize,
    pub without_okrug: usize,
    /// Districts enclosed by more than one okrug; the first one wins
    pub ambiguous_okrug: usize,
}

/// Immutable lookup table of district/okrug polygons, in district source order
#[derive(Debug, Clone, Default)]
pub struct BoundaryCatalog {
    records: Vec<BoundaryRecord>,
    stats: CatalogStats,
}

fn to_multipolygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        geo::Geometry::MultiPolygon(multi) => Some(multi),
        _ => None,
    }
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn feature_geometry(feature: Feature, index: usize, source_name: &str) -> Result<MultiPolygon<f64>> {
    let geometry = feature
        .geometry
        .ok_or_else(|| PipelineError::geometry(source_name, format!("feature {} has no geometry", index)))?;
    let kind = geometry_kind(&geometry.value);
    let converted = geo::Geometry::<f64>::try_from(geometry.value)
        .map_err(|e| PipelineError::geometry(source_name, format!("feature {}: {}", index, e)))?;
    to_multipolygon(converted).ok_or_else(|| {
        PipelineError::geometry(
            source_name,
            format!("feature {} is a {}, expected Polygon or MultiPolygon", index, kind),
        )
    })
}

fn parse_features(text: &str, source_name: &str) -> Result<Vec<Feature>> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| PipelineError::geometry(source_name, e.to_string()))?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(PipelineError::geometry(
            source_name,
            "expected a Feature or FeatureCollection, found a bare Geometry",
        )),
    }
}

/// Parse a feature collection of named polygons.
pub fn parse_areas(text: &str, source_name: &str, name_property: &str) -> Result<Vec<NamedArea>> {
    parse_features(text, source_name)?
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let name = feature
                .property(name_property)
                .and_then(JsonValue::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    PipelineError::geometry(
                        source_name,
                        format!("feature {} has no `{}` property", index, name_property),
                    )
                })?;
            let geometry = feature_geometry(feature, index, source_name)?;
            Ok(NamedArea { name, geometry })
        })
        .collect()
}

/// Parse the city outline: the first feature of the collection.
pub fn parse_outline(text: &str, source_name: &str) -> Result<MultiPolygon<f64>> {
    let feature = parse_features(text, source_name)?
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::geometry(source_name, "collection has no features"))?;
    feature_geometry(feature, 0, source_name)
}

pub fn load_areas(source: &RawSource, source_name: &str, name_property: &str) -> Result<Vec<NamedArea>> {
    let text = source.text(GEOJSON_EXTENSIONS)?;
    let areas = parse_areas(&text, source_name, name_property)?;
    info!("Loaded {} {} polygons from {:?}", areas.len(), source_name, source.path);
    Ok(areas)
}

pub fn load_outline(source: &RawSource, source_name: &str) -> Result<MultiPolygon<f64>> {
    let text = source.text(GEOJSON_EXTENSIONS)?;
    parse_outline(&text, source_name)
}

impl BoundaryCatalog {
    /// Reconcile the three sources.
    ///
    /// A district is kept only if the outline covers it entirely. Its okrug is
    /// the first okrug polygon (in source order) that covers it; districts no
    /// okrug covers are left out.
    pub fn build(districts: &[NamedArea], city_outline: &MultiPolygon<f64>, okruga: &[NamedArea]) -> Self {
        enum Outcome {
            Outside,
            Orphan,
            Kept(BoundaryRecord, usize),
        }

        let outcomes: Vec<Outcome> = districts
            .par_iter()
            .map(|district| {
                if !city_outline.contains(&district.geometry) {
                    return Outcome::Outside;
                }
                let mut enclosing = okruga
                    .iter()
                    .filter(|okrug| okrug.geometry.contains(&district.geometry));
                let Some(first) = enclosing.next() else {
                    return Outcome::Orphan;
                };
                let extra = enclosing.count();
                Outcome::Kept(
                    BoundaryRecord {
                        district: district.name.clone(),
                        okrug: first.name.clone(),
                        polygon: district.geometry.clone(),
                    },
                    extra,
                )
            })
            .collect();

        let mut stats = CatalogStats {
            districts_total: districts.len(),
            ..CatalogStats::default()
        };
        let mut records = Vec::with_capacity(outcomes.len());

        for (district, outcome) in districts.iter().zip(outcomes) {
            match outcome {
                Outcome::Outside => stats.outside_city += 1,
                Outcome::Orphan => {
                    warn!("District {} lies in the city but in no okrug", district.name);
                    stats.without_okrug += 1;
                }
                Outcome::Kept(record, extra) => {
                    if extra > 0 {
                        warn!(
                            "District {} is covered by {} okruga, using {}",
                            record.district,
                            extra + 1,
                            record.okrug
                        );
                        stats.ambiguous_okrug += 1;
                    }
                    records.push(record);
                }
            }
        }

        info!(
            "Boundary catalog: {} districts kept of {} ({} outside city, {} without okrug)",
            records.len(),
            stats.districts_total,
            stats.outside_city,
            stats.without_okrug
        );

        Self { records, stats }
    }

    /// Parse the three boundary sources of a snapshot and build the catalog.
    pub fn from_sources(sources: &SourceSnapshot, name_property: &str) -> Result<Self> {
        let districts = load_areas(&sources.districts, "districts", name_property)?;
        let outline = load_outline(&sources.city_outline, "city_outline")?;
        let okruga = load_areas(&sources.okruga, "okruga", name_property)?;
        Ok(Self::build(&districts, &outline, &okruga))
    }

    pub fn records(&self) -> &[BoundaryRecord] {
        &self.records
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn district(&self, name: &str) -> Option<&BoundaryRecord> {
        self.records.iter().find(|r| r.district == name)
    }

    /// Catalog as a FeatureCollection with `district` and `okrug` properties
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .records
            .iter()
            .map(|record| {
                let mut properties = JsonObject::new();
                properties.insert("district".to_string(), JsonValue::from(record.district.clone()));
                properties.insert("okrug".to_string(), JsonValue::from(record.okrug.clone()));
                Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&record.polygon))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_geojson().to_string())?;
        info!("Wrote {} catalog features to {:?}", self.len(), path);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use geo::{polygon, Intersects, Point};

    /// Axis-aligned square as a multipolygon, in lon/lat order
    pub(crate) fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min_x, y: min_y),
            (x: max_x, y: min_y),
            (x: max_x, y: max_y),
            (x: min_x, y: max_y),
            (x: min_x, y: min_y),
        ]])
    }

    pub(crate) fn area(name: &str, geometry: MultiPolygon<f64>) -> NamedArea {
        NamedArea {
            name: name.to_string(),
            geometry,
        }
    }

    #[test]
    fn test_build_keeps_only_enclosed_districts() {
        let outline = square(0.0, 0.0, 10.0, 10.0);
        let districts = vec![
            area("inside", square(1.0, 1.0, 2.0, 2.0)),
            area("straddling", square(9.0, 9.0, 11.0, 11.0)),
            area("outside", square(20.0, 20.0, 21.0, 21.0)),
            area("edge", square(0.0, 0.0, 1.0, 1.0)),
        ];
        let okruga = vec![area("whole", square(0.0, 0.0, 10.0, 10.0))];

        let catalog = BoundaryCatalog::build(&districts, &outline, &okruga);
        let names: Vec<&str> = catalog.records().iter().map(|r| r.district.as_str()).collect();
        assert_eq!(names, vec!["inside", "edge"]);
        assert_eq!(catalog.stats().outside_city, 2);

        for record in catalog.records() {
            assert!(outline.contains(&record.polygon));
        }
    }

    #[test]
    fn test_first_enclosing_okrug_wins() {
        let outline = square(0.0, 0.0, 10.0, 10.0);
        let districts = vec![area("d", square(1.0, 1.0, 2.0, 2.0))];
        let okruga = vec![
            area("elsewhere", square(5.0, 5.0, 10.0, 10.0)),
            area("first", square(0.0, 0.0, 5.0, 5.0)),
            area("second", square(0.0, 0.0, 10.0, 10.0)),
        ];

        let catalog = BoundaryCatalog::build(&districts, &outline, &okruga);
        assert_eq!(catalog.records()[0].okrug, "first");
        assert_eq!(catalog.stats().ambiguous_okrug, 1);
    }

    #[test]
    fn test_district_without_okrug_is_left_out() {
        let outline = square(0.0, 0.0, 10.0, 10.0);
        let districts = vec![
            area("orphan", square(6.0, 6.0, 7.0, 7.0)),
            area("kept", square(1.0, 1.0, 2.0, 2.0)),
        ];
        let okruga = vec![area("south-west", square(0.0, 0.0, 5.0, 5.0))];

        let catalog = BoundaryCatalog::build(&districts, &outline, &okruga);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].district, "kept");
        assert_eq!(catalog.stats().without_okrug, 1);
    }

    #[test]
    fn test_parse_areas_polygon_and_multipolygon() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"local_name": "Arbat"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {"local_name": "Zelenograd"},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[2,2],[3,2],[3,3],[2,3],[2,2]]],
                    [[[4,4],[5,4],[5,5],[4,5],[4,4]]]
                 ]}}
            ]
        }"#;
        let areas = parse_areas(text, "districts", "local_name").unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].name, "Arbat");
        assert_eq!(areas[1].geometry.0.len(), 2);
        assert!(areas[0].geometry.intersects(&Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_parse_rejects_malformed_sources() {
        assert!(matches!(
            parse_areas("{not json", "districts", "local_name"),
            Err(PipelineError::Geometry { .. })
        ));

        let point_feature = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"local_name": "x"},
             "geometry": {"type": "Point", "coordinates": [1, 2]}}]}"#;
        let err = parse_areas(point_feature, "okruga", "local_name").unwrap_err();
        assert!(err.to_string().contains("Point"));

        let unnamed = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}]}"#;
        assert!(parse_areas(unnamed, "okruga", "local_name").is_err());
        assert!(parse_outline(unnamed, "city_outline").is_ok());

        let empty = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(parse_outline(empty, "city_outline").is_err());
    }

    #[test]
    fn test_geojson_export_properties() {
        let outline = square(0.0, 0.0, 10.0, 10.0);
        let districts = vec![area("Tverskoy", square(1.0, 1.0, 2.0, 2.0))];
        let okruga = vec![area("Central", square(0.0, 0.0, 10.0, 10.0))];
        let catalog = BoundaryCatalog::build(&districts, &outline, &okruga);

        let exported = catalog.to_geojson().to_string();
        let reparsed = parse_areas(&exported, "export", "district").unwrap();
        assert_eq!(reparsed[0].name, "Tverskoy");
        assert_eq!(reparsed[0].geometry, catalog.records()[0].polygon);
        assert!(exported.contains("\"okrug\":\"Central\""));
    }
}
