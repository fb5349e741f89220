//! Feature model shared by the boundary layers and the submission points.
//!
//! Parsing and serialization go through the `geojson` crate; this module only
//! maps its loosely typed positions onto [`LonLat`] and rejects what the map
//! cannot draw (missing geometry, geometry collections, short positions).

use foundation::geo::LonLat;
use ::geojson::GeoJson;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    /// Outer ring first, holes after.
    Polygon(Vec<Vec<LonLat>>),
    MultiPolygon(Vec<Vec<Vec<LonLat>>>),
}

/// Feature `id` as it appeared in the source: string or number.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureId {
    Number(Number),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<FeatureId>,
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            properties,
            geometry,
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Ordered GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("GeoJSON parse error: {0}")]
    Parse(#[from] ::geojson::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parses a boundary file. Anything but a `FeatureCollection` is rejected,
    /// as is the first feature the map cannot draw.
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let GeoJson::FeatureCollection(collection) = payload.parse::<GeoJson>()? else {
            return Err(GeoJsonError::NotAFeatureCollection);
        };
        let features = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, f)| {
                from_feature(f).map_err(|reason| GeoJsonError::InvalidFeature { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { features })
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&to_collection(self))
    }

    pub fn to_geojson_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&to_collection(self))
    }
}

fn from_feature(feature: ::geojson::Feature) -> Result<Feature, String> {
    let geometry = feature
        .geometry
        .ok_or_else(|| "feature has no geometry".to_string())?;
    let id = feature.id.map(|id| match id {
        ::geojson::feature::Id::String(s) => FeatureId::Text(s),
        ::geojson::feature::Id::Number(n) => FeatureId::Number(n),
    });
    Ok(Feature {
        id,
        properties: feature.properties.unwrap_or_default(),
        geometry: from_value(geometry.value)?,
    })
}

fn from_value(value: ::geojson::Value) -> Result<Geometry, String> {
    use ::geojson::Value as V;
    Ok(match value {
        V::Point(p) => Geometry::Point(lon_lat(&p)?),
        V::MultiPoint(ps) => Geometry::MultiPoint(line(&ps)?),
        V::LineString(ps) => Geometry::LineString(line(&ps)?),
        V::MultiLineString(ls) => Geometry::MultiLineString(rings(&ls)?),
        V::Polygon(rs) => Geometry::Polygon(rings(&rs)?),
        V::MultiPolygon(polys) => Geometry::MultiPolygon(
            polys.iter().map(|p| rings(p)).collect::<Result<_, _>>()?,
        ),
        V::GeometryCollection(_) => return Err("geometry collections are not drawn".to_string()),
    })
}

/// Altitude and any further ordinates are dropped.
fn lon_lat(position: &[f64]) -> Result<LonLat, String> {
    match position {
        [lon, lat, ..] => Ok(LonLat::new(*lon, *lat)),
        _ => Err(format!("position needs [lon, lat], got {position:?}")),
    }
}

fn line(positions: &[Vec<f64>]) -> Result<Vec<LonLat>, String> {
    positions.iter().map(|p| lon_lat(p)).collect()
}

fn rings(lines: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<LonLat>>, String> {
    lines.iter().map(|l| line(l)).collect()
}

fn to_collection(collection: &FeatureCollection) -> ::geojson::FeatureCollection {
    ::geojson::FeatureCollection {
        bbox: None,
        features: collection.features.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}

fn to_feature(feature: &Feature) -> ::geojson::Feature {
    let id = feature.id.as_ref().map(|id| match id {
        FeatureId::Text(s) => ::geojson::feature::Id::String(s.clone()),
        FeatureId::Number(n) => ::geojson::feature::Id::Number(n.clone()),
    });
    ::geojson::Feature {
        bbox: None,
        geometry: Some(::geojson::Geometry::new(to_value(&feature.geometry))),
        id,
        properties: Some(feature.properties.clone()),
        foreign_members: None,
    }
}

fn to_value(geometry: &Geometry) -> ::geojson::Value {
    use ::geojson::Value as V;
    match geometry {
        Geometry::Point(p) => V::Point(to_position(p)),
        Geometry::MultiPoint(ps) => V::MultiPoint(to_line(ps)),
        Geometry::LineString(ps) => V::LineString(to_line(ps)),
        Geometry::MultiLineString(ls) => V::MultiLineString(to_rings(ls)),
        Geometry::Polygon(rs) => V::Polygon(to_rings(rs)),
        Geometry::MultiPolygon(polys) => V::MultiPolygon(polys.iter().map(|p| to_rings(p)).collect()),
    }
}

fn to_position(p: &LonLat) -> Vec<f64> {
    vec![p.lon, p.lat]
}

fn to_line(ps: &[LonLat]) -> Vec<Vec<f64>> {
    ps.iter().map(to_position).collect()
}

fn to_rings(rs: &[Vec<LonLat>]) -> Vec<Vec<Vec<f64>>> {
    rs.iter().map(|r| to_line(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::{Feature, FeatureCollection, FeatureId, GeoJsonError, Geometry};
    use foundation::geo::LonLat;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    fn parse(v: Value) -> Result<FeatureCollection, GeoJsonError> {
        FeatureCollection::from_geojson_str(&v.to_string())
    }

    #[test]
    fn reads_county_with_hole() {
        let fc = parse(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "fips": "06075", "name": "San Francisco" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                        [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(fc.len(), 1);
        let Geometry::Polygon(rings) = &fc.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[1][1], LonLat::new(2.0, 1.0));
        assert_eq!(fc.features[0].property("fips"), Some(&json!("06075")));
    }

    #[test]
    fn multipolygon_units_keep_every_part() {
        let square = |w: f64| json!([[[w, 0.0], [w + 1.0, 0.0], [w + 1.0, 1.0], [w, 0.0]]]);
        let fc = parse(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "fips": "06001" },
                "geometry": { "type": "MultiPolygon", "coordinates": [square(0.0), square(5.0)] }
            }]
        }))
        .unwrap();
        let Geometry::MultiPolygon(parts) = &fc.features[0].geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1][0][0], LonLat::new(5.0, 0.0));
    }

    #[test]
    fn emitted_points_are_lon_first() {
        let mut props = Map::new();
        props.insert("id".to_string(), json!(3));
        let fc = FeatureCollection::new(vec![Feature::new(
            Geometry::Point(LonLat::new(-122.4, 37.7)),
            props,
        )]);
        let v: Value = serde_json::from_str(&fc.to_geojson_string().unwrap()).unwrap();
        assert_eq!(v["type"], json!("FeatureCollection"));
        assert_eq!(v["features"][0]["geometry"]["coordinates"], json!([-122.4, 37.7]));
        assert_eq!(v["features"][0]["properties"]["id"], json!(3));
    }

    #[test]
    fn rejects_single_feature_document() {
        let err = parse(json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
        }))
        .unwrap_err();
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection));
    }

    #[test]
    fn reports_index_of_undrawable_feature() {
        let err = parse(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, GeoJsonError::InvalidFeature { index: 1, .. }));
    }

    #[test]
    fn short_positions_are_rejected() {
        let result = parse(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1.0] } }
            ]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn feature_ids_keep_their_type() {
        let fc = parse(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": 42, "properties": {}, "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
                { "type": "Feature", "id": "06075", "properties": {}, "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } }
            ]
        }))
        .unwrap();
        assert_eq!(fc.features[0].id, Some(FeatureId::Number(42.into())));
        assert_eq!(fc.features[1].id, Some(FeatureId::Text("06075".to_string())));

        let out: Value = serde_json::from_str(&fc.to_geojson_string().unwrap()).unwrap();
        assert_eq!(out["features"][0]["id"], json!(42));
        assert_eq!(out["features"][1]["id"], json!("06075"));
    }
}
