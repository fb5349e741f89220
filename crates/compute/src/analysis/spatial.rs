use foundation::bounds::Aabb2;
use foundation::geo::LonLat;
use formats::geojson::{Feature, FeatureCollection, Geometry};

/// Where a position falls relative to a single ring.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RingSide {
    Outside,
    Boundary,
    Inside,
}

pub struct SpatialAnalysis;

impl SpatialAnalysis {
    /// Planar ray casting against one ring, with an exact on-edge check first.
    ///
    /// The ring may be given open or closed (first vertex repeated). Rings with
    /// fewer than three vertices enclose nothing, but their edges still count
    /// as boundary.
    pub fn ring_side(p: LonLat, ring: &[LonLat]) -> RingSide {
        let n = ring.len();
        if n == 0 {
            return RingSide::Outside;
        }

        let mut inside = false;
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if on_segment(p, a, b) {
                return RingSide::Boundary;
            }
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let x = a.lon + (p.lat - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
                if p.lon < x {
                    inside = !inside;
                }
            }
        }

        if inside && n >= 3 {
            RingSide::Inside
        } else {
            RingSide::Outside
        }
    }

    /// Closed polygon membership.
    ///
    /// Boundary convention:
    /// - a position on the outer ring is inside;
    /// - a position strictly inside a hole is outside;
    /// - a position on a hole's ring is inside (the hole is open).
    pub fn polygon_contains(p: LonLat, rings: &[Vec<LonLat>]) -> bool {
        let Some(outer) = rings.first() else {
            return false;
        };
        match Self::ring_side(p, outer) {
            RingSide::Outside => false,
            RingSide::Boundary => true,
            RingSide::Inside => rings[1..]
                .iter()
                .all(|hole| Self::ring_side(p, hole) != RingSide::Inside),
        }
    }

    /// Polygon parts of an areal geometry; empty for anything else.
    pub fn polygons(geometry: &Geometry) -> &[Vec<Vec<LonLat>>] {
        match geometry {
            Geometry::Polygon(rings) => std::slice::from_ref(rings),
            Geometry::MultiPolygon(polys) => polys,
            _ => &[],
        }
    }

    pub fn geometry_contains(geometry: &Geometry, p: LonLat) -> bool {
        Self::polygons(geometry)
            .iter()
            .any(|rings| Self::polygon_contains(p, rings))
    }

    /// Extent of every outer ring of an areal geometry.
    pub fn polygon_bounds(geometry: &Geometry) -> Option<Aabb2> {
        Self::polygons(geometry)
            .iter()
            .filter_map(|rings| rings.first())
            .filter_map(|outer| Aabb2::from_positions(outer))
            .reduce(|a, b| a.union(&b))
    }
}

/// Points of `points` lying inside or on the boundary of `polygon`, in input
/// order.
///
/// Non-areal `polygon` geometry and empty input yield an empty collection.
/// Non-point features in `points` are skipped.
pub fn points_within(points: &FeatureCollection, polygon: &Feature) -> FeatureCollection {
    let Some(bounds) = SpatialAnalysis::polygon_bounds(&polygon.geometry) else {
        return FeatureCollection::default();
    };

    let features = points
        .features
        .iter()
        .filter(|f| match f.geometry {
            Geometry::Point(p) => {
                bounds.contains(p) && SpatialAnalysis::geometry_contains(&polygon.geometry, p)
            }
            _ => false,
        })
        .cloned()
        .collect();

    FeatureCollection::new(features)
}

fn on_segment(p: LonLat, a: LonLat, b: LonLat) -> bool {
    let cross = (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon);
    cross == 0.0
        && p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

#[cfg(test)]
mod tests {
    use super::{RingSide, SpatialAnalysis, points_within};
    use foundation::geo::LonLat;
    use formats::geojson::{Feature, FeatureCollection, Geometry};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    fn ring(coords: &[[f64; 2]]) -> Vec<LonLat> {
        coords.iter().copied().map(LonLat::from).collect()
    }

    fn square_with_hole() -> Feature {
        Feature::new(
            Geometry::Polygon(vec![
                ring(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]),
                ring(&[[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]]),
            ]),
            Map::new(),
        )
    }

    fn point(id: i64, lon: f64, lat: f64) -> Feature {
        let mut props = Map::new();
        props.insert("id".to_string(), json!(id));
        Feature::new(Geometry::Point(LonLat::new(lon, lat)), props)
    }

    fn ids(fc: &FeatureCollection) -> Vec<i64> {
        fc.features
            .iter()
            .map(|f| f.property("id").and_then(|v| v.as_i64()).unwrap())
            .collect()
    }

    #[test]
    fn selects_points_inside_in_input_order() {
        let points = FeatureCollection::new(vec![
            point(3, 9.0, 9.0),
            point(1, 20.0, 5.0),
            point(2, 1.0, 1.0),
        ]);
        let got = points_within(&points, &square_with_hole());
        assert_eq!(ids(&got), vec![3, 2]);
    }

    #[test]
    fn hole_interior_is_excluded() {
        let points = FeatureCollection::new(vec![point(1, 5.0, 5.0), point(2, 2.0, 5.0)]);
        assert_eq!(ids(&points_within(&points, &square_with_hole())), vec![2]);
    }

    #[test]
    fn boundary_points_are_inside() {
        let points = FeatureCollection::new(vec![
            point(1, 10.0, 5.0), // outer edge
            point(2, 0.0, 0.0),  // outer vertex
            point(3, 4.0, 5.0),  // hole edge
            point(4, 6.0, 6.0),  // hole vertex
        ]);
        assert_eq!(
            ids(&points_within(&points, &square_with_hole())),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn ring_side_reports_boundary_for_open_rings_too() {
        let open = ring(&[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]);
        assert_eq!(SpatialAnalysis::ring_side(LonLat::new(0.0, 1.0), &open), RingSide::Boundary);
        assert_eq!(SpatialAnalysis::ring_side(LonLat::new(1.0, 1.0), &open), RingSide::Inside);
        assert_eq!(SpatialAnalysis::ring_side(LonLat::new(3.0, 1.0), &open), RingSide::Outside);
    }

    #[test]
    fn multipolygon_membership_is_any_part() {
        let poly = Feature::new(
            Geometry::MultiPolygon(vec![
                vec![ring(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]])],
                vec![ring(&[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]])],
            ]),
            Map::new(),
        );
        let points = FeatureCollection::new(vec![
            point(1, 0.5, 0.5),
            point(2, 3.0, 3.0),
            point(3, 5.5, 5.5),
        ]);
        assert_eq!(ids(&points_within(&points, &poly)), vec![1, 3]);
    }

    #[test]
    fn non_polygon_or_empty_input_gives_empty_result() {
        let points = FeatureCollection::new(vec![point(1, 0.0, 0.0)]);
        let not_a_polygon = point(9, 0.0, 0.0);
        assert!(points_within(&points, &not_a_polygon).is_empty());
        assert!(points_within(&FeatureCollection::default(), &square_with_hole()).is_empty());
    }

    #[test]
    fn repeated_queries_are_identical() {
        let points = FeatureCollection::new(
            (0..50)
                .map(|i| point(i, (i % 12) as f64, (i / 5) as f64))
                .collect(),
        );
        let poly = square_with_hole();
        let first = points_within(&points, &poly);
        for _ in 0..3 {
            assert_eq!(points_within(&points, &poly), first);
        }
        assert!(first.features.iter().all(|f| points.features.contains(f)));
    }
}
