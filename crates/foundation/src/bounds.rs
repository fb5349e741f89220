use crate::geo::LonLat;

/// Axis-aligned bounding box in planar (lon, lat) space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Smallest box containing every position; `None` for an empty input.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a LonLat>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut min = [first.lon, first.lat];
        let mut max = [first.lon, first.lat];
        for p in iter {
            min[0] = min[0].min(p.lon);
            min[1] = min[1].min(p.lat);
            max[0] = max[0].max(p.lon);
            max[1] = max[1].max(p.lat);
        }
        Some(Self::new(min, max))
    }

    /// Closed containment: points on the box edge are inside.
    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.min[0] && p.lon <= self.max[0] && p.lat >= self.min[1] && p.lat <= self.max[1]
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        )
    }
}
