/// A WGS84 position in degrees.
///
/// Field order follows the GeoJSON convention: longitude first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Screen-space position in pixels, origin top-left.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::LonLat;

    #[test]
    fn array_order_is_lon_lat() {
        let p = LonLat::new(-122.4, 37.7);
        assert_eq!(LonLat::from([-122.4, 37.7]), p);
        assert_eq!((p.lon, p.lat), (-122.4, 37.7));
    }
}
