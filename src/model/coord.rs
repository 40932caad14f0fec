//! Geographic coordinates. Kept deliberately minimal — a full geometry
//! crate is unneeded once street-network routing is out of scope
//! (spec.md §1); the spatial index only needs a point and a distance.

/// WGS-84 latitude/longitude, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Coord { lat, lon }
    }

    #[must_use]
    pub fn in_range(self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance in meters (haversine).
    #[must_use]
    pub fn distance_meters(self, other: Coord) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = Coord::new(51.5, -0.1);
        assert!((p.distance_meters(p)).abs() < 1e-9);
    }

    #[test]
    fn range_check() {
        assert!(Coord::new(10.0, 20.0).in_range());
        assert!(!Coord::new(100.0, 20.0).in_range());
        assert!(!Coord::new(10.0, 200.0).in_range());
    }
}
