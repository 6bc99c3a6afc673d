//! Great-circle distance on a spherical Earth.

use crate::coord::Coordinate;

/// Mean Earth radius in kilometers (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two coordinates in kilometers (haversine).
///
/// # Example
///
/// ```
/// use meetpoint::{geodesic::distance_km, Coordinate};
///
/// let berlin = Coordinate::new(52.5200, 13.4050).unwrap();
/// let paris = Coordinate::new(48.8566, 2.3522).unwrap();
/// assert!((distance_km(berlin, paris) - 878.0).abs() < 5.0);
/// ```
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat().to_radians();
    let phi2 = b.lat().to_radians();
    let delta_phi = (b.lat() - a.lat()).to_radians();
    let delta_lambda = (b.lng() - a.lng()).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    // min() guards asin against h drifting past 1.0 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Great-circle distance between two coordinates in meters.
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    distance_km(a, b) * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_same_point_is_zero() {
        let p = coord(35.3606, 138.7274);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn test_known_distances() {
        // One degree of latitude is ~111.2 km
        let d = distance_km(coord(0.0, 0.0), coord(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);

        // New York to London, ~5570 km
        let d = distance_km(coord(40.7128, -74.0060), coord(51.5074, -0.1278));
        assert!((d - 5570.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = coord(40.0, -75.0);
        let b = coord(41.0, -74.0);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn test_antipodal() {
        let d = distance_km(coord(0.0, 0.0), coord(0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_meters() {
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 1.0);
        assert!((distance_m(a, b) - distance_km(a, b) * 1000.0).abs() < 1e-9);
    }
}
