//! Geographic coordinate types.
//!
//! [`Coordinate`] is a validated latitude/longitude pair in decimal degrees
//! (WGS84). [`CoordinateSet`] is the ordered, non-empty list of coordinates
//! that one request works on.

use std::fmt;
use std::ops::Deref;

use serde::Serialize;

use crate::error::{MeetpointError, Result};

/// A latitude/longitude pair in decimal degrees.
///
/// Latitude is always within `[-90, 90]` and longitude within `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid range.
    ///
    /// # Example
    ///
    /// ```
    /// use meetpoint::Coordinate;
    ///
    /// let tokyo = Coordinate::new(35.6762, 139.6503).unwrap();
    /// assert_eq!(tokyo.lat(), 35.6762);
    /// assert!(Coordinate::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if is_valid_coord(lat, lng) {
            Ok(Self { lat, lng })
        } else {
            Err(MeetpointError::InvalidCoordinate { lat, lng })
        }
    }

    /// Build a coordinate from values that are valid up to rounding error.
    pub(crate) fn clamped(lat: f64, lng: f64) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lng: lng.clamp(-180.0, 180.0),
        }
    }

    /// Latitude in decimal degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = MeetpointError;

    fn try_from((lat, lng): (f64, f64)) -> Result<Self> {
        Self::new(lat, lng)
    }
}

/// Check that a latitude/longitude pair is finite and in range.
pub fn is_valid_coord(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Ordered, non-empty sequence of coordinates.
///
/// Order matches the order of the input codes that resolved, so report
/// entries can be correlated back to their inputs. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CoordinateSet(Vec<Coordinate>);

impl CoordinateSet {
    /// Wrap a list of coordinates, failing with [`MeetpointError::EmptyInput`]
    /// when it is empty.
    pub fn new(coords: Vec<Coordinate>) -> Result<Self> {
        if coords.is_empty() {
            return Err(MeetpointError::EmptyInput);
        }
        Ok(Self(coords))
    }

    /// The coordinates as a slice.
    pub fn as_slice(&self) -> &[Coordinate] {
        &self.0
    }

    /// Consume the set, returning the underlying vector.
    pub fn into_inner(self) -> Vec<Coordinate> {
        self.0
    }
}

impl Deref for CoordinateSet {
    type Target = [Coordinate];

    fn deref(&self) -> &[Coordinate] {
        &self.0
    }
}

impl TryFrom<Vec<Coordinate>> for CoordinateSet {
    type Error = MeetpointError;

    fn try_from(coords: Vec<Coordinate>) -> Result<Self> {
        Self::new(coords)
    }
}

/// A geographic bounding box.
///
/// Coordinates are in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lng: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lng: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern boundary latitude
    /// * `min_lng` - Western boundary longitude
    /// * `max_lat` - Northern boundary latitude
    /// * `max_lng` - Eastern boundary longitude
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// Smallest box enclosing every coordinate, or `None` for an empty slice.
    pub fn enclosing(coords: &[Coordinate]) -> Option<Self> {
        let first = coords.first()?;
        let init = Self::new(first.lat, first.lng, first.lat, first.lng);

        Some(coords.iter().skip(1).fold(init, |b, c| Self {
            min_lat: b.min_lat.min(c.lat),
            min_lng: b.min_lng.min(c.lng),
            max_lat: b.max_lat.max(c.lat),
            max_lng: b.max_lng.max(c.lng),
        }))
    }

    /// Extend the box so it also covers `coord`.
    pub fn including(self, coord: Coordinate) -> Self {
        Self {
            min_lat: self.min_lat.min(coord.lat),
            min_lng: self.min_lng.min(coord.lng),
            max_lat: self.max_lat.max(coord.lat),
            max_lng: self.max_lng.max(coord.lng),
        }
    }

    /// Check whether a coordinate lies inside the box, boundaries included.
    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.lat)
            && (self.min_lng..=self.max_lng).contains(&coord.lng)
    }

    /// Box as `[min_lng, min_lat, max_lng, max_lat]`, the GeoJSON `bbox` order.
    pub fn to_geojson_bbox(&self) -> Vec<f64> {
        vec![self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());

        assert!(Coordinate::new(90.1, 0.0).is_err()); // Lat too high
        assert!(Coordinate::new(-90.1, 0.0).is_err()); // Lat too low
        assert!(Coordinate::new(0.0, 180.1).is_err()); // Lng too high
        assert!(Coordinate::new(0.0, -180.1).is_err()); // Lng too low
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (40.0, -75.0).try_into().unwrap();
        assert_eq!(coord.lat(), 40.0);
        assert_eq!(coord.lng(), -75.0);
    }

    #[test]
    fn test_coordinate_display() {
        let coord = Coordinate::new(40.5, -74.5).unwrap();
        assert_eq!(coord.to_string(), "(40.500000, -74.500000)");
    }

    #[test]
    fn test_clamped_stays_in_range() {
        let coord = Coordinate::clamped(90.000_000_000_1, -180.000_000_1);
        assert_eq!(coord.lat(), 90.0);
        assert_eq!(coord.lng(), -180.0);
    }

    #[test]
    fn test_coordinate_set_rejects_empty() {
        assert!(matches!(
            CoordinateSet::new(Vec::new()),
            Err(MeetpointError::EmptyInput)
        ));
    }

    #[test]
    fn test_coordinate_set_preserves_order_and_duplicates() {
        let a = Coordinate::new(1.0, 2.0).unwrap();
        let b = Coordinate::new(3.0, 4.0).unwrap();
        let set = CoordinateSet::new(vec![b, a, b]).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set[0], b);
        assert_eq!(set[1], a);
        assert_eq!(set[2], b);
    }

    #[test]
    fn test_bounding_box_enclosing() {
        let coords = vec![
            Coordinate::new(40.0, -75.0).unwrap(),
            Coordinate::new(41.0, -74.0).unwrap(),
            Coordinate::new(40.5, -74.8).unwrap(),
        ];
        let bbox = BoundingBox::enclosing(&coords).unwrap();

        assert_eq!(bbox, BoundingBox::new(40.0, -75.0, 41.0, -74.0));
        assert!(bbox.contains(Coordinate::new(40.5, -74.5).unwrap()));
        assert!(bbox.contains(Coordinate::new(40.0, -75.0).unwrap())); // boundary
        assert!(!bbox.contains(Coordinate::new(42.0, -74.5).unwrap()));

        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_bounding_box_including() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0)
            .including(Coordinate::new(-1.0, 2.0).unwrap());
        assert_eq!(bbox, BoundingBox::new(-1.0, 0.0, 1.0, 2.0));
        assert_eq!(bbox.to_geojson_bbox(), vec![0.0, -1.0, 2.0, 1.0]);
    }
}
