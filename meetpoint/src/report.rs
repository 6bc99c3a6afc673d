//! Straight-line distance report from each input to the midpoint.
//!
//! The report is for display only; refinement never looks at it.

use std::fmt;

use serde::Serialize;

use crate::coord::Coordinate;
use crate::geodesic;

/// One line of the distance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// `"Point {i}"`, 1-based in input order.
    pub label: String,
    /// Great-circle distance to the midpoint in kilometers, rounded to 2 decimals.
    pub distance_km: f64,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2} km", self.label, self.distance_km)
    }
}

/// Build the distance report for `coords` against `midpoint`.
///
/// # Example
///
/// ```
/// use meetpoint::{report, Coordinate};
///
/// let a = Coordinate::new(40.0, -75.0).unwrap();
/// let b = Coordinate::new(41.0, -74.0).unwrap();
///
/// let entries = report(&[a, b], a);
/// assert_eq!(entries[0].to_string(), "Point 1: 0.00 km");
/// assert_eq!(entries[1].label, "Point 2");
/// ```
pub fn report(coords: &[Coordinate], midpoint: Coordinate) -> Vec<ReportEntry> {
    coords
        .iter()
        .enumerate()
        .map(|(i, &coord)| ReportEntry {
            label: point_label(i),
            distance_km: round_to_hundredths(geodesic::distance_km(coord, midpoint)),
        })
        .collect()
}

/// Display label for the input at zero-based `index`.
pub fn point_label(index: usize) -> String {
    format!("Point {}", index + 1)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
