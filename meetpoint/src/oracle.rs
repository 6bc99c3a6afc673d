//! Travel-distance oracles.
//!
//! A [`DistanceOracle`] answers one question: how far is each origin from a
//! single destination, in meters. The refinement loop asks it once per
//! iteration, always with the full coordinate set as origins.

use std::sync::Arc;

use crate::coord::Coordinate;
use crate::error::Result;
use crate::geodesic;

/// Source of real-world travel distances.
///
/// On success the returned vector has exactly one entry per origin, in the
/// same order as `origins`. Implementations report network, quota or service
/// problems as errors; callers decide whether that is fatal.
pub trait DistanceOracle: Send + Sync {
    /// Distance in meters from each origin to `destination`.
    fn distances(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>>;
}

impl<T: DistanceOracle + ?Sized> DistanceOracle for &T {
    fn distances(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>> {
        (**self).distances(origins, destination)
    }
}

impl<T: DistanceOracle + ?Sized> DistanceOracle for Arc<T> {
    fn distances(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>> {
        (**self).distances(origins, destination)
    }
}

impl<T: DistanceOracle + ?Sized> DistanceOracle for Box<T> {
    fn distances(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>> {
        (**self).distances(origins, destination)
    }
}

/// Offline oracle that answers with straight-line (great-circle) meters.
///
/// Useful when no routing service is configured. With straight-line
/// distances the refinement pulls the midpoint toward the nearest inputs
/// rather than toward well-connected roads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircleOracle;

impl DistanceOracle for GreatCircleOracle {
    fn distances(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>> {
        Ok(origins
            .iter()
            .map(|&origin| geodesic::distance_m(origin, destination))
            .collect())
    }
}
