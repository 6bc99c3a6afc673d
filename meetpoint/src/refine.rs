//! Iterative weighted-midpoint refinement.
//!
//! The refiner starts from the arithmetic mean of the inputs and then runs a
//! fixed number of inverse-distance weighting passes, asking a
//! [`DistanceOracle`] for real travel distances to the current estimate on
//! every pass:
//!
//! ```text
//! weight_i   = 1 / distance_i            (distance_i > 0 only)
//! midpoint'  = Σ coord_i · weight_i / Σ weight_i
//! ```
//!
//! # Limitations
//!
//! This is a fixed-budget damped fixed-point iteration, not a convergent
//! optimizer. It runs exactly [`REFINEMENT_ITERATIONS`] passes (fewer if the
//! oracle fails) with no convergence test, and the result is not the true
//! geometric median. Inputs whose distance to the current estimate is exactly
//! zero are left out of that pass, so a point sitting on the estimate does not
//! pull it any further. Longitudes are averaged linearly, so sets that straddle
//! the antimeridian produce a midpoint on the wrong side of the globe.
//!
//! # Example
//!
//! ```
//! use meetpoint::{Coordinate, GreatCircleOracle, MidpointRefiner};
//!
//! let coords = vec![
//!     Coordinate::new(40.0, -75.0).unwrap(),
//!     Coordinate::new(41.0, -74.0).unwrap(),
//! ];
//!
//! let refinement = MidpointRefiner::new(GreatCircleOracle).refine(&coords).unwrap();
//! assert_eq!(refinement.iterations, 5);
//! ```

use serde::Serialize;

use crate::coord::Coordinate;
use crate::error::{MeetpointError, Result};
use crate::oracle::DistanceOracle;

/// Number of weighting passes performed by [`MidpointRefiner::refine`].
pub const REFINEMENT_ITERATIONS: u32 = 5;

/// Outcome of a refinement run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Refinement {
    /// Final midpoint estimate.
    pub midpoint: Coordinate,
    /// Number of passes that received distances from the oracle.
    pub iterations: u32,
    /// Passes where every distance was zero and the estimate was kept as is.
    pub degenerate_iterations: u32,
    /// Why refinement stopped early, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_failure: Option<String>,
}

impl Refinement {
    /// Whether all [`REFINEMENT_ITERATIONS`] passes ran.
    pub fn is_complete(&self) -> bool {
        self.oracle_failure.is_none()
    }
}

/// Refines a midpoint against a [`DistanceOracle`].
///
/// The refiner holds no per-request state; every call to [`refine`](Self::refine)
/// owns its own midpoint estimate.
pub struct MidpointRefiner<O> {
    oracle: O,
}

impl<O: DistanceOracle> MidpointRefiner<O> {
    /// Create a refiner that queries `oracle` for travel distances.
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// Compute the refined midpoint of `coords`.
    ///
    /// # Errors
    ///
    /// Returns [`MeetpointError::EmptyInput`] for an empty slice, without
    /// calling the oracle. Oracle failures are not errors: refinement stops
    /// and the estimate reached so far is returned, with the reason recorded
    /// in [`Refinement::oracle_failure`].
    pub fn refine(&self, coords: &[Coordinate]) -> Result<Refinement> {
        let mut midpoint = arithmetic_mean(coords).ok_or(MeetpointError::EmptyInput)?;
        let mut iterations = 0;
        let mut degenerate_iterations = 0;
        let mut oracle_failure = None;

        for pass in 1..=REFINEMENT_ITERATIONS {
            let distances = match self.sample(coords, midpoint) {
                Ok(distances) => distances,
                Err(e) => {
                    tracing::warn!(pass, error = %e, "Stopping refinement early");
                    oracle_failure = Some(e.to_string());
                    break;
                }
            };
            iterations += 1;

            match weighted_average(coords, &distances) {
                Some(next) => {
                    tracing::debug!(pass, lat = next.lat(), lng = next.lng(), "Midpoint updated");
                    midpoint = next;
                }
                None => {
                    tracing::debug!(pass, "All distances zero, keeping previous midpoint");
                    degenerate_iterations += 1;
                }
            }
        }

        Ok(Refinement {
            midpoint,
            iterations,
            degenerate_iterations,
            oracle_failure,
        })
    }

    /// Ask the oracle for one distance sample, rejecting unusable answers.
    fn sample(&self, coords: &[Coordinate], midpoint: Coordinate) -> Result<Vec<f64>> {
        let distances = self.oracle.distances(coords, midpoint)?;

        if distances.is_empty() {
            return Err(MeetpointError::OracleFailure {
                reason: "no distances returned".to_string(),
            });
        }
        if distances.len() != coords.len() {
            return Err(MeetpointError::OracleFailure {
                reason: format!(
                    "expected {} distances, got {}",
                    coords.len(),
                    distances.len()
                ),
            });
        }

        Ok(distances)
    }
}

/// Component-wise arithmetic mean, or `None` for an empty slice.
pub fn arithmetic_mean(coords: &[Coordinate]) -> Option<Coordinate> {
    if coords.is_empty() {
        return None;
    }

    let n = coords.len() as f64;
    let lat = coords.iter().map(|c| c.lat()).sum::<f64>() / n;
    let lng = coords.iter().map(|c| c.lng()).sum::<f64>() / n;

    Some(Coordinate::clamped(lat, lng))
}

/// Inverse-distance weighted average.
///
/// Points with a zero (or non-finite, or negative) distance get no weight.
/// Returns `None` when no point carries weight.
fn weighted_average(coords: &[Coordinate], distances: &[f64]) -> Option<Coordinate> {
    let mut total_weight = 0.0;
    let mut weighted_lat = 0.0;
    let mut weighted_lng = 0.0;

    for (coord, &d) in coords.iter().zip(distances) {
        if d > 0.0 && d.is_finite() {
            let weight = 1.0 / d;
            total_weight += weight;
            weighted_lat += coord.lat() * weight;
            weighted_lng += coord.lng() * weight;
        }
    }

    if total_weight > 0.0 {
        Some(Coordinate::clamped(
            weighted_lat / total_weight,
            weighted_lng / total_weight,
        ))
    } else {
        None
    }
}
