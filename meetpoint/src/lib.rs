//! # meetpoint - Weighted Meeting Point Library
//!
//! Finds a practical meeting point for a group of locations given as Plus
//! Codes, addresses or `lat,lng` pairs. The midpoint starts at the
//! arithmetic mean and is refined through a fixed number of inverse-distance
//! weighting passes against a real travel-distance oracle.
//!
//! ## Features
//!
//! - **Pluggable**: geocoding and travel distance sit behind the
//!   [`CoordinateResolver`] and [`DistanceOracle`] traits
//! - **Offline**: full Plus Codes and coordinate literals decode locally;
//!   [`GreatCircleOracle`] stands in for a routing service
//! - **Google Maps**: Geocoding and Distance Matrix client (`google` feature)
//! - **Map export**: GeoJSON FeatureCollection of inputs and midpoint
//!   (`geojson` feature)
//!
//! ## Quick Start
//!
//! ```
//! use meetpoint::MeetingPlanner;
//!
//! let planner = MeetingPlanner::builder().build().unwrap();
//! let plan = planner.plan("849VCWC8+R9\n849VCWG9+5X\n37.40,-122.10").unwrap();
//!
//! println!("Refined midpoint: {}", plan.midpoint());
//! for entry in &plan.report {
//!     println!("{}", entry);
//! }
//! ```
//!
//! ## Lower-level API
//!
//! ```
//! use meetpoint::{Coordinate, GreatCircleOracle, MidpointRefiner, report};
//!
//! let coords = vec![
//!     Coordinate::new(40.0, -75.0).unwrap(),
//!     Coordinate::new(41.0, -74.0).unwrap(),
//! ];
//!
//! let refinement = MidpointRefiner::new(GreatCircleOracle).refine(&coords).unwrap();
//! let entries = report(&coords, refinement.midpoint);
//! assert_eq!(entries.len(), 2);
//! ```

pub mod coord;
pub mod error;
pub mod geodesic;
pub mod oracle;
pub mod planner;
pub mod plus_code;
pub mod refine;
pub mod report;
pub mod resolver;
pub mod session;

#[cfg(feature = "geojson")]
pub mod geojson;

#[cfg(feature = "google")]
pub mod google;

// Re-export main types at crate root for convenience
pub use coord::{BoundingBox, Coordinate, CoordinateSet};
pub use error::{MeetpointError, Result};
pub use oracle::{DistanceOracle, GreatCircleOracle};
pub use planner::{parse_codes, CacheStats, MeetingPlan, MeetingPlanner, MeetingPlannerBuilder};
pub use refine::{MidpointRefiner, Refinement, REFINEMENT_ITERATIONS};
pub use report::{report, ReportEntry};
pub use resolver::{resolve_all, ChainResolver, CoordinateResolver, FailedCode, LocalResolver, Resolution};
pub use session::{Session, SessionStore};

#[cfg(feature = "google")]
pub use google::{GoogleConfig, GoogleMapsClient, TravelMode};
