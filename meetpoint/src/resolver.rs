//! Location code resolution.
//!
//! A [`CoordinateResolver`] turns one location code into a [`Coordinate`].
//! [`resolve_all`] runs a resolver over a list of codes and keeps going past
//! failures, collecting one [`FailedCode`] per code that did not resolve.

use std::sync::Arc;

use serde::Serialize;

use crate::coord::Coordinate;
use crate::error::{MeetpointError, Result};
use crate::plus_code;

/// Converts location codes to coordinates.
///
/// Implementations return [`MeetpointError::GeocodeFailure`] (or any other
/// error) for codes they cannot resolve. They must not panic.
pub trait CoordinateResolver: Send + Sync {
    /// Resolve a single, already trimmed location code.
    fn resolve(&self, code: &str) -> Result<Coordinate>;
}

impl<T: CoordinateResolver + ?Sized> CoordinateResolver for &T {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        (**self).resolve(code)
    }
}

impl<T: CoordinateResolver + ?Sized> CoordinateResolver for Arc<T> {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        (**self).resolve(code)
    }
}

impl<T: CoordinateResolver + ?Sized> CoordinateResolver for Box<T> {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        (**self).resolve(code)
    }
}

/// A location code that failed to resolve, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCode {
    /// The code as submitted.
    pub code: String,
    /// Human-readable failure reason.
    pub reason: String,
}

impl FailedCode {
    /// Create a failure record.
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
        }
    }

    fn from_error(code: &str, err: MeetpointError) -> Self {
        match err {
            MeetpointError::GeocodeFailure { reason, .. } => Self::new(code, reason),
            other => Self::new(code, other.to_string()),
        }
    }
}

impl std::fmt::Display for FailedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error converting location code {}: {}", self.code, self.reason)
    }
}

/// Result of resolving a batch of codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Successfully resolved codes with their coordinates, in input order.
    pub resolved: Vec<(String, Coordinate)>,
    /// Codes that failed, in input order.
    pub failures: Vec<FailedCode>,
}

impl Resolution {
    /// The resolved coordinates, in input order.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.resolved.iter().map(|(_, c)| *c).collect()
    }
}

/// Resolve every code, continuing past failures.
///
/// # Example
///
/// ```
/// use meetpoint::{resolve_all, LocalResolver};
///
/// let codes = vec!["40.0,-75.0".to_string(), "nowhere".to_string()];
/// let resolution = resolve_all(&LocalResolver, &codes);
///
/// assert_eq!(resolution.resolved.len(), 1);
/// assert_eq!(resolution.failures[0].code, "nowhere");
/// ```
pub fn resolve_all<R: CoordinateResolver + ?Sized>(resolver: &R, codes: &[String]) -> Resolution {
    let mut resolution = Resolution::default();

    for code in codes {
        match resolver.resolve(code) {
            Ok(coord) => {
                tracing::debug!(code = %code, lat = coord.lat(), lng = coord.lng(), "Resolved");
                resolution.resolved.push((code.clone(), coord));
            }
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "Could not resolve location code");
                resolution.failures.push(FailedCode::from_error(code, e));
            }
        }
    }

    resolution
}

/// Offline resolver for decimal coordinates and full Plus Codes.
///
/// Accepts `"lat,lng"` literals (e.g. `"40.7128, -74.0060"`) and full Plus
/// Codes (e.g. `"849VCWC8+R9"`, decoded to the center of the code area).
/// Anything else, including short Plus Codes, fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResolver;

impl CoordinateResolver for LocalResolver {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        let code = code.trim();

        if let Some(coord) = parse_lat_lng(code) {
            return coord.map_err(|e| MeetpointError::GeocodeFailure {
                code: code.to_string(),
                reason: e.to_string(),
            });
        }

        if plus_code::is_full(code) {
            return Ok(plus_code::decode(code)?.center());
        }

        Err(MeetpointError::GeocodeFailure {
            code: code.to_string(),
            reason: "not a coordinate pair or full Plus Code".to_string(),
        })
    }
}

/// Parse `"lat,lng"`. Returns `None` if the text is not two numbers.
fn parse_lat_lng(text: &str) -> Option<Result<Coordinate>> {
    let (lat, lng) = text.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    Some(Coordinate::new(lat, lng))
}

/// Tries a primary resolver and falls back to a secondary one.
///
/// The secondary resolver's error is reported when both fail.
pub struct ChainResolver<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> ChainResolver<A, B> {
    /// Create a resolver that asks `primary` first, then `fallback`.
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: CoordinateResolver, B: CoordinateResolver> CoordinateResolver for ChainResolver<A, B> {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        self.primary
            .resolve(code)
            .or_else(|_| self.fallback.resolve(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TableResolver(HashMap<&'static str, (f64, f64)>);

    impl CoordinateResolver for TableResolver {
        fn resolve(&self, code: &str) -> Result<Coordinate> {
            match self.0.get(code) {
                Some(&(lat, lng)) => Coordinate::new(lat, lng),
                None => Err(MeetpointError::GeocodeFailure {
                    code: code.to_string(),
                    reason: "ZERO_RESULTS".to_string(),
                }),
            }
        }
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_local_resolver_lat_lng() {
        let coord = LocalResolver.resolve("40.7128, -74.0060").unwrap();
        assert_eq!(coord.lat(), 40.7128);
        assert_eq!(coord.lng(), -74.0060);
    }

    #[test]
    fn test_local_resolver_out_of_range_literal() {
        let err = LocalResolver.resolve("95.0,10.0").unwrap_err();
        assert!(matches!(err, MeetpointError::GeocodeFailure { .. }));
        assert!(err.to_string().contains("95"));
    }

    #[test]
    fn test_local_resolver_plus_code() {
        let coord = LocalResolver.resolve("849VCWC8+R9").unwrap();
        assert!((coord.lat() - 37.4220625).abs() < 1e-9);
        assert!((coord.lng() + 122.0840625).abs() < 1e-9);
    }

    #[test]
    fn test_local_resolver_rejects_short_code() {
        assert!(LocalResolver.resolve("CWC8+R9 Mountain View").is_err());
        assert!(LocalResolver.resolve("Main Street, Springfield").is_err());
    }

    #[test]
    fn test_resolve_all_keeps_order_and_failures() {
        let resolution = resolve_all(
            &LocalResolver,
            &codes(&["41.0,-74.0", "bogus", "40.0,-75.0", "also bogus"]),
        );

        assert_eq!(
            resolution.coordinates(),
            vec![
                Coordinate::new(41.0, -74.0).unwrap(),
                Coordinate::new(40.0, -75.0).unwrap(),
            ]
        );
        assert_eq!(resolution.resolved[0].0, "41.0,-74.0");
        assert_eq!(resolution.failures.len(), 2);
        assert_eq!(resolution.failures[0].code, "bogus");
        assert_eq!(resolution.failures[1].code, "also bogus");
        assert_eq!(
            resolution.failures[0].reason,
            "not a coordinate pair or full Plus Code"
        );
    }

    #[test]
    fn test_chain_resolver_falls_back() {
        let table = TableResolver(HashMap::from([("A", (40.0, -75.0))]));
        let chain = ChainResolver::new(LocalResolver, table);

        assert_eq!(chain.resolve("A").unwrap(), Coordinate::new(40.0, -75.0).unwrap());
        assert_eq!(chain.resolve("1.0,2.0").unwrap(), Coordinate::new(1.0, 2.0).unwrap());

        let err = chain.resolve("B").unwrap_err();
        assert!(err.to_string().contains("ZERO_RESULTS"));
    }

    #[test]
    fn test_failed_code_display() {
        let failure = FailedCode::new("XYZ", "ZERO_RESULTS");
        assert_eq!(
            failure.to_string(),
            "Error converting location code XYZ: ZERO_RESULTS"
        );
    }
}
