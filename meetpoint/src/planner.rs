//! Request pipeline: parse codes, resolve, refine, report.
//!
//! [`MeetingPlanner`] owns the injected resolver and oracle and a bounded
//! geocode cache shared by every request it serves. Everything else
//! (coordinates, midpoint, report) is built fresh per call and returned in a
//! [`MeetingPlan`].
//!
//! # Example
//!
//! ```
//! use meetpoint::MeetingPlanner;
//!
//! let planner = MeetingPlanner::builder().build().unwrap();
//! let plan = planner.plan("40.0,-75.0\n41.0,-74.0\n").unwrap();
//!
//! assert_eq!(plan.report.len(), 2);
//! assert!(plan.geocode_failures.is_empty());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;
use serde::Serialize;

use crate::coord::{Coordinate, CoordinateSet};
use crate::error::{MeetpointError, Result};
use crate::oracle::{DistanceOracle, GreatCircleOracle};
use crate::refine::{MidpointRefiner, Refinement};
use crate::report::{report, ReportEntry};
use crate::resolver::{resolve_all, CoordinateResolver, FailedCode, LocalResolver};

#[cfg(feature = "google")]
use crate::google::{GoogleConfig, GoogleMapsClient};
#[cfg(feature = "google")]
use crate::resolver::ChainResolver;

/// Default number of geocoded codes kept in memory.
pub const DEFAULT_CACHE_SIZE: u64 = 1000;

/// Split newline-separated input into trimmed, non-blank codes.
///
/// ```
/// use meetpoint::parse_codes;
///
/// assert_eq!(parse_codes("  A \n\n B\r\n"), vec!["A", "B"]);
/// ```
pub fn parse_codes(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Statistics about geocode cache usage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of codes currently in the cache.
    pub entry_count: u64,
    /// Number of lookups served from the cache.
    pub hit_count: u64,
    /// Number of lookups forwarded to the resolver.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Everything computed for one request.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingPlan {
    /// The parsed input codes, in input order.
    pub codes: Vec<String>,
    /// Codes that resolved, parallel to `coordinates`.
    pub resolved_codes: Vec<String>,
    /// Coordinates of the resolved codes.
    pub coordinates: CoordinateSet,
    /// Codes that did not resolve.
    pub geocode_failures: Vec<FailedCode>,
    /// Refinement outcome, including the midpoint.
    pub refinement: Refinement,
    /// Straight-line distance from each coordinate to the midpoint.
    pub report: Vec<ReportEntry>,
}

impl MeetingPlan {
    /// The refined midpoint.
    pub fn midpoint(&self) -> Coordinate {
        self.refinement.midpoint
    }
}

/// Plans meeting points with injected collaborators.
///
/// # Example
///
/// ```ignore
/// use meetpoint::MeetingPlannerBuilder;
///
/// // Google-backed when MEETPOINT_API_KEY is set, offline otherwise
/// let planner = MeetingPlannerBuilder::from_env()?.build()?;
/// let plan = planner.plan("849VCWC8+R9\n849VCWG9+5X\n")?;
///
/// println!("Refined midpoint: {}", plan.midpoint());
/// for entry in &plan.report {
///     println!("{}", entry);
/// }
/// ```
pub struct MeetingPlanner {
    resolver: Arc<dyn CoordinateResolver>,
    refiner: MidpointRefiner<Arc<dyn DistanceOracle>>,
    /// Successful resolutions keyed by trimmed code.
    geocode_cache: Cache<String, Coordinate>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    backend: &'static str,
}

impl MeetingPlanner {
    /// Create a builder.
    pub fn builder() -> MeetingPlannerBuilder {
        MeetingPlannerBuilder::new()
    }

    /// Parse `text` with [`parse_codes`] and plan the result.
    pub fn plan(&self, text: &str) -> Result<MeetingPlan> {
        self.plan_codes(parse_codes(text))
    }

    /// Plan a meeting point for already parsed codes.
    ///
    /// # Errors
    ///
    /// - [`MeetpointError::EmptyInput`] when `codes` is empty. Nothing is
    ///   resolved in that case.
    /// - [`MeetpointError::NoValidCoordinates`] when no code resolves.
    ///
    /// Individual geocode failures and oracle failures are not errors; they
    /// are recorded in the returned plan.
    pub fn plan_codes(&self, codes: Vec<String>) -> Result<MeetingPlan> {
        if codes.is_empty() {
            return Err(MeetpointError::EmptyInput);
        }

        let resolution = resolve_all(self, &codes);
        if resolution.resolved.is_empty() {
            return Err(MeetpointError::NoValidCoordinates {
                failures: resolution.failures,
            });
        }

        let coordinates = CoordinateSet::new(resolution.coordinates())?;
        let refinement = self.refiner.refine(&coordinates)?;
        let report = report(&coordinates, refinement.midpoint);

        tracing::info!(
            codes = codes.len(),
            resolved = coordinates.len(),
            failed = resolution.failures.len(),
            iterations = refinement.iterations,
            midpoint = %refinement.midpoint,
            "Planned meeting point"
        );

        Ok(MeetingPlan {
            codes,
            resolved_codes: resolution.resolved.into_iter().map(|(code, _)| code).collect(),
            coordinates,
            geocode_failures: resolution.failures,
            refinement,
            report,
        })
    }

    /// Name of the configured backend (`"google"`, `"offline"` or `"custom"`).
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Get geocode cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.geocode_cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.geocode_cache.policy().max_capacity().unwrap_or(0)
    }

    /// Forget every cached resolution.
    pub fn clear_cache(&self) {
        self.geocode_cache.invalidate_all();
    }
}

impl CoordinateResolver for MeetingPlanner {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        let code = code.trim();

        if let Some(coord) = self.geocode_cache.get(code) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(coord);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        // Failures are not cached so transient errors can recover.
        let coord = self.resolver.resolve(code)?;
        self.geocode_cache.insert(code.to_string(), coord);
        Ok(coord)
    }
}

/// Builder for [`MeetingPlanner`].
pub struct MeetingPlannerBuilder {
    resolver: Option<Arc<dyn CoordinateResolver>>,
    oracle: Option<Arc<dyn DistanceOracle>>,
    cache_size: u64,
    #[cfg(feature = "google")]
    google: Option<GoogleConfig>,
}

impl Default for MeetingPlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeetingPlannerBuilder {
    /// Create a builder for an offline planner.
    pub fn new() -> Self {
        Self {
            resolver: None,
            oracle: None,
            cache_size: DEFAULT_CACHE_SIZE,
            #[cfg(feature = "google")]
            google: None,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `MEETPOINT_API_KEY` | Google Maps API key* | None (offline) |
    /// | `MEETPOINT_TRAVEL_MODE` | driving, walking, bicycling, transit* | driving |
    /// | `MEETPOINT_TIMEOUT_SECS` | HTTP timeout in seconds* | 30 |
    /// | `MEETPOINT_MAX_RETRIES` | Retries per HTTP request* | 2 |
    /// | `MEETPOINT_CACHE_SIZE` | Maximum geocoded codes in cache | 1000 |
    ///
    /// *Only used when the `google` feature is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`MeetpointError::Config`] if `MEETPOINT_TRAVEL_MODE` is not a
    /// known travel mode.
    pub fn from_env() -> Result<Self> {
        let cache_size: u64 = std::env::var("MEETPOINT_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_SIZE);

        #[allow(unused_mut)]
        let mut builder = Self::new().cache_size(cache_size);

        #[cfg(feature = "google")]
        if let Some(api_key) = std::env::var("MEETPOINT_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
        {
            let mut config = GoogleConfig::new(api_key);
            if let Ok(mode) = std::env::var("MEETPOINT_TRAVEL_MODE") {
                config = config.with_mode(mode.parse()?);
            }
            if let Some(timeout) = env_parse("MEETPOINT_TIMEOUT_SECS") {
                config = config.with_timeout(timeout);
            }
            if let Some(retries) = env_parse("MEETPOINT_MAX_RETRIES") {
                config = config.with_max_retries(retries);
            }
            builder = builder.google(config);
        }

        #[cfg(not(feature = "google"))]
        if std::env::var("MEETPOINT_API_KEY").is_ok() {
            tracing::warn!("MEETPOINT_API_KEY is set but the google feature is disabled");
        }

        Ok(builder)
    }

    /// Use a custom resolver instead of the default one.
    pub fn resolver(mut self, resolver: Arc<dyn CoordinateResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use a custom distance oracle instead of the default one.
    pub fn oracle(mut self, oracle: Arc<dyn DistanceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Set the maximum number of geocoded codes to keep in cache.
    ///
    /// Default is 1000 codes.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Use Google Maps for geocoding and travel distances.
    ///
    /// Coordinate literals and full Plus Codes are still decoded locally;
    /// everything else goes to the Geocoding API.
    #[cfg(feature = "google")]
    pub fn google(mut self, config: GoogleConfig) -> Self {
        self.google = Some(config);
        self
    }

    /// Build the [`MeetingPlanner`].
    ///
    /// # Errors
    ///
    /// Returns an error if the Google client cannot be created (empty API
    /// key, TLS initialization failure).
    pub fn build(self) -> Result<MeetingPlanner> {
        let custom = self.resolver.is_some() || self.oracle.is_some();

        #[cfg(feature = "google")]
        let (default_resolver, default_oracle, backend) = match self.google {
            Some(config) => google_backend(config)?,
            None => offline_backend(),
        };

        #[cfg(not(feature = "google"))]
        let (default_resolver, default_oracle, backend) = offline_backend();

        Ok(MeetingPlanner {
            resolver: self.resolver.unwrap_or(default_resolver),
            refiner: MidpointRefiner::new(self.oracle.unwrap_or(default_oracle)),
            geocode_cache: Cache::builder().max_capacity(self.cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            backend: if custom { "custom" } else { backend },
        })
    }
}

type Backend = (
    Arc<dyn CoordinateResolver>,
    Arc<dyn DistanceOracle>,
    &'static str,
);

fn offline_backend() -> Backend {
    let resolver: Arc<dyn CoordinateResolver> = Arc::new(LocalResolver);
    let oracle: Arc<dyn DistanceOracle> = Arc::new(GreatCircleOracle);
    (resolver, oracle, "offline")
}

#[cfg(feature = "google")]
fn google_backend(config: GoogleConfig) -> Result<Backend> {
    let client = Arc::new(GoogleMapsClient::new(config)?);
    let resolver: Arc<dyn CoordinateResolver> =
        Arc::new(ChainResolver::new(LocalResolver, Arc::clone(&client)));
    let oracle: Arc<dyn DistanceOracle> = client;
    Ok((resolver, oracle, "google"))
}

#[cfg(feature = "google")]
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Resolves codes from a fixed table and counts lookups.
    struct TableResolver {
        table: HashMap<&'static str, (f64, f64)>,
        lookups: Mutex<Vec<String>>,
    }

    impl TableResolver {
        fn new(entries: &[(&'static str, (f64, f64))]) -> Arc<Self> {
            Arc::new(Self {
                table: entries.iter().copied().collect(),
                lookups: Mutex::new(Vec::new()),
            })
        }

        fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl CoordinateResolver for TableResolver {
        fn resolve(&self, code: &str) -> Result<Coordinate> {
            self.lookups.lock().unwrap().push(code.to_string());
            match self.table.get(code) {
                Some(&(lat, lng)) => Coordinate::new(lat, lng),
                None => Err(MeetpointError::GeocodeFailure {
                    code: code.to_string(),
                    reason: "ZERO_RESULTS".to_string(),
                }),
            }
        }
    }

    /// Returns the same distance for every origin and counts calls.
    #[derive(Default)]
    struct EqualOracle {
        calls: AtomicU64,
    }

    impl DistanceOracle for EqualOracle {
        fn distances(&self, origins: &[Coordinate], _destination: Coordinate) -> Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![1000.0; origins.len()])
        }
    }

    fn planner(resolver: Arc<TableResolver>, oracle: Arc<EqualOracle>) -> MeetingPlanner {
        MeetingPlanner::builder()
            .resolver(resolver)
            .oracle(oracle)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(
            parse_codes("849VCWC8+R9\n\n   \n  849VCWG9+5X  \n"),
            vec!["849VCWC8+R9", "849VCWG9+5X"]
        );
        assert!(parse_codes("").is_empty());
        assert!(parse_codes(" \n\t\n").is_empty());
    }

    #[test]
    fn test_equal_distances_give_arithmetic_mean() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0)), ("B", (41.0, -74.0))]);
        let oracle = Arc::new(EqualOracle::default());
        let planner = planner(resolver, oracle.clone());

        let plan = planner.plan("A\nB\n").unwrap();

        assert_eq!(plan.codes, vec!["A", "B"]);
        assert!((plan.midpoint().lat() - 40.5).abs() < 1e-9);
        assert!((plan.midpoint().lng() + 74.5).abs() < 1e-9);
        assert_eq!(plan.refinement.iterations, 5);
        assert_eq!(oracle.calls.load(Ordering::Relaxed), 5);
        assert_eq!(plan.report.len(), 2);
        assert_eq!(plan.report[0].label, "Point 1");
    }

    #[test]
    fn test_single_code_stays_put() {
        let resolver = TableResolver::new(&[("A", (35.6762, 139.6503))]);
        let planner = planner(resolver, Arc::new(EqualOracle::default()));

        let plan = planner.plan("A").unwrap();

        assert!((plan.midpoint().lat() - 35.6762).abs() < 1e-12);
        assert!((plan.midpoint().lng() - 139.6503).abs() < 1e-12);
        assert_eq!(plan.report[0].to_string(), "Point 1: 0.00 km");
    }

    #[test]
    fn test_failed_code_is_skipped() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0)), ("C", (41.0, -74.0))]);
        let planner = planner(resolver, Arc::new(EqualOracle::default()));

        let plan = planner.plan("A\nB\nC").unwrap();

        assert_eq!(plan.codes, vec!["A", "B", "C"]);
        assert_eq!(plan.resolved_codes, vec!["A", "C"]);
        assert_eq!(plan.coordinates.len(), 2);
        assert_eq!(plan.geocode_failures, vec![FailedCode::new("B", "ZERO_RESULTS")]);
        assert_eq!(plan.report.len(), 2);
        assert!((plan.midpoint().lat() - 40.5).abs() < 1e-9);
    }

    #[test]
    fn test_all_codes_fail() {
        let resolver = TableResolver::new(&[]);
        let oracle = Arc::new(EqualOracle::default());
        let planner = planner(resolver, oracle.clone());

        let err = planner.plan("X\nY").unwrap_err();

        match err {
            MeetpointError::NoValidCoordinates { failures } => {
                let codes: Vec<&str> = failures.iter().map(|f| f.code.as_str()).collect();
                assert_eq!(codes, vec!["X", "Y"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(oracle.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_input_makes_no_calls() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0))]);
        let oracle = Arc::new(EqualOracle::default());
        let planner = planner(resolver.clone(), oracle.clone());

        assert!(matches!(planner.plan("\n  \n"), Err(MeetpointError::EmptyInput)));
        assert!(matches!(planner.plan_codes(vec![]), Err(MeetpointError::EmptyInput)));
        assert!(resolver.lookups().is_empty());
        assert_eq!(oracle.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_geocode_cache_hit() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0)), ("B", (41.0, -74.0))]);
        let planner = planner(resolver.clone(), Arc::new(EqualOracle::default()));

        planner.plan("A\nB").unwrap();
        let stats = planner.cache_stats();
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.hit_count, 0);

        planner.plan("B\nA\nA").unwrap();
        let stats = planner.cache_stats();
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.hit_count, 3);
        assert!((stats.hit_rate() - 0.6).abs() < 1e-9);

        // The underlying resolver only saw the first two lookups
        assert_eq!(resolver.lookups(), vec!["A", "B"]);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0))]);
        let planner = planner(resolver.clone(), Arc::new(EqualOracle::default()));

        planner.plan("A\nmissing").unwrap();
        planner.plan("A\nmissing").unwrap();

        assert_eq!(resolver.lookups(), vec!["A", "missing", "missing"]);
    }

    #[test]
    fn test_clear_cache() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0))]);
        let planner = planner(resolver.clone(), Arc::new(EqualOracle::default()));

        planner.plan("A").unwrap();
        planner.clear_cache();
        planner.plan("A").unwrap();

        assert_eq!(resolver.lookups(), vec!["A", "A"]);
    }

    #[test]
    fn test_cache_stats_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_offline_planner() {
        let planner = MeetingPlanner::builder().cache_size(10).build().unwrap();

        assert_eq!(planner.backend(), "offline");
        assert_eq!(planner.cache_capacity(), 10);

        let plan = planner.plan("849VCWC8+R9\n40.0,-75.0\nMain Street").unwrap();
        assert_eq!(plan.coordinates.len(), 2);
        assert_eq!(plan.geocode_failures.len(), 1);
        assert_eq!(plan.geocode_failures[0].code, "Main Street");
    }

    #[test]
    fn test_custom_backend_name() {
        let planner = MeetingPlanner::builder()
            .oracle(Arc::new(EqualOracle::default()))
            .build()
            .unwrap();
        assert_eq!(planner.backend(), "custom");
    }

    #[test]
    fn test_plan_serializes() {
        let resolver = TableResolver::new(&[("A", (40.0, -75.0))]);
        let planner = planner(resolver, Arc::new(EqualOracle::default()));

        let plan = planner.plan("A\nB").unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["codes"], serde_json::json!(["A", "B"]));
        assert_eq!(json["coordinates"][0]["lat"], 40.0);
        assert_eq!(json["refinement"]["iterations"], 5);
        assert_eq!(json["geocode_failures"][0]["code"], "B");
        assert_eq!(json["report"][0]["label"], "Point 1");
    }

    #[test]
    fn test_from_env_cache_size() {
        let orig_size = std::env::var("MEETPOINT_CACHE_SIZE").ok();
        let orig_key = std::env::var("MEETPOINT_API_KEY").ok();

        std::env::set_var("MEETPOINT_CACHE_SIZE", "42");
        std::env::remove_var("MEETPOINT_API_KEY");

        let builder = MeetingPlannerBuilder::from_env().unwrap();
        assert_eq!(builder.cache_size, 42);
        assert_eq!(builder.build().unwrap().backend(), "offline");

        match orig_size {
            Some(v) => std::env::set_var("MEETPOINT_CACHE_SIZE", v),
            None => std::env::remove_var("MEETPOINT_CACHE_SIZE"),
        }
        if let Some(v) = orig_key {
            std::env::set_var("MEETPOINT_API_KEY", v);
        }
    }
}
