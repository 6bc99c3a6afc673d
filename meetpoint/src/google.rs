//! Google Maps Platform backend.
//!
//! This module provides [`GoogleMapsClient`], which implements both
//! [`CoordinateResolver`] (Geocoding API) and [`DistanceOracle`] (Distance
//! Matrix API). It is only available when the `google` feature is enabled.
//!
//! # Example
//!
//! ```ignore
//! use meetpoint::google::{GoogleConfig, GoogleMapsClient, TravelMode};
//!
//! let client = GoogleMapsClient::new(
//!     GoogleConfig::new("your-api-key").with_mode(TravelMode::Walking),
//! )?;
//!
//! let office = client.geocode("849VCWC8+R9")?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::coord::Coordinate;
use crate::error::{MeetpointError, Result};
use crate::oracle::DistanceOracle;
use crate::resolver::CoordinateResolver;

/// Production endpoint for the Google Maps web services.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Most origins the Distance Matrix API accepts in a single request.
pub const MAX_ORIGINS_PER_REQUEST: usize = 25;

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base delay between retries; attempt `n` waits `n` times this long.
const RETRY_DELAY_MS: u64 = 200;

const GEOCODE_PATH: &str = "/maps/api/geocode/json";
const DISTANCE_MATRIX_PATH: &str = "/maps/api/distancematrix/json";

/// Travel mode used for Distance Matrix requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    /// The value sent as the `mode` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = MeetpointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "driving" | "drive" | "car" => Ok(TravelMode::Driving),
            "walking" | "walk" => Ok(TravelMode::Walking),
            "bicycling" | "bicycle" | "bike" => Ok(TravelMode::Bicycling),
            "transit" => Ok(TravelMode::Transit),
            other => Err(MeetpointError::Config {
                message: format!(
                    "unknown travel mode '{}' (expected driving, walking, bicycling or transit)",
                    other
                ),
            }),
        }
    }
}

/// Configuration for the Google Maps backend.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Google Maps Platform API key.
    pub api_key: String,
    /// Scheme and host of the web service, without a trailing path.
    pub base_url: String,
    /// Travel mode for distance queries.
    pub mode: TravelMode,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts on transport or HTTP errors.
    pub max_retries: u32,
}

impl GoogleConfig {
    /// Create a configuration with default endpoint, driving mode and
    /// 2 retries.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: TravelMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 2,
        }
    }

    /// Point the client at a different host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the travel mode.
    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

/// Blocking client for the Geocoding and Distance Matrix APIs.
pub struct GoogleMapsClient {
    client: Client,
    config: GoogleConfig,
}

impl GoogleMapsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GoogleConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(MeetpointError::Config {
                message: "Google Maps API key is empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// The active configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Geocode an address or Plus Code, returning the first match.
    pub fn geocode(&self, address: &str) -> Result<Coordinate> {
        let failure = |reason: String| MeetpointError::GeocodeFailure {
            code: address.to_string(),
            reason,
        };

        let response: GeocodeResponse = self
            .get_json(GEOCODE_PATH, &[("address", address.to_string())])
            .map_err(|e| failure(e.to_string()))?;

        match response.status.as_str() {
            "OK" => {
                let location = response
                    .results
                    .first()
                    .map(|r| &r.geometry.location)
                    .ok_or_else(|| failure("response contained no results".to_string()))?;
                Coordinate::new(location.lat, location.lng).map_err(|e| failure(e.to_string()))
            }
            "ZERO_RESULTS" => Err(failure("no matching location".to_string())),
            status => Err(failure(status_reason(status, response.error_message))),
        }
    }

    /// Travel distance in meters from each origin to `destination`.
    ///
    /// Origins are sent in batches of [`MAX_ORIGINS_PER_REQUEST`]; the
    /// results are concatenated in input order. Any origin without a route
    /// fails the whole call.
    pub fn distance_matrix(
        &self,
        origins: &[Coordinate],
        destination: Coordinate,
    ) -> Result<Vec<f64>> {
        let mut distances = Vec::with_capacity(origins.len());
        for batch in origins.chunks(MAX_ORIGINS_PER_REQUEST) {
            distances.extend(self.distance_batch(batch, destination)?);
        }
        Ok(distances)
    }

    fn distance_batch(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>> {
        let failure = |reason: String| MeetpointError::OracleFailure { reason };

        let query = [
            ("origins", format_locations(origins)),
            ("destinations", format_location(destination)),
            ("mode", self.config.mode.as_str().to_string()),
        ];
        let response: DistanceMatrixResponse = self
            .get_json(DISTANCE_MATRIX_PATH, &query)
            .map_err(|e| failure(e.to_string()))?;

        if response.status != "OK" {
            return Err(failure(status_reason(&response.status, response.error_message)));
        }
        if response.rows.len() != origins.len() {
            return Err(failure(format!(
                "expected {} rows, got {}",
                origins.len(),
                response.rows.len()
            )));
        }

        response
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| match row.elements.first() {
                Some(MatrixElement {
                    distance: Some(distance),
                    status,
                }) if status == "OK" => Ok(distance.value),
                Some(element) => Err(failure(format!(
                    "no route from {} ({})",
                    format_location(origins[i]),
                    element.status
                ))),
                None => Err(failure(format!(
                    "no elements for origin {}",
                    format_location(origins[i])
                ))),
            })
            .collect()
    }

    /// GET a JSON document, retrying transport and HTTP errors.
    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
            }

            match self.send(&url, query) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::debug!(path, attempt, error = %e, "Google Maps request failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MeetpointError::Config {
            message: "no request attempted".to_string(),
        }))
    }

    fn send<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())])
            .send()?
            .error_for_status()?;

        Ok(response.json()?)
    }
}

impl CoordinateResolver for GoogleMapsClient {
    fn resolve(&self, code: &str) -> Result<Coordinate> {
        self.geocode(code)
    }
}

impl DistanceOracle for GoogleMapsClient {
    fn distances(&self, origins: &[Coordinate], destination: Coordinate) -> Result<Vec<f64>> {
        self.distance_matrix(origins, destination)
    }
}

fn status_reason(status: &str, message: Option<String>) -> String {
    match message {
        Some(message) => format!("{}: {}", status, message),
        None => status.to_string(),
    }
}

pub(crate) fn format_location(coord: Coordinate) -> String {
    format!("{},{}", coord.lat(), coord.lng())
}

pub(crate) fn format_locations(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|&c| format_location(c))
        .collect::<Vec<_>>()
        .join("|")
}
