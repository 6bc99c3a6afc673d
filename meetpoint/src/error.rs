//! Error types for the meetpoint library.

use thiserror::Error;

use crate::resolver::FailedCode;

/// Errors that can occur while planning a meeting point.
#[derive(Error, Debug)]
pub enum MeetpointError {
    /// No location codes were submitted.
    #[error("No location codes were provided")]
    EmptyInput,

    /// Latitude or longitude outside the valid range.
    #[error("Invalid coordinate: lat={lat}, lng={lng} (valid: lat ±90°, lng ±180°)")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// A single location code could not be resolved to a coordinate.
    #[error("Could not resolve location code '{code}': {reason}")]
    GeocodeFailure { code: String, reason: String },

    /// Every submitted location code failed to resolve.
    #[error("Could not retrieve any valid coordinates from {} location code(s)", failures.len())]
    NoValidCoordinates { failures: Vec<FailedCode> },

    /// The distance oracle failed or returned unusable data.
    #[error("Distance oracle failed: {reason}")]
    OracleFailure { reason: String },

    /// A string is not a valid Open Location Code.
    #[error("Invalid Plus Code '{code}': {reason}")]
    InvalidPlusCode { code: String, reason: String },

    /// Requested Plus Code length is not one of the standard lengths.
    #[error("Invalid Plus Code length {length} (expected 2, 4, 6, 8 or 10 to 15)")]
    InvalidCodeLength { length: usize },

    /// Missing or malformed configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP error from the Google Maps backend.
    #[cfg(feature = "google")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using [`MeetpointError`].
pub type Result<T> = std::result::Result<T, MeetpointError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeetpointError::InvalidCoordinate {
            lat: 91.0,
            lng: 0.0,
        };
        assert!(err.to_string().contains("91"));

        let err = MeetpointError::GeocodeFailure {
            code: "849VCWC8+R9".to_string(),
            reason: "ZERO_RESULTS".to_string(),
        };
        assert!(err.to_string().contains("849VCWC8+R9"));
        assert!(err.to_string().contains("ZERO_RESULTS"));

        let err = MeetpointError::NoValidCoordinates {
            failures: vec![
                FailedCode::new("A", "not found"),
                FailedCode::new("B", "not found"),
            ],
        };
        assert!(err.to_string().contains("2 location code(s)"));

        let err = MeetpointError::InvalidCodeLength { length: 7 };
        assert!(err.to_string().contains('7'));
    }
}
