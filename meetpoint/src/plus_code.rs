//! Open Location Code (Plus Code) utilities.
//!
//! Full Plus Codes can be converted to coordinates without any network
//! access. Short codes such as `CWC8+R9 Mountain View` need a reference
//! location and are left to a geocoding service.
//!
//! # Code Format
//!
//! A full code is 8 digits, a `+` separator, then optional refinement digits:
//! `849VCWC8+R9`. Digits come from the 20-character alphabet
//! `23456789CFGHJMPQRVWX`.
//!
//! - Digits 1-10 are latitude/longitude pairs in base 20 (20°, 1°, 0.05°,
//!   0.0025°, 0.000125°)
//! - Digits 11-15 each split the cell into a 5-row × 4-column grid
//! - Codes shorter than 8 digits are padded with `0` up to the separator
//!   (`7FG49Q00+`)

use serde::Serialize;

use crate::coord::Coordinate;
use crate::error::{MeetpointError, Result};

const SEPARATOR: char = '+';
const SEPARATOR_POSITION: usize = 8;
const PADDING: char = '0';
const ALPHABET: &[u8; 20] = b"23456789CFGHJMPQRVWX";
const ENCODING_BASE: i64 = 20;
const PAIR_CODE_LENGTH: usize = 10;
const MAX_CODE_LENGTH: usize = 15;
const GRID_ROWS: i64 = 5;
const GRID_COLUMNS: i64 = 4;

/// Place value of the first pair digit, in units of the pair precision.
const PAIR_FIRST_PLACE_VALUE: i64 = 160_000; // 20^4
/// Units per degree after the five pair digits.
const PAIR_PRECISION: i64 = 8000;
/// Place values of the first grid digit.
const GRID_LAT_FIRST_PLACE_VALUE: i64 = 625; // 5^4
const GRID_LNG_FIRST_PLACE_VALUE: i64 = 256; // 4^4
/// Units per degree after all fifteen digits.
const FINAL_LAT_PRECISION: i64 = PAIR_PRECISION * 3125; // 5^5
const FINAL_LNG_PRECISION: i64 = PAIR_PRECISION * 1024; // 4^5

/// The rectangle a Plus Code stands for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CodeArea {
    /// Southern boundary latitude.
    pub south: f64,
    /// Western boundary longitude.
    pub west: f64,
    /// Northern boundary latitude.
    pub north: f64,
    /// Eastern boundary longitude.
    pub east: f64,
    /// Number of significant digits in the code.
    pub code_length: usize,
}

impl CodeArea {
    /// Center of the area, capped to the valid coordinate range.
    pub fn center(&self) -> Coordinate {
        let lat = (self.south + (self.north - self.south) / 2.0).min(90.0);
        let lng = (self.west + (self.east - self.west) / 2.0).min(180.0);
        Coordinate::clamped(lat, lng)
    }
}

fn digit_value(c: char) -> Option<i64> {
    let upper = c.to_ascii_uppercase();
    ALPHABET
        .iter()
        .position(|&b| b as char == upper)
        .map(|i| i as i64)
}

/// Describe why `code` is not a valid Plus Code, or `None` if it is valid.
fn validation_error(code: &str) -> Option<&'static str> {
    if !code.is_ascii() {
        return Some("contains non-ASCII characters");
    }

    let separator = match code.find(SEPARATOR) {
        Some(pos) => pos,
        None => return Some("missing '+' separator"),
    };
    if code.rfind(SEPARATOR) != Some(separator) {
        return Some("more than one '+' separator");
    }
    if separator > SEPARATOR_POSITION || separator % 2 == 1 {
        return Some("separator in the wrong position");
    }

    if let Some(pad_start) = code.find(PADDING) {
        if pad_start == 0 {
            return Some("code cannot start with padding");
        }
        let pad_len = code[pad_start..].chars().take_while(|&c| c == PADDING).count();
        if pad_start % 2 == 1 || pad_len % 2 == 1 {
            return Some("padding must come in pairs");
        }
        if pad_start + pad_len != separator {
            return Some("padding must run up to the separator");
        }
        if code.len() > separator + 1 {
            return Some("padded codes cannot have digits after the separator");
        }
    }

    if code.len() - separator - 1 == 1 {
        return Some("a single digit after the separator is not allowed");
    }

    let bad_digit = code
        .chars()
        .filter(|&c| c != SEPARATOR && c != PADDING)
        .any(|c| digit_value(c).is_none());
    if bad_digit {
        return Some("contains characters outside the Plus Code alphabet");
    }

    None
}

/// Check whether a string is a valid Plus Code, full or short.
pub fn is_valid(code: &str) -> bool {
    validation_error(code).is_none()
}

/// Check whether a string is a valid short Plus Code (fewer than 8 digits
/// before the separator).
pub fn is_short(code: &str) -> bool {
    is_valid(code) && code.find(SEPARATOR).is_some_and(|pos| pos < SEPARATOR_POSITION)
}

/// Check whether a string is a valid full Plus Code.
///
/// # Examples
///
/// ```
/// use meetpoint::plus_code::is_full;
///
/// assert!(is_full("849VCWC8+R9"));
/// assert!(is_full("7FG49Q00+"));
/// assert!(!is_full("CWC8+R9")); // short code
/// assert!(!is_full("not a code"));
/// ```
pub fn is_full(code: &str) -> bool {
    if !is_valid(code) || is_short(code) {
        return false;
    }

    let mut chars = code.chars();
    // First latitude digit cannot exceed 180°, first longitude digit 360°
    let lat_ok = chars
        .next()
        .and_then(digit_value)
        .is_some_and(|v| v * ENCODING_BASE < 180);
    let lng_ok = chars
        .next()
        .and_then(digit_value)
        .is_some_and(|v| v * ENCODING_BASE < 360);

    lat_ok && lng_ok
}

/// Decode a full Plus Code into the area it covers.
///
/// # Errors
///
/// Returns [`MeetpointError::InvalidPlusCode`] if the code is not a valid
/// full code. Short codes are rejected because they need a reference point.
///
/// # Examples
///
/// ```
/// use meetpoint::plus_code::decode;
///
/// let area = decode("7FG49Q00+").unwrap();
/// assert!((area.south - 20.35).abs() < 1e-9);
/// assert!((area.west - 2.75).abs() < 1e-9);
/// assert_eq!(area.code_length, 6);
/// ```
pub fn decode(code: &str) -> Result<CodeArea> {
    let code = code.trim();
    if !is_full(code) {
        let reason = validation_error(code).unwrap_or(if is_short(code) {
            "short codes need a reference location"
        } else {
            "not a full code"
        });
        return Err(MeetpointError::InvalidPlusCode {
            code: code.to_string(),
            reason: reason.to_string(),
        });
    }

    let digits: Vec<i64> = code
        .chars()
        .filter(|&c| c != SEPARATOR && c != PADDING)
        .take(MAX_CODE_LENGTH)
        .filter_map(digit_value)
        .collect();

    let mut normal_lat = -90 * PAIR_PRECISION;
    let mut normal_lng = -180 * PAIR_PRECISION;
    let mut extra_lat = 0;
    let mut extra_lng = 0;

    let pair_digits = digits.len().min(PAIR_CODE_LENGTH);
    let mut place_value = PAIR_FIRST_PLACE_VALUE;
    for i in (0..pair_digits).step_by(2) {
        normal_lat += digits[i] * place_value;
        normal_lng += digits[i + 1] * place_value;
        if i + 2 < pair_digits {
            place_value /= ENCODING_BASE;
        }
    }
    let mut lat_precision = place_value as f64 / PAIR_PRECISION as f64;
    let mut lng_precision = place_value as f64 / PAIR_PRECISION as f64;

    if digits.len() > PAIR_CODE_LENGTH {
        let mut row_value = GRID_LAT_FIRST_PLACE_VALUE;
        let mut col_value = GRID_LNG_FIRST_PLACE_VALUE;
        for (i, &d) in digits.iter().enumerate().skip(PAIR_CODE_LENGTH) {
            extra_lat += (d / GRID_COLUMNS) * row_value;
            extra_lng += (d % GRID_COLUMNS) * col_value;
            if i + 1 < digits.len() {
                row_value /= GRID_ROWS;
                col_value /= GRID_COLUMNS;
            }
        }
        lat_precision = row_value as f64 / FINAL_LAT_PRECISION as f64;
        lng_precision = col_value as f64 / FINAL_LNG_PRECISION as f64;
    }

    let south = normal_lat as f64 / PAIR_PRECISION as f64
        + extra_lat as f64 / FINAL_LAT_PRECISION as f64;
    let west = normal_lng as f64 / PAIR_PRECISION as f64
        + extra_lng as f64 / FINAL_LNG_PRECISION as f64;

    Ok(CodeArea {
        south,
        west,
        north: south + lat_precision,
        east: west + lng_precision,
        code_length: digits.len(),
    })
}

/// Encode a coordinate as a Plus Code of the given length.
///
/// Valid lengths are 2, 4, 6, 8 and 10 through 15. Length 10 is about
/// 14 × 14 meters.
///
/// # Errors
///
/// Returns [`MeetpointError::InvalidCodeLength`] for any other length.
///
/// # Examples
///
/// ```
/// use meetpoint::{plus_code::encode, Coordinate};
///
/// let coord = Coordinate::new(20.375, 2.775).unwrap();
/// assert_eq!(encode(coord, 6).unwrap(), "7FG49Q00+");
/// ```
pub fn encode(coord: Coordinate, code_length: usize) -> Result<String> {
    if !(2..=MAX_CODE_LENGTH).contains(&code_length)
        || (code_length < PAIR_CODE_LENGTH && code_length % 2 == 1)
    {
        return Err(MeetpointError::InvalidCodeLength {
            length: code_length,
        });
    }

    // Round first so values like 2.775 do not floor one unit low
    let scale = |degrees: f64, precision: i64| -> i64 {
        ((degrees * precision as f64 * 1e6).round() / 1e6).floor() as i64
    };
    let lat_max = 180 * FINAL_LAT_PRECISION;
    let lng_max = 360 * FINAL_LNG_PRECISION;
    // The north pole belongs to the topmost cell
    let mut lat_val = scale(coord.lat() + 90.0, FINAL_LAT_PRECISION).clamp(0, lat_max - 1);
    // Longitude 180 wraps to -180
    let mut lng_val = scale(coord.lng() + 180.0, FINAL_LNG_PRECISION).rem_euclid(lng_max);

    let mut digits = [0u8; MAX_CODE_LENGTH];

    for i in (PAIR_CODE_LENGTH..MAX_CODE_LENGTH).rev() {
        let row = lat_val % GRID_ROWS;
        let col = lng_val % GRID_COLUMNS;
        digits[i] = ALPHABET[(row * GRID_COLUMNS + col) as usize];
        lat_val /= GRID_ROWS;
        lng_val /= GRID_COLUMNS;
    }
    for i in (0..PAIR_CODE_LENGTH).step_by(2).rev() {
        digits[i] = ALPHABET[(lat_val % ENCODING_BASE) as usize];
        digits[i + 1] = ALPHABET[(lng_val % ENCODING_BASE) as usize];
        lat_val /= ENCODING_BASE;
        lng_val /= ENCODING_BASE;
    }

    let mut code = String::with_capacity(MAX_CODE_LENGTH + 1);
    for (i, &d) in digits.iter().enumerate() {
        if i == SEPARATOR_POSITION {
            code.push(SEPARATOR);
        }
        if i < code_length {
            code.push(d as char);
        } else if i < SEPARATOR_POSITION {
            code.push(PADDING);
        }
    }

    Ok(code)
}
