use std::fmt;

use thiserror::Error;

/// A forecast payload that does not match the expected shape.
///
/// `path` points at the offending field using dotted/indexed notation,
/// e.g. `hourly.temperature_2m[3]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema violation at `{path}`: expected {expected}, found {actual}")]
pub struct SchemaViolation {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl SchemaViolation {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(path, expected, "nothing (field is missing)")
    }
}

/// Every way a single forecast run can fail.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("could not find coordinates for address '{address}'")]
    AddressNotFound { address: String },

    #[error("geocoding service failed for address '{address}': {reason}")]
    GeocodingService { address: String, reason: String },

    #[error("forecast request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

/// Discriminant of [`ForecastError`], handy for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AddressNotFound,
    GeocodingServiceError,
    TransportError,
    SchemaViolation,
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::AddressNotFound { .. } => ErrorKind::AddressNotFound,
            ForecastError::GeocodingService { .. } => ErrorKind::GeocodingServiceError,
            ForecastError::Transport(_) => ErrorKind::TransportError,
            ForecastError::Schema(_) => ErrorKind::SchemaViolation,
        }
    }

    pub(crate) fn geocoding(address: &str, reason: impl fmt::Display) -> Self {
        ForecastError::GeocodingService {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::AddressNotFound => "address not found",
            ErrorKind::GeocodingServiceError => "geocoding service error",
            ErrorKind::TransportError => "transport error",
            ErrorKind::SchemaViolation => "schema violation",
        };
        f.write_str(s)
    }
}

/// Shorten a response body so it can be embedded in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
