/// Shared data types and error enums.
///
/// Everything that crosses a module boundary lives here: the records the
/// extractors produce, the validated coordinate, and the error taxonomy the
/// handlers map onto HTTP status codes.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single Narvesen store recovered from the store-locator page.
///
/// `lat`/`lng` are always real numbers; blocks with unparseable coordinates
/// never become a `StoreRecord`. `address` and `city` are empty when the
/// markup did not carry them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRecord {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub city: String,
}

/// Field name → text for the first feature of a GML response.
///
/// A `BTreeMap` keeps the JSON output ordered by key.
pub type FeatureFields = BTreeMap<String, String>;

/// A latitude/longitude pair that passed `geometry::validate_coords`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Outcome classification for a single upstream GET.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS failure, refused connection, timeout, bad URL.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status. The body was drained.
    #[error("upstream returned {0}")]
    Status(u16),

    /// More than `limit` bytes were available.
    #[error("upstream response exceeded {limit} byte limit")]
    BodyTooLarge { limit: usize },

    /// The connection broke while reading the body.
    #[error("failed to read upstream body: {0}")]
    Read(#[from] std::io::Error),
}

/// Failure of the streaming GML extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("parsing GML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Failure to load `service.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Request-level error taxonomy.
///
/// Each variant maps to one HTTP status and one fixed client-facing
/// message; the detailed cause is only ever logged.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad, missing or out-of-range coordinates, or an unknown layer.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("not found")]
    NotFound,

    /// Transport failure, non-2xx status, oversized or non-JSON body.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A required credential is not set.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    /// The HTML source produced zero records.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// The upstream body could not be tokenized.
    #[error("failed to parse upstream response: {0}")]
    UpstreamParse(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidInput(_) => 400,
            ServiceError::NotFound => 404,
            ServiceError::MethodNotAllowed => 405,
            ServiceError::UpstreamParse(_) => 500,
            ServiceError::UpstreamUnavailable(_) | ServiceError::ExtractionFailed(_) => 502,
            ServiceError::ConfigurationMissing(_) => 503,
        }
    }

    /// The message returned to clients.
    ///
    /// Validation messages are produced by this service and are safe to echo;
    /// everything else collapses to a generic string per kind.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::InvalidInput(msg) => msg.clone(),
            ServiceError::NotFound => "not found".to_string(),
            ServiceError::MethodNotAllowed => "method not allowed".to_string(),
            ServiceError::UpstreamUnavailable(_) | ServiceError::ExtractionFailed(_) => {
                "upstream request failed".to_string()
            }
            ServiceError::UpstreamParse(_) => "failed to parse upstream response".to_string(),
            ServiceError::ConfigurationMissing(what) => format!("{} not configured", what),
        }
    }
}

impl From<FetchError> for ServiceError {
    fn from(err: FetchError) -> Self {
        ServiceError::UpstreamUnavailable(err.to_string())
    }
}

impl From<ExtractError> for ServiceError {
    fn from(err: ExtractError) -> Self {
        ServiceError::UpstreamParse(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(ServiceError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(ServiceError::UpstreamUnavailable("x".into()).status_code(), 502);
        assert_eq!(ServiceError::ExtractionFailed("x".into()).status_code(), 502);
        assert_eq!(ServiceError::ConfigurationMissing("key").status_code(), 503);
        assert_eq!(ServiceError::UpstreamParse("x".into()).status_code(), 500);
        assert_eq!(ServiceError::MethodNotAllowed.status_code(), 405);
    }

    #[test]
    fn test_public_message_hides_upstream_detail() {
        let err: ServiceError = FetchError::Status(503).into();
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.public_message(), "upstream request failed");
        assert!(err.to_string().contains("503"), "detail kept for logs: {}", err);
    }

    #[test]
    fn test_invalid_input_message_is_echoed() {
        let err = ServiceError::InvalidInput("lat and lon are required".into());
        assert_eq!(err.public_message(), "lat and lon are required");
    }

    #[test]
    fn test_store_record_serializes_with_expected_keys() {
        let store = StoreRecord {
            name: "Narvesen Oslo S".to_string(),
            lat: 59.91,
            lng: 10.75,
            address: "Jernbanetorget 1".to_string(),
            city: "Oslo".to_string(),
        };
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["name"], "Narvesen Oslo S");
        assert_eq!(json["lng"], 10.75);
        assert_eq!(json["city"], "Oslo");
    }
}
