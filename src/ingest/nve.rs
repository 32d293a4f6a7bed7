/// NVE HydAPI station search.
///
/// Finds active hydrological stations measuring water level or discharge
/// within a small circle around a point:
///   https://hydapi.nve.no/api/v1/Stations
///
/// The upstream JSON is passed to the client verbatim; this module only
/// guarantees it is bounded in size and is JSON at all.

use crate::config::HydrologyConfig;
use crate::geometry::build_circle_polygon;
use crate::ingest::fetch::UpstreamClient;
use crate::model::{Coordinate, FetchError, ServiceError};

/// HydAPI parameter ids: 1000 = stage (water level), 1001 = discharge.
pub const STATION_PARAMETERS: &str = "1000,1001";

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds the station search URL with a WKT polygon filter around `point`.
///
/// Query keys are in sorted order and every value is percent-encoded.
pub fn build_stations_url(base_url: &str, point: Coordinate) -> String {
    let polygon = build_circle_polygon(point);
    format!(
        "{}?Active=1&ParameterName={}&Polygon={}",
        base_url,
        urlencoding::encode(STATION_PARAMETERS),
        urlencoding::encode(&polygon)
    )
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetches stations near `point` and returns the upstream body untouched.
///
/// # Errors
/// - `ServiceError::UpstreamUnavailable`: transport failure, non-2xx, a
///   body over `hydrology.max_body_bytes`, or a body that is not JSON.
pub fn fetch_stations(
    client: &UpstreamClient,
    config: &HydrologyConfig,
    api_key: &str,
    point: Coordinate,
) -> Result<Vec<u8>, ServiceError> {
    let url = build_stations_url(&config.stations_url, point);
    let headers = [("X-API-Key", api_key), ("Accept", "application/json")];

    let body = match client.fetch(&url, &headers, config.max_body_bytes) {
        Ok(body) => body,
        Err(FetchError::Status(code)) => {
            log::warn!(
                "NVE upstream returned HTTP {} for lat={} lon={}",
                code,
                point.lat,
                point.lon
            );
            return Err(FetchError::Status(code).into());
        }
        Err(e) => {
            log::warn!("NVE upstream error: {}", e);
            return Err(e.into());
        }
    };

    if !is_json(&body) {
        log::warn!("NVE upstream returned non-JSON body (len={})", body.len());
        return Err(ServiceError::UpstreamUnavailable(
            "upstream returned invalid JSON".to_string(),
        ));
    }

    Ok(body)
}

/// True if `body` is one complete JSON value.
pub fn is_json(body: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
}
