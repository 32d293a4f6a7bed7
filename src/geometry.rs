/// Coordinate validation and the geometry strings sent upstream.
///
/// Every coordinate-taking endpoint goes through `validate_coords` first;
/// the WKT polygon feeds the NVE spatial filter and the bounding box frames
/// the NGU GetFeatureInfo query.

use crate::model::{Coordinate, ServiceError};
use std::f64::consts::PI;

// Norway, generously: Svalbard is inside, the North Sea oil fields too.
pub const LAT_MIN: f64 = 57.0;
pub const LAT_MAX: f64 = 82.0;
pub const LON_MIN: f64 = -2.0;
pub const LON_MAX: f64 = 35.0;

/// Radius of the search circle, in degrees.
pub const CIRCLE_RADIUS_DEG: f64 = 0.1;
pub const CIRCLE_VERTICES: usize = 8;

/// Half-width of the WMS query box, in degrees.
pub const BBOX_HALF_WIDTH_DEG: f64 = 0.01;

/// Validates raw `lat`/`lon` query values.
///
/// # Errors
/// `ServiceError::InvalidInput` naming the rule that failed:
/// - either value empty
/// - either value not a finite decimal number
/// - the point lies outside the Norway bounding box
pub fn validate_coords(lat_text: &str, lon_text: &str) -> Result<Coordinate, ServiceError> {
    if lat_text.is_empty() || lon_text.is_empty() {
        return Err(ServiceError::InvalidInput(
            "lat and lon are required".to_string(),
        ));
    }

    let lat = parse_finite(lat_text)
        .ok_or_else(|| ServiceError::InvalidInput("invalid lat: must be a number".to_string()))?;
    let lon = parse_finite(lon_text)
        .ok_or_else(|| ServiceError::InvalidInput("invalid lon: must be a number".to_string()))?;

    if !(LAT_MIN..=LAT_MAX).contains(&lat) || !(LON_MIN..=LON_MAX).contains(&lon) {
        return Err(ServiceError::InvalidInput(
            "coordinates out of Norway bounds (lat 57-82, lon -2 to 35)".to_string(),
        ));
    }

    Ok(Coordinate { lat, lon })
}

/// Parses a decimal number, rejecting NaN and infinities.
pub fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds an 8-vertex approximate circle around `center` as a WKT POLYGON.
///
/// Vertex `i` sits at angle `2π·i/8`; the first vertex is repeated to close
/// the ring, so the output always has nine coordinate pairs.
pub fn build_circle_polygon(center: Coordinate) -> String {
    let mut ring: Vec<String> = (0..CIRCLE_VERTICES)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / CIRCLE_VERTICES as f64;
            let lon = center.lon + CIRCLE_RADIUS_DEG * angle.cos();
            let lat = center.lat + CIRCLE_RADIUS_DEG * angle.sin();
            format!("{:.6} {:.6}", lon, lat)
        })
        .collect();

    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }

    format!("POLYGON(({}))", ring.join(","))
}

/// WMS 1.1.1 `BBOX` value (`minx,miny,maxx,maxy` in EPSG:4326) centred on
/// `center`.
pub fn wms_bbox(center: Coordinate) -> String {
    format!(
        "{:.6},{:.6},{:.6},{:.6}",
        center.lon - BBOX_HALF_WIDTH_DEG,
        center.lat - BBOX_HALF_WIDTH_DEG,
        center.lon + BBOX_HALF_WIDTH_DEG,
        center.lat + BBOX_HALF_WIDTH_DEG,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
