/// norgesglass_service: upstream normalizer for the Norgesglass map client.
///
/// # Module structure
///
/// ```text
/// norgesglass_service
/// ├── model       - shared data types (StoreRecord, Coordinate, ServiceError, …)
/// ├── config      - service.toml loader + environment overrides
/// ├── geometry    - coordinate validation, WKT circle, WMS bbox
/// ├── cache       - single-slot TTL cache for the store list
/// ├── endpoint    - tiny_http server, routing and JSON handlers
/// ├── static_files - map client assets, no directory listings
/// └── ingest
///     ├── fetch    - bounded, status-classifying GET
///     ├── narvesen - store-locator HTML scraping
///     ├── ngu      - WMS GetFeatureInfo + streaming GML feature extraction
///     ├── nve      - HydAPI station search passthrough
///     └── fixtures (test only) - representative upstream payloads
/// ```

/// Public modules
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod geometry;
pub mod ingest;
pub mod model;
pub mod static_files;
