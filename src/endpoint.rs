/// HTTP endpoint for the map client
///
/// Normalizes the three upstream sources into stable JSON and serves the
/// static client.
///
/// Endpoints:
/// - GET /api/stores                             - All Narvesen stores (cached)
/// - GET /api/geology?lat=&lon=&layer=            - NGU bedrock/sediment at a point
/// - GET /api/hydrology?lat=&lon=                 - NVE stations near a point
/// - GET /health                                  - Service health check
/// - GET /*                                       - Static files
///
/// `/api/narvesen`, `/api/ngu` and `/api/nve` answer the same as their
/// long forms; map clients call the geology and hydrology routes by the
/// upstream's name. The client itself is deployed into `server.static_dir`
/// and is not part of this crate.

use crate::cache::StoreCache;
use crate::config::ServiceConfig;
use crate::geometry::validate_coords;
use crate::ingest::fetch::UpstreamClient;
use crate::ingest::narvesen::{self, RegexStoreExtractor, StoreExtractor};
use crate::ingest::ngu::{self, GeologyLayer};
use crate::ingest::nve;
use crate::model::{FeatureFields, FetchError, ServiceError};
use crate::static_files;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use threadpool::ThreadPool;
use tiny_http::{Header, Method, Request, Server};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Everything a handler needs, built once at startup and shared by `Arc`.
pub struct AppState {
    pub config: ServiceConfig,
    pub client: UpstreamClient,
    pub store_cache: StoreCache,
    pub extractor: Box<dyn StoreExtractor>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, FetchError> {
        let client = UpstreamClient::new(&config.upstream)?;
        let store_cache = StoreCache::with_system_clock(config.stores.cache_ttl());
        Ok(Self::with_parts(config, client, store_cache, Box::new(RegexStoreExtractor)))
    }

    pub fn with_parts(
        config: ServiceConfig,
        client: UpstreamClient,
        store_cache: StoreCache,
        extractor: Box<dyn StoreExtractor>,
    ) -> Self {
        Self {
            config,
            client,
            store_cache,
            extractor,
        }
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// A fully buffered response, independent of the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Body of `/api/geology`.
#[derive(Debug, Serialize)]
pub struct GeologyResponse {
    pub layer: &'static str,
    pub available: bool,
    pub fields: FeatureFields,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

const JSON: &str = "application/json";

impl ApiResponse {
    pub fn new(status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, JSON, body),
            Err(e) => {
                log::error!("Failed to serialize response: {}", e);
                Self::new(500, JSON, br#"{"error":"internal error"}"#.to_vec())
            }
        }
    }

    /// `{"error": "..."}` with the status and message for `err`'s kind.
    pub fn error(err: &ServiceError) -> Self {
        Self::json(
            err.status_code(),
            &ErrorBody {
                error: &err.public_message(),
            },
        )
    }

    pub fn into_tiny_http(self) -> tiny_http::Response<Cursor<Vec<u8>>> {
        let response =
            tiny_http::Response::from_data(self.body).with_status_code(self.status);
        match Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Splits `url` into path and decoded query parameters.
///
/// The first occurrence of a repeated key wins; `+` decodes to a space.
pub fn parse_url(url: &str) -> (&str, HashMap<String, String>) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let mut params = HashMap::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }

    (path, params)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Dispatches one request. Never fails: every error becomes a response.
pub fn route(state: &AppState, method: &Method, url: &str) -> ApiResponse {
    let (path, params) = parse_url(url);
    let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

    let result = match path {
        "/health" => Ok(handle_health()),
        "/api/stores" | "/api/narvesen" => require_get(method).and_then(|_| handle_stores(state)),
        "/api/geology" | "/api/ngu" => require_get(method)
            .and_then(|_| handle_geology(state, param("lat"), param("lon"), param("layer"))),
        "/api/hydrology" | "/api/nve" => require_get(method)
            .and_then(|_| handle_hydrology(state, param("lat"), param("lon"))),
        p if p.starts_with("/api/") => Err(ServiceError::NotFound),
        p => Ok(static_files::serve(
            Path::new(&state.config.server.static_dir),
            method,
            p,
        )),
    };

    result.unwrap_or_else(|err| {
        if err.status_code() >= 500 {
            log::warn!("{} {} failed: {}", method, path, err);
        } else {
            log::debug!("{} {} rejected: {}", method, path, err);
        }
        ApiResponse::error(&err)
    })
}

fn require_get(method: &Method) -> Result<(), ServiceError> {
    match method {
        Method::Get => Ok(()),
        _ => Err(ServiceError::MethodNotAllowed),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Handle /health endpoint
fn handle_health() -> ApiResponse {
    ApiResponse::json(
        200,
        &serde_json::json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

/// Handle /api/stores: cached Narvesen store list
fn handle_stores(state: &AppState) -> Result<ApiResponse, ServiceError> {
    let stores = state.store_cache.get_or_fetch(|| {
        narvesen::fetch_stores(&state.client, &state.config.stores, state.extractor.as_ref())
    })?;
    Ok(ApiResponse::json(200, stores.as_slice()))
}

/// Handle /api/geology: first GML feature at a point
fn handle_geology(
    state: &AppState,
    lat: &str,
    lon: &str,
    layer: &str,
) -> Result<ApiResponse, ServiceError> {
    let point = validate_coords(lat, lon)?;
    let layer = GeologyLayer::parse(layer)?;

    let fields = ngu::fetch_feature(&state.client, &state.config.geology, layer, point)?;

    Ok(ApiResponse::json(
        200,
        &GeologyResponse {
            layer: layer.as_str(),
            available: !fields.is_empty(),
            fields,
        },
    ))
}

/// Handle /api/hydrology: NVE station search, body passed through
fn handle_hydrology(state: &AppState, lat: &str, lon: &str) -> Result<ApiResponse, ServiceError> {
    let api_key = state
        .config
        .nve_api_key
        .as_deref()
        .ok_or(ServiceError::ConfigurationMissing("NVE API key"))?;

    let point = validate_coords(lat, lon)?;
    let body = nve::fetch_stations(&state.client, &state.config.hydrology, api_key, point)?;
    Ok(ApiResponse::new(200, JSON, body))
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Binds `server.listen_addr` and serves until the process exits.
pub fn start_endpoint_server(state: Arc<AppState>) -> Result<(), String> {
    let addr = state.config.server.listen_addr.clone();
    let server = Server::http(&addr)
        .map_err(|e| format!("Failed to start HTTP server on {}: {}", addr, e))?;

    log::info!("HTTP endpoint listening on http://{}", addr);
    log::info!("   GET /api/stores - Narvesen stores");
    log::info!("   GET /api/geology?lat=&lon=&layer=bedrock|sediment - NGU geology");
    log::info!("   GET /api/hydrology?lat=&lon= - NVE stations");

    serve(server, state);
    Ok(())
}

/// Accept loop: each request runs on the worker pool.
pub fn serve(server: Server, state: Arc<AppState>) {
    let pool = ThreadPool::new(state.config.server.worker_threads);

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        pool.execute(move || handle_request(&state, request));
    }
}

fn handle_request(state: &AppState, request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let response = route(state, &method, &url);
    log::debug!("{} {} -> {}", method, url, response.status);

    if let Err(e) = request.respond(response.into_tiny_http()) {
        log::warn!("Failed to send response: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
