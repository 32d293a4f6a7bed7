//! Norgesglass Service - API proxy and static server
//!
//! Serves the Norgesglass map client and normalizes three upstreams into
//! stable JSON:
//! 1. Narvesen store locator (HTML, scraped and cached for 24h)
//! 2. NGU bedrock/sediment WMS (GetFeatureInfo GML)
//! 3. NVE HydAPI hydrological stations (JSON, passed through)
//!
//! Usage:
//!   cargo run --release                              # Listen on localhost:8080
//!   cargo run --release -- --listen 0.0.0.0:8080     # Override listen address
//!   cargo run --release -- --config ./service.toml   # Alternate config file
//!
//! Environment:
//!   NVE_API_KEY - HydAPI key; without it /api/hydrology answers 503
//!   LISTEN_ADDR - listen address (overridden by --listen)
//!   RUST_LOG    - log filter, e.g. `norgesglass_service=debug`

use log::LevelFilter;
use norgesglass_service::config::{self, DEFAULT_CONFIG_PATH};
use norgesglass_service::endpoint::{self, AppState};
use std::env;
use std::sync::Arc;

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    // RUST_LOG, when set, takes precedence over the defaults above.
    builder.parse_default_env();
    builder.init();
}

fn main() {
    dotenv::dotenv().ok();
    init_logger();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut listen_override: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "--listen" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires a value", args[i]);
                    std::process::exit(1);
                };
                if args[i] == "--config" {
                    config_path = value.clone();
                } else {
                    listen_override = Some(value.clone());
                }
                i += 2;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--config PATH] [--listen ADDR]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(addr) = listen_override {
        config.server.listen_addr = addr;
    }

    if config.nve_api_key.is_none() {
        log::warn!(
            "{} environment variable is not set; /api/hydrology will return 503",
            config::API_KEY_ENV
        );
    }

    log::info!("Norgesglass service starting");
    log::info!(
        "   Store cache TTL: {}h, body limits: stores {} B, hydrology {} B",
        config.stores.cache_ttl_hours,
        config.stores.max_body_bytes,
        config.hydrology.max_body_bytes
    );
    log::info!("   Static files from ./{}", config.server.static_dir);

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = endpoint::start_endpoint_server(state) {
        log::error!("Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
