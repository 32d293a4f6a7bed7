/// Narvesen store-locator scraper.
///
/// The store list is only published as HTML on
///   https://narvesen.no/finn-butikk
/// where each store is an `<li>` carrying its coordinates and name as
/// `data-*` attributes:
///
/// ```text
/// <li data-lat="59.9111" data-lng="10.7503" data-title="Narvesen Oslo S" ...>
///   <div class="street-address">Jernbanetorget 1</div>
///   <span class="locality">Oslo</span>
/// </li>
/// ```
///
/// There is no machine-readable feed, so extraction is pattern based and
/// will break when the markup changes. `fetch_stores` treats an empty
/// result as exactly that signal.

use crate::config::StoresConfig;
use crate::geometry::parse_finite;
use crate::ingest::fetch::UpstreamClient;
use crate::model::{ServiceError, StoreRecord};
use regex::Regex;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Turns a page of HTML into store records. Implementations never fail;
/// no matches is an empty `Vec`.
pub trait StoreExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<StoreRecord>;
}

const STORE_BLOCK_PATTERN: &str =
    r#"(?s)<li\s+data-lat="([^"]+)"\s+data-lng="([^"]+)"\s+data-title="([^"]+)"[^>]*>.*?</li>"#;
const STREET_ADDRESS_PATTERN: &str = r#"<div class="street-address">([^<]+)</div>"#;
const LOCALITY_PATTERN: &str = r#"<span class="locality">([^<]+)</span>"#;

fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

static STORE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(STORE_BLOCK_PATTERN, "STORE_BLOCK_RE"));
static STREET_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(STREET_ADDRESS_PATTERN, "STREET_ADDRESS_RE"));
static LOCALITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(LOCALITY_PATTERN, "LOCALITY_RE"));

/// Regex extractor for the current narvesen.no markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexStoreExtractor;

impl StoreExtractor for RegexStoreExtractor {
    fn extract(&self, html: &str) -> Vec<StoreRecord> {
        parse_store_html(html)
    }
}

/// Extracts every store block in document order.
///
/// Blocks whose `data-lat` or `data-lng` is not a finite number are skipped
/// rather than emitted at (0, 0). The address and locality lookups are
/// scoped to the block's own text so they cannot pick up a neighbour's.
pub fn parse_store_html(html: &str) -> Vec<StoreRecord> {
    let mut stores = Vec::new();

    for cap in STORE_BLOCK_RE.captures_iter(html) {
        let (Some(lat), Some(lng)) = (parse_finite(&cap[1]), parse_finite(&cap[2])) else {
            log::debug!(
                "Skipping store block with bad coordinates: lat={:?} lng={:?}",
                &cap[1],
                &cap[2]
            );
            continue;
        };

        let block = &cap[0];
        let address = first_capture(&STREET_ADDRESS_RE, block);
        let city = first_capture(&LOCALITY_RE, block);

        stores.push(StoreRecord {
            name: decode_text(&cap[3]),
            lat,
            lng,
            address,
            city,
        });
    }

    stores
}

fn first_capture(re: &Regex, scope: &str) -> String {
    re.captures(scope)
        .and_then(|c| c.get(1))
        .map(|m| decode_text(m.as_str()))
        .unwrap_or_default()
}

/// Trims and decodes HTML entities (`&amp;`, `&#248;`, ...).
fn decode_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw.trim()).trim().to_string()
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Downloads the store page and extracts it.
///
/// # Errors
/// - `ServiceError::UpstreamUnavailable`: transport failure, non-2xx, or a
///   body over `stores.max_body_bytes`.
/// - `ServiceError::ExtractionFailed`: the page parsed to zero stores,
///   which almost always means the markup changed.
pub fn fetch_stores(
    client: &UpstreamClient,
    config: &StoresConfig,
    extractor: &dyn StoreExtractor,
) -> Result<Vec<StoreRecord>, ServiceError> {
    let body = client.fetch(&config.url, &[], config.max_body_bytes)?;
    let html = String::from_utf8_lossy(&body);

    let stores = extractor.extract(&html);
    if stores.is_empty() {
        log::warn!(
            "Narvesen: parsed 0 stores from {} bytes; upstream HTML may have changed",
            body.len()
        );
        return Err(ServiceError::ExtractionFailed(
            "parsed 0 stores from upstream response".to_string(),
        ));
    }

    log::info!("Narvesen: parsed {} stores from {} bytes", stores.len(), body.len());
    Ok(stores)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;

    #[test]
    fn test_parse_store_page_in_document_order() {
        let stores = parse_store_html(fixture_store_page_html());
        let names: Vec<&str> = stores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Narvesen Oslo S", "Narvesen Bergen Stasjon", "Narvesen Tromsø"]);
    }

    #[test]
    fn test_parse_store_fields() {
        let stores = parse_store_html(fixture_store_page_html());
        let oslo = &stores[0];
        assert!((oslo.lat - 59.9111).abs() < 1e-9);
        assert!((oslo.lng - 10.7503).abs() < 1e-9);
        assert_eq!(oslo.address, "Jernbanetorget 1");
        assert_eq!(oslo.city, "Oslo");
    }

    #[test]
    fn test_entities_decoded_and_whitespace_trimmed() {
        let stores = parse_store_html(fixture_store_page_html());
        let tromso = stores.iter().find(|s| s.city == "Tromsø").expect("Tromsø store");
        assert_eq!(tromso.name, "Narvesen Tromsø");
        assert_eq!(tromso.address, "Storgata 1 & 3");
    }

    #[test]
    fn test_missing_address_and_locality_are_empty() {
        let stores = parse_store_html(fixture_store_page_html());
        let bergen = &stores[1];
        assert_eq!(bergen.name, "Narvesen Bergen Stasjon");
        assert_eq!(bergen.address, "");
        assert_eq!(bergen.city, "");
    }

    #[test]
    fn test_bad_coordinate_block_dropped_without_shifting_neighbours() {
        let stores = parse_store_html(fixture_store_page_with_bad_coordinates_html());
        assert_eq!(stores.len(), 2, "the block with lat=\"n/a\" must be skipped");
        assert_eq!(stores[0].name, "Narvesen Før");
        assert_eq!(stores[0].city, "Lillehammer");
        assert_eq!(stores[1].name, "Narvesen Etter");
        assert_eq!(stores[1].city, "Hamar", "neighbour must keep its own locality");
    }

    #[test]
    fn test_non_finite_coordinate_block_dropped() {
        let html = r#"<ul>
            <li data-lat="NaN" data-lng="10.0" data-title="Broken"></li>
            <li data-lat="60.0" data-lng="inf" data-title="Also broken"></li>
        </ul>"#;
        assert!(parse_store_html(html).is_empty());
    }

    #[test]
    fn test_locality_not_borrowed_from_next_block() {
        let html = r#"<ul>
            <li data-lat="60.1" data-lng="10.1" data-title="A"><div class="street-address">Gate 1</div></li>
            <li data-lat="60.2" data-lng="10.2" data-title="B"><span class="locality">Drammen</span></li>
        </ul>"#;
        let stores = parse_store_html(html);
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].city, "", "A has no locality of its own");
        assert_eq!(stores[1].city, "Drammen");
        assert_eq!(stores[1].address, "");
    }

    #[test]
    fn test_page_without_store_blocks_yields_nothing() {
        assert!(parse_store_html(fixture_redesigned_store_page_html()).is_empty());
        assert!(parse_store_html("").is_empty());
    }

    #[test]
    fn test_duplicate_blocks_are_kept() {
        let block = r#"<li data-lat="60.0" data-lng="10.0" data-title="Twin"></li>"#;
        let html = format!("{}{}", block, block);
        assert_eq!(parse_store_html(&html).len(), 2, "no deduplication");
    }

    #[test]
    fn test_regex_extractor_delegates_to_parser() {
        let via_trait = RegexStoreExtractor.extract(fixture_store_page_html());
        assert_eq!(via_trait, parse_store_html(fixture_store_page_html()));
    }
}
