/// NGU (Geological Survey of Norway) WMS GetFeatureInfo client.
///
/// Queries the bedrock or superficial-deposit map at a point and reduces
/// the GML (`msGMLOutput`) answer to the fields of its first feature.
///
/// The GML structure depends on the layer and is not documented, so the
/// extractor only relies on one convention: the element wrapping a feature
/// has a local name ending in `_feature`, and each child element is one
/// field. The response is tokenized in a single forward pass and abandoned
/// as soon as the first feature closes.

use crate::config::GeologyConfig;
use crate::geometry::wms_bbox;
use crate::ingest::fetch::UpstreamClient;
use crate::model::{Coordinate, ExtractError, FeatureFields, ServiceError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader};

const FEATURE_SUFFIX: &str = "_feature";

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// The two map layers the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeologyLayer {
    Bedrock,
    Sediment,
}

impl GeologyLayer {
    /// Parses the `layer` query parameter. Empty means bedrock.
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value {
            "" | "bedrock" => Ok(GeologyLayer::Bedrock),
            "sediment" => Ok(GeologyLayer::Sediment),
            _ => Err(ServiceError::InvalidInput(
                "layer must be 'bedrock' or 'sediment'".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeologyLayer::Bedrock => "bedrock",
            GeologyLayer::Sediment => "sediment",
        }
    }

    /// WMS layer name passed as `LAYERS` and `QUERY_LAYERS`.
    pub fn wms_layer(&self) -> &'static str {
        match self {
            GeologyLayer::Bedrock => "Berggrunn_sammenstilt_hovedbergarter",
            GeologyLayer::Sediment => "Losmasser_temakart_nasjonal",
        }
    }

    pub fn base_url<'a>(&self, config: &'a GeologyConfig) -> &'a str {
        match self {
            GeologyLayer::Bedrock => &config.bedrock_url,
            GeologyLayer::Sediment => &config.sediment_url,
        }
    }
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds a WMS 1.1.1 GetFeatureInfo URL asking for GML at the centre pixel
/// of a 101×101 image spanning `geometry::wms_bbox(point)`.
pub fn build_feature_info_url(base_url: &str, layer: GeologyLayer, point: Coordinate) -> String {
    let layers = layer.wms_layer();
    format!(
        "{}?SERVICE=WMS&VERSION=1.1.1&REQUEST=GetFeatureInfo\
         &INFO_FORMAT=application/vnd.ogc.gml&SRS=EPSG:4326\
         &WIDTH=101&HEIGHT=101&X=50&Y=50\
         &LAYERS={}&QUERY_LAYERS={}&BBOX={}",
        base_url,
        layers,
        layers,
        wms_bbox(point)
    )
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// The only three things the feature extractor cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Opening tag, by local name (namespace prefix dropped).
    Start(String),
    Text(String),
    End(String),
}

/// Lazy, finite token stream over an XML document.
///
/// Self-closing elements come out as `Start` followed by `End`. The first
/// error ends the stream.
pub struct Tokens<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending_end: Option<String>,
    done: bool,
}

impl<R: BufRead> Tokens<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            pending_end: None,
            done: false,
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

impl<R: BufRead> Iterator for Tokens<R> {
    type Item = Result<Token, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(name) = self.pending_end.take() {
            return Some(Ok(Token::End(name)));
        }
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ExtractError::Xml(e)));
                }
            };

            let token = match event {
                Event::Start(e) => Token::Start(local_name(e.local_name().as_ref())),
                Event::End(e) => Token::End(local_name(e.local_name().as_ref())),
                Event::Empty(e) => {
                    let name = local_name(e.local_name().as_ref());
                    self.pending_end = Some(name.clone());
                    Token::Start(name)
                }
                Event::Text(e) => match e.unescape() {
                    Ok(text) => Token::Text(text.into_owned()),
                    Err(err) => {
                        self.done = true;
                        return Some(Err(ExtractError::Xml(err)));
                    }
                },
                Event::CData(e) => Token::Text(String::from_utf8_lossy(&e.into_inner()).into_owned()),
                Event::Eof => {
                    self.done = true;
                    return None;
                }
                // Declarations, comments, processing instructions, doctype.
                _ => continue,
            };
            return Some(Ok(token));
        }
    }
}

// ---------------------------------------------------------------------------
// Feature extraction
// ---------------------------------------------------------------------------

/// Where the extractor is relative to the first feature.
#[derive(Debug, Clone, PartialEq)]
enum FeatureState {
    Outside,
    /// Inside a `*_feature` element; `field` is the open child, if any.
    InFeature { field: Option<String> },
}

fn is_feature(name: &str) -> bool {
    name.ends_with(FEATURE_SUFFIX)
}

/// Returns the fields of the first `*_feature` element in `source`.
///
/// Child text is trimmed and empty text ignored; a field that appears twice
/// keeps its last value. Extraction stops at the first feature's closing
/// tag without reading further.
///
/// A document with no complete feature yields an empty map, which is
/// indistinguishable from a feature that has no fields.
///
/// # Errors
/// `ExtractError::Xml` if the document is not well-formed up to the point
/// where extraction stops.
pub fn extract_first_feature<R: BufRead>(source: R) -> Result<FeatureFields, ExtractError> {
    let mut fields = FeatureFields::new();
    let mut state = FeatureState::Outside;

    for token in Tokens::new(source) {
        state = match (state, token?) {
            (FeatureState::Outside, Token::Start(name)) if is_feature(&name) => {
                FeatureState::InFeature { field: None }
            }
            (FeatureState::Outside, _) => FeatureState::Outside,

            (FeatureState::InFeature { .. }, Token::End(name)) if is_feature(&name) => {
                return Ok(fields);
            }
            (FeatureState::InFeature { .. }, Token::End(_)) => {
                FeatureState::InFeature { field: None }
            }
            // A nested feature element is not a field.
            (in_feature @ FeatureState::InFeature { .. }, Token::Start(name)) if is_feature(&name) => {
                in_feature
            }
            (FeatureState::InFeature { .. }, Token::Start(name)) => {
                FeatureState::InFeature { field: Some(name) }
            }
            (FeatureState::InFeature { field: Some(field) }, Token::Text(text)) => {
                let text = text.trim();
                if !text.is_empty() {
                    fields.insert(field.clone(), text.to_string());
                }
                FeatureState::InFeature { field: Some(field) }
            }
            (in_feature @ FeatureState::InFeature { field: None }, Token::Text(_)) => in_feature,
        };
    }

    // Stream ended before any feature closed.
    Ok(FeatureFields::new())
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Queries `layer` at `point` and extracts the first feature's fields.
///
/// The response body is streamed straight into the tokenizer; nothing past
/// the first feature is read.
///
/// # Errors
/// - `ServiceError::UpstreamUnavailable`: transport failure or non-2xx.
/// - `ServiceError::UpstreamParse`: the body is not well-formed XML.
pub fn fetch_feature(
    client: &UpstreamClient,
    config: &GeologyConfig,
    layer: GeologyLayer,
    point: Coordinate,
) -> Result<FeatureFields, ServiceError> {
    let url = build_feature_info_url(layer.base_url(config), layer, point);
    log::debug!("NGU GetFeatureInfo: {}", url);

    let response = client.open(&url, &[]).map_err(|e| {
        log::warn!(
            "NGU upstream error for layer={} lat={} lon={}: {}",
            layer.as_str(),
            point.lat,
            point.lon,
            e
        );
        e
    })?;

    let fields = extract_first_feature(BufReader::new(response)).map_err(|e| {
        log::error!("NGU GML parse error for layer={}: {}", layer.as_str(), e);
        e
    })?;

    Ok(fields)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
