//! Nominatim reverse geocoding client
//!
//! Talks to a Nominatim-compatible `/reverse` endpoint over HTTP and maps every
//! failure (transport, status, payload) to [`CacheError::GeocodeUnavailable`].

use crate::{CacheError, Coordinate, Geocoder, OsmAddress, Place, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Public OpenStreetMap Nominatim reverse endpoint
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// Nominatim's usage policy requires an identifying User-Agent
const DEFAULT_USER_AGENT: &str = concat!("address-cache/", env!("CARGO_PKG_VERSION"));

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client settings
#[derive(Debug, Clone, PartialEq)]
pub struct NominatimOptions {
    /// Full URL of the reverse endpoint
    pub endpoint: String,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Whole-request timeout; a timed out request caches nothing
    pub timeout: Duration,
    /// Level of detail (3 = country ... 18 = building); provider default when `None`
    pub zoom: Option<u8>,
    /// Preferred language for address names (`Accept-Language` header)
    pub accept_language: Option<String>,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            zoom: None,
            accept_language: None,
        }
    }
}

/// Reverse geocoder backed by a Nominatim HTTP endpoint
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    options: NominatimOptions,
}

impl NominatimClient {
    /// Creates a new client with the given options.
    pub fn new(options: NominatimOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| {
                CacheError::GeocodeUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, options })
    }

    pub fn options(&self) -> &NominatimOptions {
        &self.options
    }

    /// Build the reverse request for a point; endpoint query parameters are kept
    fn request(&self, point: Coordinate) -> reqwest::RequestBuilder {
        let mut params = vec![
            ("lat", point.lat().to_string()),
            ("lon", point.lon().to_string()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        if let Some(zoom) = self.options.zoom {
            params.push(("zoom", zoom.to_string()));
        }

        let mut request = self.client.get(&self.options.endpoint).query(&params);
        if let Some(language) = &self.options.accept_language {
            request = request.header(reqwest::header::ACCEPT_LANGUAGE, language.as_str());
        }
        request
    }
}

impl Geocoder for NominatimClient {
    async fn reverse(&self, point: Coordinate) -> Result<Place> {
        let endpoint = &self.options.endpoint;
        tracing::trace!("Reverse geocoding {} via {}", point, endpoint);

        let response = self.request(point).send().await.map_err(|e| {
            CacheError::GeocodeUnavailable(format!("Request to {} failed: {}", endpoint, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::GeocodeUnavailable(format!(
                "HTTP {} from {}",
                status, endpoint
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            CacheError::GeocodeUnavailable(format!("Failed to read response body: {}", e))
        })?;

        parse_reverse_response(&body)
    }
}

/// Reverse endpoint payload (`format=jsonv2`), reduced to what the cache needs
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<OsmAddress>,
    #[serde(default, deserialize_with = "deserialize_bounding_box")]
    boundingbox: Option<Vec<f64>>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Bounding box component as sent on the wire (Nominatim uses strings)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Number(f64),
    Text(String),
}

/// Parse bounding box components; unparseable text becomes NaN so the box is
/// rejected later without failing the whole response.
fn deserialize_bounding_box<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<WireNumber>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .into_iter()
            .map(|value| match value {
                WireNumber::Number(n) => n,
                WireNumber::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            })
            .collect()
    }))
}

/// Decode a reverse endpoint response body
fn parse_reverse_response(body: &[u8]) -> Result<Place> {
    let response: ReverseResponse = serde_json::from_slice(body).map_err(|e| {
        CacheError::GeocodeUnavailable(format!("Malformed geocoding response: {}", e))
    })?;

    if let Some(error) = response.error {
        return Err(CacheError::GeocodeUnavailable(error));
    }

    let address = response.address.ok_or_else(|| {
        CacheError::GeocodeUnavailable("Geocoding response has no address".to_string())
    })?;

    Ok(Place {
        address,
        bounding_box: response.boundingbox,
        display_name: response.display_name,
    })
}
