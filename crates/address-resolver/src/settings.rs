use address_cache_lib::{Config, DEFAULT_ENDPOINT, NominatimOptions};
use clap::Parser;
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Address Resolver - Reverse geocode coordinates, serving nearby repeats from a spatial cache
pub struct Settings {
    /// Points to resolve as `lat,lon` (reads one per line from stdin when empty)
    #[clap(value_name = "POINT", allow_hyphen_values = true)]
    pub points: Vec<String>,

    /// Nominatim-compatible reverse geocoding endpoint
    #[clap(long, env = "ADDRESS_RESOLVER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// User-Agent sent to the geocoding service
    #[clap(long, env = "ADDRESS_RESOLVER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    #[clap(long, env = "ADDRESS_RESOLVER_TIMEOUT_SECS", default_value = "10")]
    pub timeout_secs: u64,

    /// Level of detail requested from the geocoder (3 = country ... 18 = building)
    #[clap(long, env = "ADDRESS_RESOLVER_ZOOM", value_parser = clap::value_parser!(u8).range(0..=18))]
    pub zoom: Option<u8>,

    /// Maximum children per R-tree node
    #[clap(long, env = "ADDRESS_RESOLVER_MAX_CHILDREN", default_value = "8")]
    pub max_children: usize,

    /// Round cached regions and lookups to this many decimal places
    #[clap(long, env = "ADDRESS_RESOLVER_PRECISION")]
    pub precision: Option<u8>,

    /// Shrink cached regions to at most this many meters per side around the point
    #[clap(long, env = "ADDRESS_RESOLVER_MAX_SIDE_METERS", value_parser = parse_meters)]
    pub max_side_meters: Option<f64>,

    /// Clear the cache once it holds this many entries
    #[clap(long, env = "ADDRESS_RESOLVER_MAX_ENTRIES")]
    pub max_entries: Option<NonZeroUsize>,
}

impl Settings {
    /// Parse from the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn cache_config(&self) -> Config {
        Config {
            max_children: self.max_children,
            precision: self.precision,
            max_side_meters: self.max_side_meters,
            max_entries: self.max_entries.map(NonZeroUsize::get),
        }
    }

    pub fn nominatim_options(&self) -> NominatimOptions {
        let defaults = NominatimOptions::default();
        NominatimOptions {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout: Duration::from_secs(self.timeout_secs),
            zoom: self.zoom,
            ..defaults
        }
    }
}

/// Parse a finite, strictly positive distance in meters
fn parse_meters(text: &str) -> Result<f64, String> {
    let meters: f64 = text
        .parse()
        .map_err(|_| format!("{text:?} is not a number"))?;
    if meters.is_finite() && meters > 0.0 {
        Ok(meters)
    } else {
        Err(format!("{text} is not a positive distance"))
    }
}
