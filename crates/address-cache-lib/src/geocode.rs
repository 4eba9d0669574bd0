//! Geocoding collaborator abstraction
//!
//! The resolver only needs "point in, address record out". Keeping that behind a
//! trait lets tests inject a scripted geocoder and lets deployments swap providers.

use crate::{Address, Coordinate, OsmAddress, Result, format_address};
use std::future::Future;

/// A reverse geocoding result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Place {
    /// Address details by category
    pub address: OsmAddress,
    /// Region in which the address is valid, in provider order `[south, north, west, east]`
    pub bounding_box: Option<Vec<f64>>,
    /// Provider's own single-line rendering, if any
    pub display_name: Option<String>,
}

impl Place {
    /// Formatted address, falling back to the provider's display name when no
    /// address category is present
    pub fn formatted_address(&self) -> Address {
        let formatted = format_address(&self.address);
        if !formatted.is_empty() {
            return formatted;
        }
        self.display_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

/// A service that resolves a coordinate to an address record
///
/// Implementations report every transport, HTTP or provider failure as
/// [`CacheError::GeocodeUnavailable`](crate::CacheError::GeocodeUnavailable).
pub trait Geocoder: Send + Sync {
    /// Reverse geocode a single point.
    fn reverse(&self, point: Coordinate) -> impl Future<Output = Result<Place>> + Send;
}

impl<G: Geocoder> Geocoder for &G {
    fn reverse(&self, point: Coordinate) -> impl Future<Output = Result<Place>> + Send {
        (**self).reverse(point)
    }
}

impl<G: Geocoder> Geocoder for std::sync::Arc<G> {
    fn reverse(&self, point: Coordinate) -> impl Future<Output = Result<Place>> + Send {
        (**self).reverse(point)
    }
}
