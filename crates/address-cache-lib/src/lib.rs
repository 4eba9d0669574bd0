//! Address Cache Library - Spatial Caching for Reverse Geocoding
//!
//! This library answers "which address is at this coordinate?" without calling a
//! rate-limited geocoding service twice for the same area. Every fetched address comes
//! with a bounding box in which it stays valid; those boxes are stored in an R-tree so a
//! later point lookup can be served from memory in sub-linear time.
//!
//! # Architecture
//!
//! - **[`Coordinate`] / [`Bbox`]**: Validated geometry primitives (inclusive containment)
//! - **[`RTree`]**: Balanced spatial index with quadratic node splits
//! - **[`AddressCache`]**: Thread-safe get/set/clear facade with optional policies
//! - **[`Resolver`]**: Lookup-before-fetch, insert-after-fetch orchestration over a [`Geocoder`]
//! - **[`OsmAddress`] / [`format_address`]**: Fixed-shape provider record and its formatter
//! - **`NominatimClient`**: HTTP [`Geocoder`] (feature `nominatim`)
//!
//! # Performance Characteristics
//!
//! - **Insert**: O(M log_M N) with M = branching factor
//! - **Point query**: O(log_M N + K) for non-overlapping regions, K = matches
//! - **Clear**: O(1) amortized (the old tree is dropped)

mod address;
mod cache;
mod geocode;
mod geometry;
#[cfg(feature = "nominatim")]
mod nominatim;
mod resolver;
mod rtree;
pub mod utils;

// Public API exports
pub use address::{OsmAddress, format_address};
pub use cache::{AddressCache, CacheInfo, Config, StoreReport};
pub use geocode::{Geocoder, Place};
pub use geometry::{Bbox, Coordinate};
#[cfg(feature = "nominatim")]
pub use nominatim::{DEFAULT_ENDPOINT, NominatimClient, NominatimOptions};
pub use resolver::{Outcome, Resolution, Resolver};
pub use rtree::RTree;

/// Formatted, human-readable address. The cache never parses it.
pub type Address = String;

/// Error types for the cache and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Point ({lat}, {lon}) is outside the region {bbox} being cached for it")]
    InconsistentRegion { lat: f64, lon: f64, bbox: Bbox },

    #[error("Geocoding service unavailable: {0}")]
    GeocodeUnavailable(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> AddressCache = AddressCache::new;
        let _: fn() -> Config = Config::default;
        let _: fn(&OsmAddress) -> String = format_address;
    }

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidCoordinate {
            lat: 91.0,
            lon: 0.0,
        };
        assert_eq!(err.to_string(), "Invalid coordinate: lat=91, lon=0");

        let err = CacheError::GeocodeUnavailable("HTTP 503".to_string());
        assert!(err.to_string().contains("HTTP 503"));
    }
}
