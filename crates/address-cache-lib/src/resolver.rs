//! Resolver - Cached reverse geocoding
//!
//! Each request first asks the cache; only a miss reaches the geocoder. A fetched
//! address is stored under the region the provider reports for it, when there is one.
//! Caching is best-effort: a region that cannot be stored never turns a successful
//! fetch into an error.

use crate::{Address, AddressCache, Bbox, Coordinate, Geocoder, Place, Result};
use std::sync::Arc;

/// How a resolved address was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache without contacting the geocoder
    Hit,
    /// Fetched from the geocoder and cached under its region
    Stored,
    /// Fetched from the geocoder but not cached (no usable region)
    NotStored,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Hit => "hit",
            Outcome::Stored => "stored",
            Outcome::NotStored => "not-stored",
        }
    }
}

/// A resolved address and how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub address: Address,
    pub outcome: Outcome,
}

/// Reverse geocoder in front of an [`AddressCache`]
#[derive(Debug)]
pub struct Resolver<G> {
    cache: Arc<AddressCache>,
    geocoder: G,
}

impl<G: Geocoder> Resolver<G> {
    /// Create a resolver over a shared cache
    pub fn new(cache: Arc<AddressCache>, geocoder: G) -> Self {
        Self { cache, geocoder }
    }

    /// Resolve a point to its formatted address
    pub async fn resolve(&self, point: Coordinate) -> Result<Address> {
        self.lookup(point).await.map(|resolution| resolution.address)
    }

    /// Resolve a point, reporting whether the cache was used
    ///
    /// Fails only with [`CacheError::GeocodeUnavailable`](crate::CacheError::GeocodeUnavailable)
    /// on a miss whose fetch failed; nothing is cached in that case. Dropping the
    /// returned future before it completes leaves the cache untouched.
    pub async fn lookup(&self, point: Coordinate) -> Result<Resolution> {
        if let Some(address) = self.cache.get(point) {
            tracing::debug!("Cache hit for {}", point);
            return Ok(Resolution {
                address,
                outcome: Outcome::Hit,
            });
        }

        tracing::debug!("Cache miss for {}, fetching", point);
        let place = self.geocoder.reverse(point).await.inspect_err(|e| {
            tracing::warn!("Reverse geocoding failed for {}: {}", point, e);
        })?;

        let address = place.formatted_address();
        let outcome = self.try_store(&address, &place, point);

        Ok(Resolution { address, outcome })
    }

    /// The cache this resolver reads and fills
    #[inline]
    pub fn cache(&self) -> &Arc<AddressCache> {
        &self.cache
    }

    /// The underlying geocoder
    #[inline]
    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    fn try_store(&self, address: &Address, place: &Place, point: Coordinate) -> Outcome {
        let Some(values) = place.bounding_box.as_deref() else {
            tracing::debug!("No bounding box for {}, not caching", point);
            return Outcome::NotStored;
        };

        let stored = Bbox::from_provider_bbox(values)
            .and_then(|bbox| self.cache.store(address.clone(), bbox, point));

        match stored {
            Ok(report) => {
                if report.shrunk {
                    tracing::debug!(
                        "Region for {} shrunk to {} ({:.0} m x {:.0} m)",
                        point,
                        report.bbox,
                        report.width_meters,
                        report.height_meters
                    );
                }
                Outcome::Stored
            }
            Err(e) => {
                tracing::warn!("Not caching address for {}: {}", point, e);
                Outcome::NotStored
            }
        }
    }
}
