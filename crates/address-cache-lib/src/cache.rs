//! AddressCache - Thread-safe spatial cache facade
//!
//! This module composes the R-tree with the cache contract: point lookups return the
//! first stored region (by insertion order) that contains the point, and stores are
//! rejected when the region does not contain the point that produced it.

use crate::rtree::{DEFAULT_MAX_CHILDREN, RTree};
use crate::{Address, Bbox, CacheError, Coordinate, Result, utils};

use geo::{Coord, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Configuration for the address cache
///
/// Every policy is disabled by default, so a default cache stores exactly what it is
/// given and keeps it until [`AddressCache::clear`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Maximum entries or child nodes per R-tree node (values below 2 are raised to 2)
    pub max_children: usize,
    /// Round points and regions to this many decimal places before using them.
    /// 5 decimals is roughly one meter.
    pub precision: Option<u8>,
    /// Shrink regions whose width or height exceeds this many meters to at most this
    /// size per side, centered on the point that produced them where possible.
    pub max_side_meters: Option<f64>,
    /// Clear the whole cache before inserting once it holds this many entries
    pub max_entries: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_children: DEFAULT_MAX_CHILDREN,
            precision: None,
            max_side_meters: None,
            max_entries: None,
        }
    }
}

impl Config {
    fn sanitized(mut self) -> Self {
        if let Some(max_side) = self.max_side_meters {
            if !max_side.is_finite() || max_side <= 0.0 {
                tracing::warn!("Ignoring invalid max_side_meters {}", max_side);
                self.max_side_meters = None;
            }
        }
        if self.max_entries == Some(0) {
            tracing::warn!("Ignoring max_entries 0");
            self.max_entries = None;
        }
        self
    }
}

/// Information about the cache contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheInfo {
    /// Number of stored regions
    pub entries: usize,
    /// Height of the underlying R-tree
    pub height: usize,
}

/// What a successful store actually inserted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreReport {
    /// Region as inserted (after rounding and shrinking)
    pub bbox: Bbox,
    /// Width of the inserted region in meters
    pub width_meters: f64,
    /// Height of the inserted region in meters
    pub height_meters: f64,
    /// Whether the region was shrunk to respect `max_side_meters`
    pub shrunk: bool,
    /// Whether the cache was flushed to respect `max_entries`
    pub flushed: bool,
}

impl StoreReport {
    /// Area of the inserted region in square meters
    #[inline]
    pub fn area_square_meters(&self) -> f64 {
        self.width_meters * self.height_meters
    }
}

/// Spatial cache mapping validity regions to formatted addresses
///
/// Reads take a shared lock and may run concurrently; writes take the lock
/// exclusively. Share it between tasks as `Arc<AddressCache>`.
#[derive(Debug)]
pub struct AddressCache {
    /// Spatial index, guarded as a whole
    index: RwLock<RTree<Address>>,
    /// Configuration settings
    config: Config,
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl AddressCache {
    /// Create an empty cache with the given configuration
    ///
    /// A `max_side_meters` that is not a finite positive number and a `max_entries`
    /// of zero cannot be honored; those policies are disabled with a warning.
    pub fn new(config: Config) -> Self {
        let config = config.sanitized();
        Self {
            index: RwLock::new(RTree::new(config.max_children)),
            config,
        }
    }

    /// Look up the address cached for a point
    ///
    /// When several stored regions contain the point, the one inserted first wins:
    /// newer overlapping entries never override older ones.
    pub fn get(&self, point: Coordinate) -> Option<Address> {
        #[cfg(feature = "profiling")]
        profiling::scope!("cache::get");

        let point = self.normalize_point(point);
        self.read_index().first_containing(point).cloned()
    }

    /// All addresses whose region contains the point, oldest first
    pub fn get_all(&self, point: Coordinate) -> Vec<Address> {
        let point = self.normalize_point(point);
        self.read_index()
            .query_point(point)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Cache an address for a region
    ///
    /// `point` is the coordinate the address was fetched for. It must lie inside
    /// `bbox`, otherwise the store fails with [`CacheError::InconsistentRegion`] and
    /// the cache is left unchanged.
    pub fn set(&self, address: Address, bbox: Bbox, point: Coordinate) -> Result<()> {
        self.store(address, bbox, point).map(|_| ())
    }

    /// Same as [`AddressCache::set`], reporting what was inserted
    pub fn store(&self, address: Address, bbox: Bbox, point: Coordinate) -> Result<StoreReport> {
        #[cfg(feature = "profiling")]
        profiling::scope!("cache::store");

        let point = self.normalize_point(point);
        let bbox = match self.config.precision {
            Some(places) => utils::round_bbox(bbox, places),
            None => bbox,
        };

        if !bbox.contains(point) {
            return Err(CacheError::InconsistentRegion {
                lat: point.lat(),
                lon: point.lon(),
                bbox,
            });
        }

        let (bbox, shrunk) = match self.config.max_side_meters {
            Some(max_side) => {
                let (width, height) = utils::bbox_size_meters(&bbox);
                if width > max_side || height > max_side {
                    (shrink_around(bbox, point, max_side), true)
                } else {
                    (bbox, false)
                }
            }
            None => (bbox, false),
        };

        let mut index = self.write_index();
        let flushed = match self.config.max_entries {
            Some(max_entries) if index.len() >= max_entries => {
                tracing::info!(
                    "Address cache reached {} entries, clearing before insert",
                    index.len()
                );
                index.clear();
                true
            }
            _ => false,
        };
        index.insert(bbox, address);
        drop(index);

        let (width_meters, height_meters) = utils::bbox_size_meters(&bbox);
        Ok(StoreReport {
            bbox,
            width_meters,
            height_meters,
            shrunk,
            flushed,
        })
    }

    /// Remove every cached address
    pub fn clear(&self) {
        self.write_index().clear();
    }

    /// Get cache information
    pub fn info(&self) -> CacheInfo {
        let index = self.read_index();
        CacheInfo {
            entries: index.len(),
            height: index.height(),
        }
    }

    /// Number of cached regions
    #[inline]
    pub fn len(&self) -> usize {
        self.read_index().len()
    }

    /// Check if the cache is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_index().is_empty()
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn normalize_point(&self, point: Coordinate) -> Coordinate {
        match self.config.precision {
            Some(places) => utils::round_coordinate(point, places),
            None => point,
        }
    }

    // A panic while holding the lock cannot leave the tree half-modified in a way
    // that breaks reads, so poisoning is ignored.
    fn read_index(&self) -> RwLockReadGuard<'_, RTree<Address>> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, RTree<Address>> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shrink a region to at most `max_side` meters per side around `point`
///
/// Each edge moves to within `max_side / 2` of the point but never past its original
/// position, so the result stays inside the original region and contains the point.
fn shrink_around(bbox: Bbox, point: Coordinate, max_side: f64) -> Bbox {
    let half = max_side / 2.0;
    let origin = point.into();

    let north = utils::haversine_destination(origin, 0.0, half);
    let east = utils::haversine_destination(origin, 90.0, half);
    let delta_lat = (north.y() - point.lat()).abs();
    let delta_lon = (east.x() - point.lon()).abs();

    Bbox::from_rect(Rect::new(
        Coord {
            x: (point.lon() - delta_lon).max(bbox.min_lon()),
            y: (point.lat() - delta_lat).max(bbox.min_lat()),
        },
        Coord {
            x: (point.lon() + delta_lon).min(bbox.max_lon()),
            y: (point.lat() + delta_lat).min(bbox.max_lat()),
        },
    ))
}
