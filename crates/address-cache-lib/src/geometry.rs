//! Geometry primitives: validated coordinates and axis-aligned bounding boxes
//!
//! Both types are immutable values. All validation happens at construction so the
//! rest of the crate can rely on `min <= max` and on every component being finite.
//! Internally a [`Bbox`] is a `geo::Rect` with `x = longitude` and `y = latitude`.

use crate::{CacheError, Result};
use geo::{Coord, Point, Rect};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Valid latitude range in degrees
const LAT_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees
const LON_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A WGS84 point in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCoordinate"))]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Coordinate {
    /// Create a coordinate, rejecting out-of-range and `NaN` components
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !LAT_RANGE.contains(&lat) || !LON_RANGE.contains(&lon) {
            return Err(CacheError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in degrees
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees
    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord { x: c.lon, y: c.lat }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lon, c.lat)
    }
}

/// Axis-aligned region in latitude/longitude space
///
/// Zero-area boxes (a single point, or a line) are legal and contain the points on
/// their extent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawBbox", into = "RawBbox"))]
pub struct Bbox {
    rect: Rect<f64>,
}

/// Unvalidated wire form of [`Coordinate`]
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CacheError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.lat, raw.lon)
    }
}

/// Wire form of [`Bbox`] in canonical order
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawBbox {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBbox> for Bbox {
    type Error = CacheError;

    fn try_from(raw: RawBbox) -> Result<Self> {
        Bbox::new(raw.min_lat, raw.min_lon, raw.max_lat, raw.max_lon)
    }
}

#[cfg(feature = "serde")]
impl From<Bbox> for RawBbox {
    fn from(bbox: Bbox) -> Self {
        Self {
            min_lat: bbox.min_lat(),
            min_lon: bbox.min_lon(),
            max_lat: bbox.max_lat(),
            max_lon: bbox.max_lon(),
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Bbox {
    /// Create a bounding box from canonical `(min_lat, min_lon, max_lat, max_lon)`
    ///
    /// Fails if a component is not finite, falls outside the coordinate ranges, or if
    /// a minimum exceeds its maximum. Inputs are never clamped or swapped.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        let values = [min_lat, min_lon, max_lat, max_lon];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CacheError::InvalidBbox(format!(
                "non-finite component in {values:?}"
            )));
        }
        if !LAT_RANGE.contains(&min_lat)
            || !LAT_RANGE.contains(&max_lat)
            || !LON_RANGE.contains(&min_lon)
            || !LON_RANGE.contains(&max_lon)
        {
            return Err(CacheError::InvalidBbox(format!(
                "component out of range in {values:?}"
            )));
        }
        if min_lat > max_lat {
            return Err(CacheError::InvalidBbox(format!(
                "min_lat {min_lat} > max_lat {max_lat}"
            )));
        }
        if min_lon > max_lon {
            return Err(CacheError::InvalidBbox(format!(
                "min_lon {min_lon} > max_lon {max_lon}"
            )));
        }

        Ok(Self::from_rect(Rect::new(
            Coord {
                x: min_lon,
                y: min_lat,
            },
            Coord {
                x: max_lon,
                y: max_lat,
            },
        )))
    }

    /// Create a bounding box from a provider vector ordered `[south, north, west, east]`
    ///
    /// This is the only place where provider ordering is translated into the canonical
    /// `(min_lat, min_lon, max_lat, max_lon)` order.
    pub fn from_provider_bbox(values: &[f64]) -> Result<Self> {
        let [south, north, west, east] = values else {
            return Err(CacheError::InvalidBbox(format!(
                "expected 4 values [south, north, west, east], got {}",
                values.len()
            )));
        };
        Self::new(*south, *west, *north, *east)
    }

    /// Create a zero-area box at a single point
    pub fn from_point(point: Coordinate) -> Self {
        Self::from_rect(Rect::new(Coord::from(point), Coord::from(point)))
    }

    /// Wrap an already-normalized rectangle
    #[inline]
    pub(crate) fn from_rect(rect: Rect<f64>) -> Self {
        Self { rect }
    }

    #[inline]
    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    #[inline]
    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    #[inline]
    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    #[inline]
    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    /// The underlying rectangle (x = longitude, y = latitude)
    #[inline]
    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }

    /// Check whether a point lies inside the box, edges included
    #[inline]
    pub fn contains(&self, point: Coordinate) -> bool {
        let min = self.rect.min();
        let max = self.rect.max();
        point.lat >= min.y && point.lat <= max.y && point.lon >= min.x && point.lon <= max.x
    }

    /// Check whether two boxes overlap (touching edges count as overlap)
    #[inline]
    pub fn intersects(&self, other: &Bbox) -> bool {
        let min = self.rect.min();
        let max = self.rect.max();
        let omin = other.rect.min();
        let omax = other.rect.max();

        !(max.x < omin.x || min.x > omax.x || max.y < omin.y || min.y > omax.y)
    }

    /// Area in square degrees (only meaningful for comparing boxes)
    #[inline]
    pub fn area(&self) -> f64 {
        self.rect.width() * self.rect.height()
    }

    /// Smallest box enclosing both boxes
    #[inline]
    pub fn union(&self, other: &Bbox) -> Bbox {
        let min = self.rect.min();
        let max = self.rect.max();
        let omin = other.rect.min();
        let omax = other.rect.max();

        Self::from_rect(Rect::new(
            Coord {
                x: min.x.min(omin.x),
                y: min.y.min(omin.y),
            },
            Coord {
                x: max.x.max(omax.x),
                y: max.y.max(omax.y),
            },
        ))
    }

    /// Area growth needed for this box to also enclose `other`
    #[inline]
    pub fn enlargement(&self, other: &Bbox) -> f64 {
        self.union(other).area() - self.area()
    }

    /// South-west corner
    #[inline]
    pub fn south_west(&self) -> Point<f64> {
        self.rect.min().into()
    }

    /// South-east corner
    #[inline]
    pub fn south_east(&self) -> Point<f64> {
        Point::new(self.max_lon(), self.min_lat())
    }

    /// North-west corner
    #[inline]
    pub fn north_west(&self) -> Point<f64> {
        Point::new(self.min_lon(), self.max_lat())
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_lat(),
            self.min_lon(),
            self.max_lat(),
            self.max_lon()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());

        assert!(matches!(
            Coordinate::new(90.0001, 0.0),
            Err(CacheError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
        assert!(Coordinate::new(f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_to_geo() {
        let c = coord(51.5074, -0.1278);
        let p: Point<f64> = c.into();
        assert_eq!(p.x(), -0.1278);
        assert_eq!(p.y(), 51.5074);
    }

    #[test]
    fn test_bbox_validation() {
        assert!(Bbox::new(0.0, 0.0, 1.0, 1.0).is_ok());
        assert!(Bbox::new(1.0, 1.0, 1.0, 1.0).is_ok());

        assert!(matches!(
            Bbox::new(1.0, 0.0, 0.0, 1.0),
            Err(CacheError::InvalidBbox(_))
        ));
        assert!(Bbox::new(0.0, 1.0, 1.0, 0.0).is_err());
        assert!(Bbox::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(Bbox::new(0.0, 0.0, 1.0, f64::INFINITY).is_err());
        assert!(Bbox::new(-91.0, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_from_provider_bbox_sao_paulo() {
        // Provider order: [south, north, west, east]
        let bbox = Bbox::from_provider_bbox(&[-23.56, -23.54, -46.64, -46.62]).unwrap();

        assert_eq!(bbox.min_lat(), -23.56);
        assert_eq!(bbox.min_lon(), -46.64);
        assert_eq!(bbox.max_lat(), -23.54);
        assert_eq!(bbox.max_lon(), -46.62);
        assert!(bbox.contains(coord(-23.5505, -46.6333)));
    }

    #[test]
    fn test_from_provider_bbox_rejects_bad_input() {
        assert!(Bbox::from_provider_bbox(&[]).is_err());
        assert!(Bbox::from_provider_bbox(&[1.0, 2.0, 3.0]).is_err());
        assert!(Bbox::from_provider_bbox(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_err());
        assert!(Bbox::from_provider_bbox(&[f64::NAN, 2.0, 3.0, 4.0]).is_err());
        // North below south
        assert!(Bbox::from_provider_bbox(&[2.0, 1.0, 3.0, 4.0]).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = Bbox::new(-10.0, -20.0, 10.0, 20.0).unwrap();

        assert!(bbox.contains(coord(0.0, 0.0)));
        assert!(bbox.contains(coord(10.0, 0.0)));
        assert!(bbox.contains(coord(-10.0, -20.0)));
        assert!(bbox.contains(coord(10.0, 20.0)));
        assert!(!bbox.contains(coord(10.000001, 0.0)));
        assert!(!bbox.contains(coord(0.0, -20.000001)));
    }

    #[test]
    fn test_degenerate_box_contains_its_point() {
        let p = coord(45.0, 7.0);
        let bbox = Bbox::from_point(p);

        assert_eq!(bbox.area(), 0.0);
        assert!(bbox.contains(p));
        assert!(!bbox.contains(coord(46.0, 7.0)));
    }

    #[test]
    fn test_intersects() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = Bbox::new(5.0, 5.0, 15.0, 15.0).unwrap();
        let c = Bbox::new(20.0, 20.0, 30.0, 30.0).unwrap();
        let touching = Bbox::new(10.0, 0.0, 12.0, 10.0).unwrap();

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&touching));
    }

    #[test]
    fn test_union_and_enlargement() {
        let a = Bbox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = Bbox::new(2.0, 2.0, 3.0, 3.0).unwrap();

        let u = a.union(&b);
        assert_eq!(u, Bbox::new(0.0, 0.0, 3.0, 3.0).unwrap());
        assert_eq!(a.enlargement(&b), 8.0);
        assert_eq!(u.enlargement(&a), 0.0);
    }

    #[test]
    fn test_display() {
        let bbox = Bbox::new(-23.56, -46.64, -23.54, -46.62).unwrap();
        assert_eq!(bbox.to_string(), "[-23.56, -46.64, -23.54, -46.62]");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let point: Coordinate = serde_json::from_str(r#"{"lat":-23.5505,"lon":-46.6333}"#).unwrap();
        assert_eq!(point, coord(-23.5505, -46.6333));
        assert!(serde_json::from_str::<Coordinate>(r#"{"lat":500.0,"lon":-999.0}"#).is_err());

        let bbox = Bbox::new(-23.56, -46.64, -23.54, -46.62).unwrap();
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(
            json,
            r#"{"min_lat":-23.56,"min_lon":-46.64,"max_lat":-23.54,"max_lon":-46.62}"#
        );
        assert_eq!(serde_json::from_str::<Bbox>(&json).unwrap(), bbox);

        // Inverted latitude range
        let inverted = r#"{"min_lat":1.0,"min_lon":0.0,"max_lat":0.0,"max_lon":1.0}"#;
        assert!(serde_json::from_str::<Bbox>(inverted).is_err());
    }
}
