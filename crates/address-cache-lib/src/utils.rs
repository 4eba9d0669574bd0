//! Utility functions for geodesic measurements and coordinate rounding

use crate::{Bbox, Coordinate};
use geo::{Coord, Point, Rect};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 points in meters
///
/// Points are `geo::Point`s with x = longitude and y = latitude.
#[inline]
pub fn haversine_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Point reached by travelling `distance` meters from `origin` along `bearing`
///
/// Bearing is in degrees, North is 0° and East is 90°.
#[inline]
pub fn haversine_destination(origin: Point<f64>, bearing: f64, distance: f64) -> Point<f64> {
    let lat1 = origin.y().to_radians();
    let lon1 = origin.x().to_radians();
    let bearing = bearing.to_radians();
    let angular = distance / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Point::new(lon2.to_degrees(), lat2.to_degrees())
}

/// Round a value to a fixed number of decimal places
///
/// Rounding is monotone, so a point inside a box stays inside the rounded box.
#[inline(always)]
pub fn round_to(value: f64, decimal_places: u8) -> f64 {
    let power_of_10 = 10.0f64.powi(decimal_places.into());
    (value * power_of_10).round() / power_of_10
}

/// Round both components of a coordinate
///
/// Rounding an in-range value cannot leave the range, so the result is still valid.
pub fn round_coordinate(coordinate: Coordinate, decimal_places: u8) -> Coordinate {
    Coordinate::new(
        round_to(coordinate.lat(), decimal_places),
        round_to(coordinate.lon(), decimal_places),
    )
    .unwrap_or(coordinate)
}

/// Round every edge of a bounding box
pub fn round_bbox(bbox: Bbox, decimal_places: u8) -> Bbox {
    Bbox::from_rect(Rect::new(
        Coord {
            x: round_to(bbox.min_lon(), decimal_places),
            y: round_to(bbox.min_lat(), decimal_places),
        },
        Coord {
            x: round_to(bbox.max_lon(), decimal_places),
            y: round_to(bbox.max_lat(), decimal_places),
        },
    ))
}

/// Width (west-east along the southern edge) and height (south-north) of a box in meters
#[inline]
pub fn bbox_size_meters(bbox: &Bbox) -> (f64, f64) {
    let width = haversine_distance(bbox.south_west(), bbox.south_east());
    let height = haversine_distance(bbox.south_west(), bbox.north_west());
    (width, height)
}
