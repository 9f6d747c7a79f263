// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance between two coordinates.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for check-in distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
///
/// Callers are expected to have range-checked the values already
/// (latitude in [-90, 90], longitude in [-180, 180]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        // geo uses (x, y) = (longitude, latitude)
        geo::Point::new(c.longitude, c.latitude)
    }
}

/// Haversine distance between two coordinates, in kilometers.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = (to.latitude - from.latitude).to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Latitude/longitude box that contains every point within `radius_km` of `center`.
///
/// Used as a cheap pre-filter before the exact haversine check. The box is
/// widened to the full longitude range near the poles or when it would wrap
/// around the antimeridian.
pub fn bounding_box(center: Coordinate, radius_km: f64) -> geo::Rect<f64> {
    let lat_delta = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let min_lat = (center.latitude - lat_delta).max(-90.0);
    let max_lat = (center.latitude + lat_delta).min(90.0);

    let cos_lat = center.latitude.to_radians().cos();
    let (min_lon, max_lon) = if min_lat <= -90.0 || max_lat >= 90.0 || cos_lat <= f64::EPSILON {
        (-180.0, 180.0)
    } else {
        let lon_delta = lat_delta / cos_lat;
        let (lo, hi) = (center.longitude - lon_delta, center.longitude + lon_delta);
        if lo < -180.0 || hi > 180.0 {
            (-180.0, 180.0)
        } else {
            (lo, hi)
        }
    };

    geo::Rect::new(
        geo::coord! { x: min_lon, y: min_lat },
        geo::coord! { x: max_lon, y: max_lat },
    )
}
