// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Radius of Earth used for graph edge lengths, in meters.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Diameter of Earth matching [EARTH_RADIUS], in meters.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions (in degrees)
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in meters.
///
/// The result is symmetric, never negative, and zero only for identical positions.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    // Clamp guards against h drifting above 1 for antipodal points
    EARTH_DIAMETER * h.sqrt().min(1.0).asin()
}

/// Distance between two positions truncated to whole meters,
/// as used for [RoutingEdge](crate::RoutingEdge) lengths.
pub fn whole_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> i32 {
    earth_distance(lat1, lon1, lat2, lon2) as i32
}
