// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::TransportMode;

/// Placeholder for unassigned [HIGHWAY_TYPES] slots.
const UNUSED: &str = "";

/// Known values of the [highway](https://wiki.openstreetmap.org/wiki/Key:highway) tag.
/// The position in this array is the numeric highway type stored in the graph.
///
/// Slots 0 to 29 are roads intended for cars, 30 are steps, and 31 to 49 are ways
/// not primarily intended for cars.
#[rustfmt::skip]
pub const HIGHWAY_TYPES: [&str; 50] = [
    "motorway", "motorway_link", "motorway_junction", "trunk", "trunk_link",
    "primary", "primary_link", "primary_trunk", "secondary", "secondary_link",
    "tertiary", "tertiary_link", "unclassified", "unsurfaced", "track",
    "residential", "living_street", "service", "road", "raceway",
    UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
    UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
    "steps", "bridleway", "cycleway", "footway", "pedestrian",
    "bus_guideway", "path", UNUSED, UNUSED, UNUSED,
    UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
    UNUSED, UNUSED, UNUSED, UNUSED, UNUSED,
];

/// Default speeds (in km/h) for every entry of [HIGHWAY_TYPES].
#[rustfmt::skip]
const HIGHWAY_SPEEDS: [i32; 50] = [
    130, 80, 80, 100, 80,
    100, 70, 70, 70, 60,
    50, 30, 50, 25, 50,
    30, 10, 10, 0, 0,
    1, 1, 1, 1, 1,
    1, 1, 1, 1, 1,
    0, 0, 5, 0, 0,
    5, 0, 1, 1, 1,
    1, 1, 1, 1, 1,
    1, 1, 1, 1, 1,
];

/// Speed assumed for unknown highway types.
const DEFAULT_SPEED: i32 = 10;

/// Values of the `motorcar` tag granting full access.
const ALLOWED: &[&str] = &["yes", "designated", "official"];

/// Values of the `motorcar` tag granting conditional access.
const RESTRICTED: &[&str] = &[
    "private",
    "permissive",
    "unknown",
    "restricted",
    "destination",
    "customer",
    "delivery",
    "agricultural",
    "forestry",
];

/// Cars may not use the way.
pub const CAR_NOT_ALLOWED: u8 = 0;

/// Cars may use the way only under some conditions (e.g. `motorcar=destination`).
pub const CAR_RESTRICTED: u8 = 1;

/// Cars may use the way.
pub const CAR_ALLOWED: u8 = 2;

/// Returns the numeric highway type (position in [HIGHWAY_TYPES]) or -1 if unknown.
pub fn highway_type(highway: &str) -> i32 {
    if highway.is_empty() {
        return -1;
    }

    HIGHWAY_TYPES
        .iter()
        .position(|&t| t == highway)
        .map(|i| i as i32)
        .unwrap_or(-1)
}

/// Returns the default max speed (in km/h) of a numeric highway type.
pub fn max_speed(highway_type: i32) -> i32 {
    usize::try_from(highway_type)
        .ok()
        .and_then(|i| HIGHWAY_SPEEDS.get(i))
        .cloned()
        .unwrap_or(DEFAULT_SPEED)
}

/// Checks whether cars may use a way with a given numeric highway type and
/// `motorcar` tag value (empty if missing).
///
/// Unknown combinations are logged and treated as [CAR_NOT_ALLOWED].
pub fn car_permission(highway_type: i32, motorcar: &str, way_id: i64) -> u8 {
    let highway = usize::try_from(highway_type)
        .ok()
        .and_then(|i| HIGHWAY_TYPES.get(i))
        .cloned()
        .unwrap_or("");

    match highway_type {
        // Roads intended for cars
        0..=29 => {
            if motorcar.is_empty() || ALLOWED.contains(&motorcar) {
                CAR_ALLOWED
            } else if RESTRICTED.contains(&motorcar) {
                CAR_RESTRICTED
            } else if motorcar == "no" {
                CAR_NOT_ALLOWED
            } else {
                log::warn!("way {way_id}: illegal combination highway={highway} motorcar={motorcar}");
                CAR_NOT_ALLOWED
            }
        }

        // Steps
        30 => {
            if !motorcar.is_empty() && motorcar != "no" {
                log::warn!("way {way_id}: illegal combination highway={highway} motorcar={motorcar}");
            }
            CAR_NOT_ALLOWED
        }

        // Ways not primarily intended for cars
        31..=49 => {
            if motorcar.is_empty() || motorcar == "no" {
                CAR_NOT_ALLOWED
            } else if ALLOWED.contains(&motorcar) {
                CAR_ALLOWED
            } else if RESTRICTED.contains(&motorcar) {
                CAR_RESTRICTED
            } else {
                log::warn!("way {way_id}: unhandled combination highway={highway} motorcar={motorcar}");
                CAR_NOT_ALLOWED
            }
        }

        _ => CAR_NOT_ALLOWED,
    }
}

/// Parses the [lanes](https://wiki.openstreetmap.org/wiki/Key:lanes) tag.
///
/// Non-numeric values (like `2;3` or `1, 2`) are logged and summed up token by token,
/// where every non-numeric token counts as one lane. Counts (and tokens) which don't fit
/// in a 32-bit signed integer are treated the same way. There is always at least one lane.
pub fn lane_count(lanes: &str, way_id: i64) -> u32 {
    if let Ok(n) = lanes.parse::<i32>() {
        if let Ok(n) = u32::try_from(n) {
            return n;
        }
    }

    let stripped = lanes.replace(' ', "");
    let mut tokens: Vec<&str> = stripped.split([',', ';']).collect();
    while tokens.len() > 1 && tokens.last() == Some(&"") {
        tokens.pop();
    }

    let total: i64 = tokens
        .iter()
        .map(|token| token.parse::<i32>().map(i64::from).unwrap_or(1))
        .sum();
    let count = i32::try_from(total)
        .ok()
        .filter(|&n| n > 0)
        .map(|n| n as u32)
        .unwrap_or(1);

    log::warn!("way {way_id}: non-numeric lanes={lanes:?}, assuming {count}");
    count
}

/// Parses the [maxspeed](https://wiki.openstreetmap.org/wiki/Key:maxspeed) tag into km/h.
/// Only numeric values, optionally followed by `km/h`, `kmh` or `mph`, are understood.
pub fn parse_max_speed(value: &str) -> Option<i32> {
    let value = value.trim();
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let speed: i32 = value[..digits_end].parse().ok()?;

    match value[digits_end..].trim() {
        "" | "km/h" | "kmh" => Some(speed),
        "mph" => Some((speed as f64 * 1.609344).round() as i32),
        _ => None,
    }
}

/// Checks if a `oneway` tag value marks a way as one-way.
pub fn is_one_way(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1"
}

/// Attributes of an OSM way relevant for the routing graph, resolved from its tags.
#[derive(Debug, Clone, PartialEq)]
pub struct WayAttributes {
    /// Max speed from the `maxspeed` tag, or -1 if not set.
    pub max_speed_osm: i32,
    pub one_way: bool,
    pub lanes: u32,
    pub highway_type: i32,
    pub car_permission: u8,
    pub name: String,

    /// Means of transport which may use this way.
    pub mode: TransportMode,
}

impl WayAttributes {
    /// Resolves the attributes of a way. Returns `None` for ways which are never
    /// needed for routing: areas (`area=yes`) and service roads (`highway=service`).
    pub fn from_tags(way_id: i64, tags: &HashMap<String, String>) -> Option<Self> {
        let tag = |k: &str| tags.get(k).map(|v| v.as_str()).unwrap_or("");

        if tag("highway") == "service" || tag("area") == "yes" {
            return None;
        }

        let max_speed_osm = match tags.get("maxspeed") {
            Some(v) => parse_max_speed(v).unwrap_or_else(|| {
                log::debug!("way {way_id}: ignoring maxspeed={v:?}");
                -1
            }),
            None => -1,
        };

        let lanes = tags
            .get("lanes")
            .map(|v| lane_count(v, way_id))
            .unwrap_or(1);

        let highway_type = highway_type(tag("highway"));
        let car_permission = car_permission(highway_type, tag("motorcar"), way_id);

        let mut mode = TransportMode::NONE;
        if car_permission != CAR_NOT_ALLOWED {
            mode |= TransportMode::CAR;
        }
        if tag("railway") == "tram" {
            mode |= TransportMode::TRAM;
        }

        Some(Self {
            max_speed_osm,
            one_way: is_one_way(tag("oneway")),
            lanes,
            highway_type,
            car_permission,
            name: tag("name").to_string(),
            mode,
        })
    }

    /// Max speed in km/h: the OSM value when set, the highway type default otherwise.
    pub fn max_speed(&self) -> i32 {
        if self.max_speed_osm > 0 {
            self.max_speed_osm
        } else {
            max_speed(self.highway_type)
        }
    }
}
