// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Represents an [OSM node](https://wiki.openstreetmap.org/wiki/Node).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub tags: HashMap<String, String>,
}

/// Extent of the data declared by an OSM file in its
/// [bounds](https://wiki.openstreetmap.org/wiki/OSM_XML#Contents) element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Union over all OSM primitives consumed when extracting graphs.
///
/// [Relations](https://wiki.openstreetmap.org/wiki/Relation) are not represented,
/// as reading stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Bounds(Bounds),
    Node(Node),
    Way(Way),
}
