// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Extraction of compact routing graphs from [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! OSM XML data is clipped against one or more [boundaries](Boundary), ways are split
//! at junctions, and every remaining road segment becomes one or two directed
//! [edges](RoutingEdge) of a densely indexed [RoutingGraph]. Graphs are written in a
//! compact binary layout, optionally including intermediate way geometry
//! (see the [codec] module).
//!
//! # Example
//!
//! ```no_run
//! let mut extractor = roadgraph::Extractor::new(vec![roadgraph::Boundary::new(
//!     "monaco",
//!     [43.72, 7.40, 43.76, 7.44],
//!     roadgraph::TransportMode::CAR,
//! )]);
//! roadgraph::osm::add_features_from_file(
//!     &mut extractor,
//!     roadgraph::osm::FileFormat::Unknown,
//!     "path/to/monaco.osm",
//! )
//! .expect("failed to load monaco.osm");
//!
//! let graph = extractor.build_graph(0).expect("failed to build the graph");
//! println!("{} nodes, {} edges", graph.nodes.len(), graph.edges.len());
//! ```

mod boundary;
pub mod codec;
mod distance;
mod error;
mod extract;
mod graph;
pub mod osm;

pub use boundary::{trace, Boundary, BoundarySpec, TransportMode, MAP_BUFFER};
pub use distance::{earth_distance, whole_meters};
pub use error::Error;
pub use extract::{BoundaryReport, Extractor};
pub use graph::RoutingGraph;

/// Represents a junction (or a dead end) of the [RoutingGraph].
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingNode {
    /// OpenStreetMap id of the node
    pub id: i64,
    pub lon: f64,
    pub lat: f64,

    /// Positions of edges starting at this node in [RoutingGraph::edges].
    pub outgoing: Vec<usize>,
}

/// An intermediate point of a [RoutingEdge], i.e. a way node which
/// is not a junction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetweenPoint {
    pub lon: f64,
    pub lat: f64,

    /// OpenStreetMap id of the node. Not persisted by the [codec].
    pub id: i64,

    /// Distance along the edge from its start node, in meters.
    pub dist_from_start: i32,
}

/// Represents a directed connection between two [RoutingNodes](RoutingNode).
///
/// For two-way roads there are two edges with equal `length`, where the
/// `between` points of one are the reverse of the other.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingEdge {
    /// OpenStreetMap id of the way this edge was cut from. Not persisted by the [codec].
    pub way_id: i64,

    /// Maximum speed in km/h, either from OSM data or guessed from the highway type.
    pub max_speed: i32,

    /// 0 = not allowed, 1 = restricted, 2 = allowed; see [osm::car_permission].
    pub car_permission: u8,
    pub lanes: u32,

    /// Index into [osm::HIGHWAY_TYPES], or -1 for unknown highway types.
    pub highway_type: i32,
    pub name: String,

    /// Position of the end node in [RoutingGraph::nodes].
    pub target: usize,

    /// Length in meters.
    pub length: i32,
    pub between: Vec<BetweenPoint>,
}
