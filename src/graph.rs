// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{RoutingEdge, RoutingNode};

/// Densely indexed, directed road network of a single boundary.
///
/// Nodes are stored in the order in which they were first referenced,
/// edges in the order in which they were created. Every node lists the
/// positions of its outgoing edges, and every edge points to its
/// target node by position.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoutingGraph {
    pub nodes: Vec<RoutingNode>,
    pub edges: Vec<RoutingEdge>,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RoutingGraph {
    /// Returns the bounding box as `[min_lat, min_lon, max_lat, max_lon]`.
    pub fn bbox(&self) -> [f64; 4] {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
    }

    pub fn set_bbox(&mut self, bbox: [f64; 4]) {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon] = bbox;
    }

    /// Sets the bounding box to the extent of all nodes.
    /// An empty graph gets a zero-sized box at (0, 0).
    pub fn fit_bbox_to_nodes(&mut self) {
        if self.nodes.is_empty() {
            self.set_bbox([0.0; 4]);
            return;
        }

        let mut bbox = [f64::INFINITY, f64::INFINITY, -f64::INFINITY, -f64::INFINITY];
        for n in &self.nodes {
            bbox[0] = bbox[0].min(n.lat);
            bbox[1] = bbox[1].min(n.lon);
            bbox[2] = bbox[2].max(n.lat);
            bbox[3] = bbox[3].max(n.lon);
        }
        self.set_bbox(bbox);
    }

    /// Returns all edges starting at the node at the provided position.
    pub fn outgoing_edges(&self, node: usize) -> impl Iterator<Item = &RoutingEdge> {
        self.nodes
            .get(node)
            .map(|n| n.outgoing.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&e| self.edges.get(e))
    }

    /// Returns the position of the start node of every edge.
    pub fn edge_sources(&self) -> Vec<usize> {
        let mut sources = vec![0; self.edges.len()];
        for (idx, node) in self.nodes.iter().enumerate() {
            for &e in &node.outgoing {
                if let Some(s) = sources.get_mut(e) {
                    *s = idx;
                }
            }
        }
        sources
    }

    /// Sum of lengths of all edges, in meters.
    pub fn total_edge_length(&self) -> i64 {
        self.edges.iter().map(|e| e.length as i64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, lat: f64, lon: f64, outgoing: Vec<usize>) -> RoutingNode {
        RoutingNode {
            id,
            lon,
            lat,
            outgoing,
        }
    }

    fn edge(target: usize, length: i32) -> RoutingEdge {
        RoutingEdge {
            way_id: 1,
            max_speed: 50,
            car_permission: 2,
            lanes: 1,
            highway_type: 15,
            name: String::default(),
            target,
            length,
            between: Vec::default(),
        }
    }

    fn simple_graph() -> RoutingGraph {
        RoutingGraph {
            nodes: vec![
                node(10, 50.0, 7.0, vec![0]),
                node(20, 50.5, 6.5, vec![1, 2]),
                node(30, 49.5, 7.5, vec![]),
            ],
            edges: vec![edge(1, 100), edge(0, 100), edge(2, 50)],
            ..Default::default()
        }
    }

    #[test]
    fn fit_bbox() {
        let mut g = simple_graph();
        g.fit_bbox_to_nodes();
        assert_eq!(g.bbox(), [49.5, 6.5, 50.5, 7.5]);

        let mut empty = RoutingGraph::default();
        empty.set_bbox([1.0, 2.0, 3.0, 4.0]);
        empty.fit_bbox_to_nodes();
        assert_eq!(empty.bbox(), [0.0; 4]);
    }

    #[test]
    fn outgoing_edges() {
        let g = simple_graph();
        let targets: Vec<usize> = g.outgoing_edges(1).map(|e| e.target).collect();
        assert_eq!(targets, [0, 2]);
        assert_eq!(g.outgoing_edges(2).count(), 0);
        assert_eq!(g.outgoing_edges(42).count(), 0);
    }

    #[test]
    fn edge_sources() {
        let g = simple_graph();
        assert_eq!(g.edge_sources(), [0, 1, 1]);
        assert_eq!(g.total_edge_length(), 250);
    }
}
