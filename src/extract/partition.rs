// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::osm::{Node, WayAttributes};
use crate::Boundary;

/// Ways (or their parts) with fewer nodes can't form an edge.
pub(crate) const MIN_WAY_SIZE: usize = 2;

/// An OSM node which fell into a [Boundary].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// An OSM way clipped to a [Boundary].
///
/// Every element of `part_ways` is a maximal run of consecutive way nodes
/// lying inside the boundary, with at least [MIN_WAY_SIZE] nodes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawWay {
    pub id: i64,
    pub attrs: WayAttributes,
    pub part_ways: Vec<Vec<i64>>,
}

impl Boundary {
    /// Stores the node if it lies inside the boundary.
    /// Returns true if the node is (or already was) part of the boundary.
    pub(crate) fn add_node(&mut self, n: &Node) -> bool {
        if !self.contains(n.lat, n.lon) {
            return false;
        }

        self.nodes.entry(n.id).or_insert(RawNode {
            id: n.id,
            lat: n.lat,
            lon: n.lon,
        });
        true
    }

    /// Clips a way to the nodes already stored in the boundary.
    /// Returns false if no part of the way is inside.
    pub(crate) fn add_way(&mut self, id: i64, nodes: &[i64], attrs: &WayAttributes) -> bool {
        let part_ways = split_into_parts(nodes, |node_id| self.nodes.contains_key(&node_id));
        if part_ways.is_empty() {
            return false;
        }

        self.ways.insert(
            id,
            RawWay {
                id,
                attrs: attrs.clone(),
                part_ways,
            },
        );
        true
    }
}

/// Splits a sequence of node ids into maximal runs of members,
/// dropping runs shorter than [MIN_WAY_SIZE].
fn split_into_parts<F: Fn(i64) -> bool>(nodes: &[i64], is_member: F) -> Vec<Vec<i64>> {
    nodes
        .split(|&id| !is_member(id))
        .filter(|run| run.len() >= MIN_WAY_SIZE)
        .map(|run| run.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::TransportMode;

    fn residential() -> WayAttributes {
        let tags = HashMap::from_iter([("highway".to_string(), "residential".to_string())]);
        WayAttributes::from_tags(1, &tags).unwrap()
    }

    #[test]
    fn parts() {
        let inside = |id: i64| id % 10 != 0;
        assert_eq!(
            split_into_parts(&[1, 2, 10, 3, 20, 4, 5, 6], inside),
            vec![vec![1, 2], vec![4, 5, 6]]
        );
        assert_eq!(split_into_parts(&[10, 1, 2, 3, 20], inside), vec![vec![1, 2, 3]]);
        assert!(split_into_parts(&[10, 20, 30], inside).is_empty());
        assert!(split_into_parts(&[], inside).is_empty());
    }

    #[test]
    fn nodes_are_filtered_by_position() {
        let mut b = Boundary::new("test", [0.0, 0.0, 1.0, 1.0], TransportMode::CAR);
        assert!(b.add_node(&Node {
            id: 1,
            lat: 0.5,
            lon: 0.5
        }));
        assert!(b.add_node(&Node {
            id: 2,
            lat: 1.0,
            lon: 0.0
        }));
        assert!(!b.add_node(&Node {
            id: 3,
            lat: 1.5,
            lon: 0.5
        }));

        // Duplicates keep the first position
        assert!(b.add_node(&Node {
            id: 1,
            lat: 0.6,
            lon: 0.6
        }));

        assert_eq!(b.node_count(), 2);
        assert_eq!(b.nodes[&1].lat, 0.5);
        for n in b.nodes.values() {
            assert!(b.contains(n.lat, n.lon));
        }
    }

    #[test]
    fn ways_are_clipped() {
        let mut b = Boundary::new("test", [0.0, 0.0, 1.0, 1.0], TransportMode::CAR);
        for (id, lat) in [(1, 0.1), (2, 0.2), (3, 2.0), (4, 0.4), (5, 0.5), (6, 0.6)] {
            b.add_node(&Node { id, lat, lon: 0.5 });
        }

        assert!(b.add_way(10, &[1, 2, 3, 4, 5, 6], &residential()));
        assert!(!b.add_way(11, &[3, 4, 3], &residential()));
        assert!(!b.add_way(12, &[7, 8], &residential()));

        assert_eq!(b.way_count(), 1);
        assert_eq!(b.ways[&10].part_ways, vec![vec![1, 2], vec![4, 5, 6]]);
        for part in &b.ways[&10].part_ways {
            assert!(part.len() >= MIN_WAY_SIZE);
        }
    }
}
