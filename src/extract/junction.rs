// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};

use crate::TransportMode;

use super::partition::{RawWay, MIN_WAY_SIZE};

/// Tells how a node is used by the part-ways of a boundary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JunctionCount {
    /// Number of times the node starts or ends a part-way.
    pub outer: u32,

    /// Number of times the node is an interior point of a part-way.
    pub inner: u32,
}

impl JunctionCount {
    /// A node splits a way if some other way ends at it,
    /// or if it's passed through more than once.
    pub fn is_junction(&self) -> bool {
        self.outer > 0 || self.inner > 1
    }
}

/// Piece of a way between two junctions (or dead ends), which becomes
/// one or two directed edges of the routing graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Segment<'a> {
    pub way: &'a RawWay,

    /// Node ids of the segment, always at least [MIN_WAY_SIZE] of them.
    pub nodes: &'a [i64],
}

impl Segment<'_> {
    pub fn first(&self) -> i64 {
        self.nodes[0]
    }

    pub fn last(&self) -> i64 {
        self.nodes[self.nodes.len() - 1]
    }

    /// Checks if the way of this segment may be used by any of the provided means of transport.
    pub fn is_permitted(&self, mode: TransportMode) -> bool {
        self.way.attrs.mode.intersects(mode)
    }
}

/// Counts how many times every node is an endpoint or an interior point of a part-way.
pub(crate) fn count_junctions(ways: &BTreeMap<i64, RawWay>) -> HashMap<i64, JunctionCount> {
    let mut counts: HashMap<i64, JunctionCount> = HashMap::default();

    for part in ways.values().flat_map(|w| w.part_ways.iter()) {
        let Some((&first, rest)) = part.split_first() else {
            continue;
        };
        let Some((&last, interior)) = rest.split_last() else {
            continue;
        };

        counts.entry(first).or_default().outer += 1;
        counts.entry(last).or_default().outer += 1;
        for &id in interior {
            counts.entry(id).or_default().inner += 1;
        }
    }

    counts
}

/// Cuts all part-ways at junctions into [Segments](Segment), in way id order.
pub(crate) fn split_at_junctions<'a>(
    ways: &'a BTreeMap<i64, RawWay>,
    counts: &HashMap<i64, JunctionCount>,
) -> Vec<Segment<'a>> {
    let mut segments = Vec::default();

    for way in ways.values() {
        for part in &way.part_ways {
            let mut start = 0;
            for (i, id) in part.iter().enumerate().skip(1) {
                if counts.get(id).is_some_and(|c| c.is_junction()) {
                    segments.push(Segment {
                        way,
                        nodes: &part[start..=i],
                    });
                    start = i;
                }
            }

            if part.len() - start >= MIN_WAY_SIZE {
                segments.push(Segment {
                    way,
                    nodes: &part[start..],
                });
            }
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::osm::WayAttributes;

    fn ways(parts: &[(i64, &[&[i64]])]) -> BTreeMap<i64, RawWay> {
        let tags = HashMap::from_iter([("highway".to_string(), "residential".to_string())]);
        let attrs = WayAttributes::from_tags(1, &tags).unwrap();
        parts
            .iter()
            .map(|&(id, p)| {
                (
                    id,
                    RawWay {
                        id,
                        attrs: attrs.clone(),
                        part_ways: p.iter().map(|n| n.to_vec()).collect(),
                    },
                )
            })
            .collect()
    }

    fn segment_nodes(segments: &[Segment<'_>]) -> Vec<(i64, Vec<i64>)> {
        segments
            .iter()
            .map(|s| (s.way.id, s.nodes.to_vec()))
            .collect()
    }

    #[test]
    fn counts() {
        let w = ways(&[(1, &[&[1, 2, 3, 4]]), (2, &[&[3, 5], &[6, 2, 7]])]);
        let c = count_junctions(&w);
        assert_eq!(c[&1], JunctionCount { outer: 1, inner: 0 });
        assert_eq!(c[&2], JunctionCount { outer: 0, inner: 2 });
        assert_eq!(c[&3], JunctionCount { outer: 1, inner: 1 });
        assert_eq!(c[&4], JunctionCount { outer: 1, inner: 0 });
        assert_eq!(c[&7], JunctionCount { outer: 1, inner: 0 });
    }

    #[test]
    fn penultimate_node_is_counted() {
        let w = ways(&[(1, &[&[1, 2, 3]]), (2, &[&[4, 2, 5]])]);
        let c = count_junctions(&w);
        assert_eq!(c[&2].inner, 2);
        assert!(c[&2].is_junction());
    }

    #[test]
    fn no_junctions() {
        let w = ways(&[(1, &[&[1, 2, 3, 4]])]);
        let s = split_at_junctions(&w, &count_junctions(&w));
        assert_eq!(segment_nodes(&s), vec![(1, vec![1, 2, 3, 4])]);
    }

    #[test]
    fn split_at_endpoint_of_other_way() {
        let w = ways(&[(1, &[&[1, 2, 3]]), (2, &[&[2, 4]])]);
        let s = split_at_junctions(&w, &count_junctions(&w));
        assert_eq!(
            segment_nodes(&s),
            vec![(1, vec![1, 2]), (1, vec![2, 3]), (2, vec![2, 4])]
        );
    }

    #[test]
    fn split_at_crossing() {
        let w = ways(&[(1, &[&[1, 2, 3]]), (2, &[&[4, 2, 5]])]);
        let s = split_at_junctions(&w, &count_junctions(&w));
        assert_eq!(
            segment_nodes(&s),
            vec![
                (1, vec![1, 2]),
                (1, vec![2, 3]),
                (2, vec![4, 2]),
                (2, vec![2, 5])
            ]
        );
    }

    #[test]
    fn closed_loop() {
        let w = ways(&[(1, &[&[1, 2, 3, 1]])]);
        let s = split_at_junctions(&w, &count_junctions(&w));
        assert_eq!(segment_nodes(&s), vec![(1, vec![1, 2, 3, 1])]);
    }

    #[test]
    fn segments_have_at_least_two_nodes() {
        let w = ways(&[
            (1, &[&[1, 2, 3, 4, 5]]),
            (2, &[&[3, 6], &[7, 4]]),
            (3, &[&[5, 8, 9]]),
        ]);
        let s = split_at_junctions(&w, &count_junctions(&w));
        assert!(!s.is_empty());
        for segment in &s {
            assert!(segment.nodes.len() >= MIN_WAY_SIZE);
        }
    }
}
