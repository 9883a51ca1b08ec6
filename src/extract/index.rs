// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::{Entry, HashMap};

use crate::TransportMode;

use super::junction::Segment;

/// Assigns consecutive indices (starting from zero) to OSM node ids,
/// in the order in which they are first seen. Indices are never reassigned.
#[derive(Debug, Default, Clone)]
pub(crate) struct DenseIndexMap {
    indices: HashMap<i64, usize>,
    ids: Vec<i64>,
}

impl DenseIndexMap {
    /// Returns the index of a node id, allocating the next free one for unseen ids.
    /// The second element is true if the index was just allocated.
    pub fn get_or_insert(&mut self, id: i64) -> (usize, bool) {
        match self.indices.entry(id) {
            Entry::Occupied(e) => (*e.get(), false),
            Entry::Vacant(e) => {
                let idx = self.ids.len();
                e.insert(idx);
                self.ids.push(id);
                (idx, true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Node ids in index order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }
}

/// Result of the sizing pass over a boundary's segments.
#[derive(Debug, Default, Clone)]
pub(crate) struct Sizing {
    pub index: DenseIndexMap,
    pub edge_count: usize,
}

impl Sizing {
    pub fn node_count(&self) -> usize {
        self.index.len()
    }
}

/// Computes the number of graph nodes and edges required to represent all
/// segments which may be used by `mode`. Only segment endpoints become nodes.
pub(crate) fn size(segments: &[Segment<'_>], mode: TransportMode) -> Sizing {
    let mut s = Sizing::default();

    for segment in segments.iter().filter(|s| s.is_permitted(mode)) {
        s.index.get_or_insert(segment.first());
        s.index.get_or_insert(segment.last());
        s.edge_count += if segment.way.attrs.one_way { 1 } else { 2 };
    }

    s
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::extract::partition::RawWay;
    use crate::osm::WayAttributes;

    fn way(id: i64, tags: &[(&str, &str)]) -> RawWay {
        let tags = tags
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        RawWay {
            id,
            attrs: WayAttributes::from_tags(id, &tags).unwrap(),
            part_ways: Vec::default(),
        }
    }

    #[test]
    fn dense_index_map() {
        let mut m = DenseIndexMap::default();
        assert_eq!(m.get_or_insert(42), (0, true));
        assert_eq!(m.get_or_insert(-7), (1, true));
        assert_eq!(m.get_or_insert(42), (0, false));
        assert_eq!(m.get_or_insert(3), (2, true));
        assert_eq!(m.len(), 3);
        assert_eq!(m.ids(), &[42, -7, 3]);
    }

    #[test]
    fn sizing() {
        let two_way = way(1, &[("highway", "residential")]);
        let one_way = way(2, &[("highway", "primary"), ("oneway", "yes")]);
        let footway = way(3, &[("highway", "footway")]);
        let tram = way(4, &[("railway", "tram")]);

        let segments = [
            Segment {
                way: &two_way,
                nodes: &[1, 2, 3],
            },
            Segment {
                way: &one_way,
                nodes: &[3, 4],
            },
            Segment {
                way: &footway,
                nodes: &[4, 5],
            },
            Segment {
                way: &tram,
                nodes: &[5, 6],
            },
            Segment {
                way: &two_way,
                nodes: &[3, 1],
            },
        ];

        let s = size(&segments, TransportMode::CAR);
        assert_eq!(s.node_count(), 3);
        assert_eq!(s.index.ids(), &[1, 3, 4]);
        assert_eq!(s.edge_count, 5);

        let s = size(&segments, TransportMode::TRAM);
        assert_eq!(s.index.ids(), &[5, 6]);
        assert_eq!(s.edge_count, 2);
    }

    #[test]
    fn sizing_is_deterministic() {
        let w = way(1, &[("highway", "residential")]);
        let segments = [
            Segment {
                way: &w,
                nodes: &[9, 2],
            },
            Segment {
                way: &w,
                nodes: &[2, 5, 7],
            },
        ];
        let first = size(&segments, TransportMode::CAR);
        let second = size(&segments, TransportMode::CAR);
        assert_eq!(first.index.ids(), second.index.ids());
        assert_eq!(first.index.ids(), &[9, 2, 7]);
        assert_eq!(first.edge_count, second.edge_count);
    }
}
