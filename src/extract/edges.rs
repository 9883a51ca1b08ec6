// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{
    whole_meters, BetweenPoint, Boundary, Error, RoutingEdge, RoutingGraph, RoutingNode,
};

use super::index::{DenseIndexMap, Sizing};
use super::junction::Segment;
use super::partition::{RawNode, RawWay};

/// Geometry of a segment: its length and positions of all interior points.
#[derive(Debug, Clone, PartialEq)]
struct Geometry {
    length: i32,
    between: Vec<BetweenPoint>,
}

impl Geometry {
    /// Geometry of the same segment traversed backwards.
    fn reversed(&self) -> Self {
        Self {
            length: self.length,
            between: self
                .between
                .iter()
                .rev()
                .map(|p| BetweenPoint {
                    dist_from_start: self.length - p.dist_from_start,
                    ..*p
                })
                .collect(),
        }
    }
}

/// Routing graph of a boundary, together with the total length of its
/// streets (every segment counted once, regardless of direction).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assembled {
    pub graph: RoutingGraph,
    pub street_length: i64,
}

/// Builds the routing graph of a boundary out of its segments.
///
/// Nodes and edges are created in the same order as during the sizing pass,
/// so that the pre-allocated arrays are never grown.
pub(crate) fn assemble(
    boundary: &Boundary,
    segments: &[Segment<'_>],
    sizing: &Sizing,
) -> Result<Assembled, Error> {
    let mut street_length: i64 = 0;
    let mut index = DenseIndexMap::default();
    let mut nodes: Vec<RoutingNode> = Vec::with_capacity(sizing.node_count());
    let mut edges: Vec<RoutingEdge> = Vec::with_capacity(sizing.edge_count);

    for segment in segments.iter().filter(|s| s.is_permitted(boundary.mode)) {
        let from = node_index(boundary, segment, segment.first(), &mut index, &mut nodes)?;
        let to = node_index(boundary, segment, segment.last(), &mut index, &mut nodes)?;
        let geometry = trace_geometry(boundary, segment)?;
        street_length += geometry.length as i64;

        if !segment.way.attrs.one_way {
            let backward = edge(segment.way, from, geometry.reversed());
            add_edge(&mut nodes, &mut edges, from, to, edge(segment.way, to, geometry));
            add_edge(&mut nodes, &mut edges, to, from, backward);
        } else {
            add_edge(&mut nodes, &mut edges, from, to, edge(segment.way, to, geometry));
        }
    }

    debug_assert_eq!(index.ids(), sizing.index.ids());
    debug_assert_eq!(nodes.len(), sizing.node_count());
    debug_assert_eq!(edges.len(), sizing.edge_count);

    Ok(Assembled {
        graph: RoutingGraph {
            nodes,
            edges,
            ..Default::default()
        },
        street_length,
    })
}

/// Returns the dense index of a segment endpoint, creating its [RoutingNode] on first use.
fn node_index(
    boundary: &Boundary,
    segment: &Segment<'_>,
    id: i64,
    index: &mut DenseIndexMap,
    nodes: &mut Vec<RoutingNode>,
) -> Result<usize, Error> {
    let (idx, inserted) = index.get_or_insert(id);
    if inserted {
        let raw = raw_node(boundary, segment.way.id, id)?;
        nodes.push(RoutingNode {
            id,
            lon: raw.lon,
            lat: raw.lat,
            outgoing: Vec::default(),
        });
    }
    Ok(idx)
}

fn raw_node<'a>(boundary: &'a Boundary, way_id: i64, node_id: i64) -> Result<&'a RawNode, Error> {
    boundary.nodes.get(&node_id).ok_or_else(|| Error::MissingNode {
        boundary: boundary.name.clone(),
        way_id,
        node_id,
    })
}

/// Measures a segment: distances between consecutive nodes are truncated
/// to whole meters before being added up.
fn trace_geometry(boundary: &Boundary, segment: &Segment<'_>) -> Result<Geometry, Error> {
    let points = segment
        .nodes
        .iter()
        .map(|&id| raw_node(boundary, segment.way.id, id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut length: i32 = 0;
    let mut between = Vec::with_capacity(points.len().saturating_sub(2));

    for (i, pair) in points.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        length = length.saturating_add(whole_meters(a.lat, a.lon, b.lat, b.lon));

        // Every point but the last one is an interior point
        if i + 2 < points.len() {
            between.push(BetweenPoint {
                lon: b.lon,
                lat: b.lat,
                id: b.id,
                dist_from_start: length,
            });
        }
    }

    Ok(Geometry { length, between })
}

fn edge(way: &RawWay, target: usize, geometry: Geometry) -> RoutingEdge {
    RoutingEdge {
        way_id: way.id,
        max_speed: way.attrs.max_speed(),
        car_permission: way.attrs.car_permission,
        lanes: way.attrs.lanes,
        highway_type: way.attrs.highway_type,
        name: way.attrs.name.clone(),
        target,
        length: geometry.length,
        between: geometry.between,
    }
}

fn add_edge(
    nodes: &mut [RoutingNode],
    edges: &mut Vec<RoutingEdge>,
    from: usize,
    to: usize,
    e: RoutingEdge,
) {
    debug_assert_eq!(e.target, to);
    nodes[from].outgoing.push(edges.len());
    edges.push(e);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::extract::index::size;
    use crate::osm::{Node, WayAttributes};
    use crate::TransportMode;

    fn boundary(points: &[(i64, f64, f64)]) -> Boundary {
        let mut b = Boundary::whole_map("test", TransportMode::CAR);
        for &(id, lat, lon) in points {
            b.add_node(&Node { id, lat, lon });
        }
        b
    }

    fn raw_way(id: i64, tags: &[(&str, &str)]) -> RawWay {
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
    fn geometry_of_straight_line() {
        let b = boundary(&[(1, 0.0, 0.0), (2, 0.0, 0.001), (3, 0.0, 0.002)]);
        let w = raw_way(10, &[("highway", "residential")]);
        let g = trace_geometry(
            &b,
            &Segment {
                way: &w,
                nodes: &[1, 2, 3],
            },
        )
        .unwrap();

        // 0.001° along the equator is 111.19 m
        assert_eq!(g.length, 222);
        assert_eq!(g.between.len(), 1);
        assert_eq!(g.between[0].id, 2);
        assert_eq!(g.between[0].dist_from_start, 111);

        let r = g.reversed();
        assert_eq!(r.length, 222);
        assert_eq!(r.between[0].id, 2);
        assert_eq!(r.between[0].dist_from_start, 111);
    }

    #[test]
    fn two_node_segment_has_no_between_points() {
        let b = boundary(&[(1, 0.0, 0.0), (2, 0.001, 0.0)]);
        let w = raw_way(10, &[("highway", "residential")]);
        let g = trace_geometry(&b, &Segment { way: &w, nodes: &[1, 2] }).unwrap();
        assert_eq!(g.length, 111);
        assert!(g.between.is_empty());
    }

    #[test]
    fn assemble_mirrored_and_one_way() {
        let b = boundary(&[(1, 0.0, 0.0), (2, 0.0, 0.001), (3, 0.0, 0.002), (4, 0.001, 0.002)]);
        let street = raw_way(10, &[("highway", "residential"), ("name", "Long St")]);
        let ramp = raw_way(11, &[("highway", "primary_link"), ("oneway", "yes")]);
        let segments = [
            Segment {
                way: &street,
                nodes: &[1, 2, 3],
            },
            Segment {
                way: &ramp,
                nodes: &[3, 4],
            },
        ];

        let sizing = size(&segments, TransportMode::CAR);
        let Assembled {
            graph: g,
            street_length,
        } = assemble(&b, &segments, &sizing).unwrap();
        assert_eq!(street_length, 222 + 111);

        let ids: Vec<i64> = g.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, [1, 3, 4]);
        assert_eq!(g.edges.len(), 3);
        assert_eq!(g.nodes[0].outgoing, [0]);
        assert_eq!(g.nodes[1].outgoing, [1, 2]);
        assert!(g.nodes[2].outgoing.is_empty());

        let (fwd, bwd, ramp) = (&g.edges[0], &g.edges[1], &g.edges[2]);
        assert_eq!(fwd.target, 1);
        assert_eq!(bwd.target, 0);
        assert_eq!(fwd.length, bwd.length);
        assert_eq!(fwd.name, "Long St");
        assert_eq!(fwd.max_speed, 30);
        assert_eq!(ramp.target, 2);
        assert_eq!(ramp.max_speed, 70);
        assert_eq!(ramp.way_id, 11);
        assert_eq!(g.edge_sources(), [0, 1, 1]);
    }

    #[test]
    fn missing_node() {
        let b = boundary(&[(1, 0.0, 0.0)]);
        let w = raw_way(10, &[("highway", "residential")]);
        let segments = [Segment {
            way: &w,
            nodes: &[1, 2],
        }];
        let sizing = size(&segments, TransportMode::CAR);
        let err = assemble(&b, &segments, &sizing).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingNode {
                way_id: 10,
                node_id: 2,
                ..
            }
        ));
    }
}
