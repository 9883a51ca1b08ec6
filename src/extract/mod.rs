// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use crate::codec::{self, Layout};
use crate::osm::{Bounds, Feature, WayAttributes};
use crate::{Boundary, Error, RoutingGraph};

mod edges;
mod index;
mod junction;
mod partition;

pub(crate) use partition::{RawNode, RawWay};

/// Statistics of a single extracted [Boundary].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryReport {
    pub name: String,

    /// Number of OSM nodes inside the boundary.
    pub nodes_loaded: usize,

    /// Number of nodes of the routing graph (junctions and dead ends).
    pub nodes_used: usize,

    /// Number of OSM ways with at least one part inside the boundary.
    pub ways: usize,

    /// Number of directed edges of the routing graph.
    pub edges: usize,

    /// Length of all streets (each direction counted once), in meters.
    pub street_length: i64,

    /// Graph files written for this boundary.
    pub files: Vec<PathBuf>,
}

/// Extracts [RoutingGraphs](RoutingGraph) for a set of [Boundaries](Boundary)
/// from a single pass over OSM data.
///
/// All data which falls into any boundary is kept in memory until the extractor is dropped.
#[derive(Debug, Default)]
pub struct Extractor {
    boundaries: Vec<Boundary>,
    file_bounds: Option<Bounds>,
}

impl Extractor {
    pub fn new(boundaries: Vec<Boundary>) -> Self {
        Self {
            boundaries,
            file_bounds: None,
        }
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Extent of the data, as declared by the last `<bounds>` element seen.
    pub fn file_bounds(&self) -> Option<Bounds> {
        self.file_bounds
    }

    /// Distributes a single OSM feature to all boundaries.
    ///
    /// Nodes must be added before the ways which reference them.
    pub fn add_feature(&mut self, f: Feature) {
        match f {
            Feature::Bounds(b) => self.file_bounds = Some(b),

            Feature::Node(n) => {
                for boundary in &mut self.boundaries {
                    boundary.add_node(&n);
                }
            }

            Feature::Way(w) => {
                let Some(attrs) = WayAttributes::from_tags(w.id, &w.tags) else {
                    return;
                };
                for boundary in &mut self.boundaries {
                    boundary.add_way(w.id, &w.nodes, &attrs);
                }
            }
        }
    }

    /// Adds all features from a stream, stopping at the first error.
    pub fn add_features<I, E>(&mut self, features: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Result<Feature, E>>,
        Error: From<E>,
    {
        for f in features {
            self.add_feature(f?);
        }

        for b in &self.boundaries {
            log::debug!(
                "boundary {}: {} nodes and {} ways loaded",
                b.name,
                b.node_count(),
                b.way_count()
            );
        }
        Ok(())
    }

    /// Builds the [RoutingGraph] of the boundary at the provided position.
    pub fn build_graph(&self, boundary_idx: usize) -> Result<RoutingGraph, Error> {
        let boundary = self
            .boundaries
            .get(boundary_idx)
            .ok_or(Error::UnknownBoundary(boundary_idx))?;
        self.build(boundary).map(|(g, _)| g)
    }

    fn build(&self, boundary: &Boundary) -> Result<(RoutingGraph, BoundaryReport), Error> {
        let counts = junction::count_junctions(&boundary.ways);
        let segments = junction::split_at_junctions(&boundary.ways, &counts);
        let sizing = index::size(&segments, boundary.mode);
        log::debug!(
            "boundary {}: {} segments, sized for {} nodes and {} edges",
            boundary.name,
            segments.len(),
            sizing.node_count(),
            sizing.edge_count,
        );

        let edges::Assembled {
            graph: mut g,
            street_length,
        } = edges::assemble(boundary, &segments, &sizing)?;

        if !boundary.is_unbounded() {
            g.set_bbox(boundary.bbox());
        } else if let Some(b) = self.file_bounds {
            g.set_bbox([b.min_lat, b.min_lon, b.max_lat, b.max_lon]);
        } else {
            g.fit_bbox_to_nodes();
        }

        let report = BoundaryReport {
            name: boundary.name.clone(),
            nodes_loaded: boundary.node_count(),
            nodes_used: g.nodes.len(),
            ways: boundary.way_count(),
            edges: g.edges.len(),
            street_length,
            files: Vec::default(),
        };
        Ok((g, report))
    }

    /// Builds and writes graphs of all boundaries into `out_dir`, as
    /// `<name>.routing.graph.small` (without geometry) and
    /// `<name>.routing.graph.large` (with geometry). Existing files are replaced.
    ///
    /// Failures are logged and reported per boundary; they don't stop
    /// the remaining boundaries from being processed.
    pub fn run(&self, out_dir: &Path) -> Vec<Result<BoundaryReport, Error>> {
        self.boundaries
            .iter()
            .map(|boundary| {
                let result = self.run_boundary(boundary, out_dir);
                match &result {
                    Ok(r) => log_report(r),
                    Err(e) => log::error!("boundary {}: {}", boundary.name, e),
                }
                result
            })
            .collect()
    }

    fn run_boundary(&self, boundary: &Boundary, out_dir: &Path) -> Result<BoundaryReport, Error> {
        let (g, mut report) = self.build(boundary)?;

        for layout in [Layout::Compact, Layout::WithGeometry] {
            let path = out_dir.join(layout.file_name(&boundary.name));
            codec::write_file(&path, &g, layout).map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;
            log::debug!("written {}", path.display());
            report.files.push(path);
        }

        Ok(report)
    }
}

fn log_report(r: &BoundaryReport) {
    log::info!(
        "boundary {}: {} of {} nodes used, {} ways turned into {} directed edges, {:.1} km of streets",
        r.name,
        r.nodes_used,
        r.nodes_loaded,
        r.ways,
        r.edges,
        r.street_length as f64 / 1000.0,
    );
}
