// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use roadgraph::osm::FileFormat;
use roadgraph::{BoundarySpec, Extractor};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct LoadError(PathBuf, #[source] roadgraph::Error);

#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} boundaries could not be extracted")]
struct RunError {
    failed: usize,
    total: usize,
}

/// Extracts routing graphs from an OSM XML file (optionally gzip or bzip2 compressed).
///
/// For every boundary, two files are written into the output directory:
/// `<name>.routing.graph.small` (without way geometry) and
/// `<name>.routing.graph.large` (with way geometry).
#[derive(Parser)]
struct Cli {
    /// Directory where graph files are written
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// The path to the OSM file
    osm_file: PathBuf,

    /// Boundaries to extract: any sequence of `<min_lat> <min_lon> <max_lat> <max_lon>`
    /// boxes or `.txt`/`.gpx` GPS traces, each optionally followed by `-tram`.
    /// Without boundaries, the whole file is extracted for cars
    /// (or for trams, if only `-tram` is given).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    boundaries: Vec<String>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let specs = BoundarySpec::from_args(&cli.boundaries)?;
    let boundaries = BoundarySpec::resolve_all(&specs, &cli.osm_file)?;
    for b in &boundaries {
        log::info!("boundary {}: {:?}", b.name, b.bbox());
    }

    let mut extractor = Extractor::new(boundaries);
    roadgraph::osm::add_features_from_file(&mut extractor, FileFormat::Unknown, &cli.osm_file)
        .map_err(|e| LoadError(cli.osm_file.clone(), e))?;

    let results = extractor.run(&cli.output_dir);
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(RunError {
            failed,
            total: results.len(),
        }
        .into());
    }

    Ok(())
}
