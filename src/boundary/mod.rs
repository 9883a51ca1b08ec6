// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

use crate::extract::{RawNode, RawWay};
use crate::Error;

pub mod trace;

/// Margin (in degrees) added on every side of user-provided boundaries,
/// so that roads just outside of the requested area are still connected.
pub const MAP_BUFFER: f64 = 0.0025;

/// Bitmask of means of transport which may use a way.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportMode(u8);

impl TransportMode {
    pub const NONE: Self = Self(0x00);
    pub const CAR: Self = Self(0x01);
    pub const TRAM: Self = Self(0x02);

    /// Returns true if both masks have at least one mode in common.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for TransportMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransportMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A named geographic extraction region, together with OSM data
/// which falls into it.
///
/// Every boundary owns its nodes and ways; boundaries never share mutable state.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub mode: TransportMode,
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
    pub(crate) nodes: HashMap<i64, RawNode>,
    pub(crate) ways: BTreeMap<i64, RawWay>,
}

impl Boundary {
    /// Creates a boundary from a bounding box given as `[min_lat, min_lon, max_lat, max_lon]`.
    /// Coordinates are [normalized](normalize_lat) into the valid range.
    pub fn new<S: Into<String>>(name: S, bbox: [f64; 4], mode: TransportMode) -> Self {
        let [min_lat, min_lon, max_lat, max_lon] = bbox;
        Self {
            name: name.into(),
            mode,
            min_lat: normalize_lat(min_lat),
            min_lon: normalize_lon(min_lon),
            max_lat: normalize_lat(max_lat),
            max_lon: normalize_lon(max_lon),
            nodes: HashMap::default(),
            ways: BTreeMap::default(),
        }
    }

    /// Creates a boundary from a bounding box enlarged by `buffer` degrees on every side.
    pub fn with_buffer<S: Into<String>>(
        name: S,
        bbox: [f64; 4],
        buffer: f64,
        mode: TransportMode,
    ) -> Self {
        let [min_lat, min_lon, max_lat, max_lon] = bbox;
        Self::new(
            name,
            [
                min_lat - buffer,
                min_lon - buffer,
                max_lat + buffer,
                max_lon + buffer,
            ],
            mode,
        )
    }

    /// Creates a boundary which accepts every node.
    pub fn whole_map<S: Into<String>>(name: S, mode: TransportMode) -> Self {
        Self {
            name: name.into(),
            mode,
            min_lat: -f64::MAX,
            min_lon: -f64::MAX,
            max_lat: f64::MAX,
            max_lon: f64::MAX,
            nodes: HashMap::default(),
            ways: BTreeMap::default(),
        }
    }

    /// Returns the bounding box as `[min_lat, min_lon, max_lat, max_lon]`.
    pub fn bbox(&self) -> [f64; 4] {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
    }

    /// True for boundaries created with [Boundary::whole_map].
    pub fn is_unbounded(&self) -> bool {
        self.bbox().iter().any(|x| x.abs() == f64::MAX)
    }

    /// Checks if a position lies within the (inclusive) bounding box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Number of OSM nodes which fell into this boundary.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of OSM ways with at least one part inside this boundary.
    pub fn way_count(&self) -> usize {
        self.ways.len()
    }
}

/// Normalizes a latitude into the -90..=90 range.
pub fn normalize_lat(lat: f64) -> f64 {
    normalize_deg(lat, -90.0, 90.0)
}

/// Normalizes a longitude into the -180..=180 range.
pub fn normalize_lon(lon: f64) -> f64 {
    normalize_deg(lon, -180.0, 180.0)
}

/// Wraps `value` periodically into `range_start..=range_end`, where `range_start == -range_end`.
fn normalize_deg(value: f64, range_start: f64, range_end: f64) -> f64 {
    let mut result = value % range_end;

    // Odd number of half-periods passed: continue from the opposite border
    let border = if result > 0.0 || (result == 0.0 && value < 0.0) {
        range_start
    } else {
        range_end
    };
    if (value / range_end) as i64 % 2 != 0 {
        result += border;
    }

    // Also turns -0.0 into 0.0
    if result == 0.0 {
        0.0
    } else {
        result
    }
}

/// Describes a requested extraction region, before it is resolved into a [Boundary].
#[derive(Debug, Clone, PartialEq)]
pub enum BoundarySpec {
    /// Extract everything, named after the OSM file.
    WholeMap { mode: TransportMode },

    /// Explicit `[min_lat, min_lon, max_lat, max_lon]` box, named `boundaryN`.
    Box { bbox: [f64; 4], mode: TransportMode },

    /// Box covering all points of a `.txt` or `.gpx` GPS trace, named after the trace file.
    Trace { path: PathBuf, mode: TransportMode },
}

impl BoundarySpec {
    /// Groups command line arguments following the OSM file into boundary specifications.
    ///
    /// Accepted arguments are any sequence of `<min_lat> <min_lon> <max_lat> <max_lon>` boxes
    /// or trace file paths, each optionally followed by `-tram`. A `-tram` directly
    /// at the start requests the whole map for trams. Without any arguments the whole
    /// map is extracted for cars.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<Self>, Error> {
        let mut specs = Vec::default();
        let mut pos = 0;

        if args.is_empty() {
            specs.push(Self::WholeMap {
                mode: TransportMode::CAR,
            });
        } else if args[0].as_ref() == "-tram" {
            specs.push(Self::WholeMap {
                mode: TransportMode::TRAM,
            });
            pos += 1;
        }

        while pos < args.len() {
            let arg = args[pos].as_ref();
            let mut spec = if arg.parse::<f64>().is_ok() {
                let bbox = parse_bbox_args(&args[pos..])?;
                pos += 4;
                Self::Box {
                    bbox,
                    mode: TransportMode::CAR,
                }
            } else {
                pos += 1;
                Self::Trace {
                    path: PathBuf::from(arg),
                    mode: TransportMode::CAR,
                }
            };

            if args.get(pos).map(|a| a.as_ref()) == Some("-tram") {
                spec.set_mode(TransportMode::TRAM);
                pos += 1;
            }

            specs.push(spec);
        }

        Ok(specs)
    }

    fn set_mode(&mut self, new_mode: TransportMode) {
        match self {
            Self::WholeMap { mode } | Self::Box { mode, .. } | Self::Trace { mode, .. } => {
                *mode = new_mode
            }
        }
    }

    /// Resolves specifications into named [Boundaries](Boundary), reading all trace files.
    /// `osm_path` is used to name whole-map boundaries.
    pub fn resolve_all(specs: &[Self], osm_path: &Path) -> Result<Vec<Boundary>, Error> {
        let mut box_counter = 0;
        specs
            .iter()
            .map(|spec| spec.resolve(osm_path, &mut box_counter))
            .collect()
    }

    fn resolve(&self, osm_path: &Path, box_counter: &mut usize) -> Result<Boundary, Error> {
        match self {
            Self::WholeMap { mode } => Ok(Boundary::whole_map(
                with_mode_suffix(file_stem(osm_path), *mode),
                *mode,
            )),

            Self::Box { bbox, mode } => {
                *box_counter += 1;
                let name = with_mode_suffix(format!("boundary{}", box_counter), *mode);
                Ok(Boundary::with_buffer(name, *bbox, MAP_BUFFER, *mode))
            }

            Self::Trace { path, mode } => {
                let t = trace::Trace::from_file(path).map_err(|source| Error::Trace {
                    path: path.clone(),
                    source,
                })?;
                log::info!(
                    "GPS trace {} covers ({}, {}) - ({}, {}) with {} points",
                    path.display(),
                    t.min_lat,
                    t.min_lon,
                    t.max_lat,
                    t.max_lon,
                    t.points,
                );
                let name = with_mode_suffix(file_stem(path), *mode);
                Ok(Boundary::with_buffer(name, t.bbox(), MAP_BUFFER, *mode))
            }
        }
    }
}

fn parse_bbox_args<S: AsRef<str>>(args: &[S]) -> Result<[f64; 4], Error> {
    if args.len() < 4 {
        return Err(Error::InvalidBoundary(format!(
            "expected 4 coordinates, got {}",
            args.len()
        )));
    }

    let mut bbox = [0.0; 4];
    for (dst, arg) in bbox.iter_mut().zip(args) {
        let arg = arg.as_ref();
        *dst = arg
            .parse()
            .map_err(|_| Error::InvalidBoundary(format!("invalid coordinate: {arg:?}")))?;
    }
    Ok(bbox)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn with_mode_suffix(name: String, mode: TransportMode) -> String {
    if mode == TransportMode::TRAM {
        name + ".tram"
    } else {
        name
    }
}
