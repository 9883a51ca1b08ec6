// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Binary layout of [RoutingGraphs](RoutingGraph).
//!
//! All numbers are big-endian. The file starts with a header:
//!
//! ```text
//! i32 layout flag (0 = compact, 1 = with geometry)
//! i32 node count
//! i32 edge count
//! f64 min_lat, max_lat, min_lon, max_lon
//! ```
//!
//! followed by all nodes (`i64 id, f64 lon, f64 lat, i32 outgoing count, i32[] outgoing`)
//! and all edges (`i32 max_speed, i32 car_permission, i32 lanes, i32 highway_type,
//! string name, i32 target, i32 length`). With [Layout::WithGeometry], every edge
//! is followed by `i32 count` and `count` times `f64 lon, f64 lat, i32 dist_from_start`.
//!
//! Strings are written as a `u16` byte length and [modified UTF-8] bytes,
//! which is understood by Java's `DataInput.readUTF`.
//!
//! OSM way ids and ids of between points are not stored, and are decoded as zeros.
//!
//! [modified UTF-8]: https://docs.oracle.com/javase/8/docs/api/java/io/DataInput.html#modified-utf-8

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::{BetweenPoint, RoutingEdge, RoutingGraph, RoutingNode};

/// Caps pre-allocations driven by counts read from untrusted data.
const MAX_PREALLOCATION: usize = 1 << 16;

/// Selects which parts of a [RoutingGraph] are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Nodes and edges without between points.
    Compact,

    /// Nodes and edges with between points.
    WithGeometry,
}

impl Layout {
    pub fn flag(self) -> i32 {
        match self {
            Self::Compact => 0,
            Self::WithGeometry => 1,
        }
    }

    pub fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            0 => Some(Self::Compact),
            1 => Some(Self::WithGeometry),
            _ => None,
        }
    }

    /// Name of the file with a graph of a boundary, e.g. `berlin.routing.graph.small`.
    pub fn file_name(self, boundary_name: &str) -> String {
        let suffix = match self {
            Self::Compact => "small",
            Self::WithGeometry => "large",
        };
        format!("{boundary_name}.routing.graph.{suffix}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("{what} {value} does not fit in a 32-bit integer")]
    TooLarge { what: &'static str, value: u64 },

    #[error("string of {0} bytes is too long (max 65535 bytes)")]
    StringTooLong(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("unknown layout flag: {0}")]
    UnknownLayout(i32),

    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: i64 },

    #[error("invalid modified UTF-8 string")]
    InvalidString,
}

/// Writes a [RoutingGraph] in the provided [Layout].
pub fn encode<W: Write>(w: &mut W, g: &RoutingGraph, layout: Layout) -> Result<(), EncodeError> {
    write_i32(w, layout.flag())?;
    write_i32(w, to_i32("node count", g.nodes.len())?)?;
    write_i32(w, to_i32("edge count", g.edges.len())?)?;
    for x in [g.min_lat, g.max_lat, g.min_lon, g.max_lon] {
        write_f64(w, x)?;
    }

    for n in &g.nodes {
        w.write_all(&n.id.to_be_bytes())?;
        write_f64(w, n.lon)?;
        write_f64(w, n.lat)?;
        write_i32(w, to_i32("outgoing edge count", n.outgoing.len())?)?;
        for &e in &n.outgoing {
            write_i32(w, to_i32("edge index", e)?)?;
        }
    }

    for e in &g.edges {
        write_i32(w, e.max_speed)?;
        write_i32(w, e.car_permission as i32)?;
        write_i32(w, to_i32("lane count", e.lanes as usize)?)?;
        write_i32(w, e.highway_type)?;
        write_modified_utf8(w, &e.name)?;
        write_i32(w, to_i32("target node index", e.target)?)?;
        write_i32(w, e.length)?;

        if layout == Layout::WithGeometry {
            write_i32(w, to_i32("between point count", e.between.len())?)?;
            for p in &e.between {
                write_f64(w, p.lon)?;
                write_f64(w, p.lat)?;
                write_i32(w, p.dist_from_start)?;
            }
        }
    }

    Ok(())
}

/// Encodes a [RoutingGraph] into a new buffer.
pub fn to_bytes(g: &RoutingGraph, layout: Layout) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::default();
    encode(&mut buf, g, layout)?;
    Ok(buf)
}

/// Writes a [RoutingGraph] into a file, replacing it if it already exists.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    g: &RoutingGraph,
    layout: Layout,
) -> Result<(), EncodeError> {
    let mut w = BufWriter::new(File::create(path)?);
    encode(&mut w, g, layout)?;
    w.flush()?;
    Ok(())
}

/// Reads a [RoutingGraph], returning it together with the [Layout] it was stored in.
pub fn decode<R: Read>(r: &mut R) -> Result<(RoutingGraph, Layout), DecodeError> {
    let flag = read_i32(r)?;
    let layout = Layout::from_flag(flag).ok_or(DecodeError::UnknownLayout(flag))?;
    let node_count = read_count(r, "node count")?;
    let edge_count = read_count(r, "edge count")?;

    let mut g = RoutingGraph {
        nodes: Vec::with_capacity(node_count.min(MAX_PREALLOCATION)),
        edges: Vec::with_capacity(edge_count.min(MAX_PREALLOCATION)),
        min_lat: read_f64(r)?,
        max_lat: read_f64(r)?,
        min_lon: read_f64(r)?,
        max_lon: read_f64(r)?,
    };

    for _ in 0..node_count {
        let id = read_i64(r)?;
        let lon = read_f64(r)?;
        let lat = read_f64(r)?;
        let outgoing_count = read_count(r, "outgoing edge count")?;
        let mut outgoing = Vec::with_capacity(outgoing_count.min(MAX_PREALLOCATION));
        for _ in 0..outgoing_count {
            outgoing.push(read_index(r, "edge index", edge_count)?);
        }
        g.nodes.push(RoutingNode {
            id,
            lon,
            lat,
            outgoing,
        });
    }

    for _ in 0..edge_count {
        let max_speed = read_i32(r)?;
        let car_permission = match read_i32(r)? {
            p @ 0..=2 => p as u8,
            p => {
                return Err(DecodeError::InvalidValue {
                    what: "car permission",
                    value: p as i64,
                })
            }
        };
        let lanes = read_count(r, "lane count")? as u32;
        let highway_type = read_i32(r)?;
        let name = read_modified_utf8(r)?;
        let target = read_index(r, "target node index", node_count)?;
        let length = read_i32(r)?;

        let mut between = Vec::default();
        if layout == Layout::WithGeometry {
            let count = read_count(r, "between point count")?;
            between.reserve(count.min(MAX_PREALLOCATION));
            for _ in 0..count {
                between.push(BetweenPoint {
                    lon: read_f64(r)?,
                    lat: read_f64(r)?,
                    id: 0,
                    dist_from_start: read_i32(r)?,
                });
            }
        }

        g.edges.push(RoutingEdge {
            way_id: 0,
            max_speed,
            car_permission,
            lanes,
            highway_type,
            name,
            target,
            length,
            between,
        });
    }

    Ok((g, layout))
}

/// Reads a [RoutingGraph] from a file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<(RoutingGraph, Layout), DecodeError> {
    let mut r = BufReader::new(File::open(path)?);
    decode(&mut r)
}

fn to_i32(what: &'static str, value: usize) -> Result<i32, EncodeError> {
    i32::try_from(value).map_err(|_| EncodeError::TooLarge {
        what,
        value: value as u64,
    })
}

fn write_i32<W: Write>(w: &mut W, x: i32) -> io::Result<()> {
    w.write_all(&x.to_be_bytes())
}

fn write_f64<W: Write>(w: &mut W, x: f64) -> io::Result<()> {
    w.write_all(&x.to_be_bytes())
}

fn write_modified_utf8<W: Write>(w: &mut W, s: &str) -> Result<(), EncodeError> {
    let encoded = encode_modified_utf8(s);
    let len = u16::try_from(encoded.len()).map_err(|_| EncodeError::StringTooLong(encoded.len()))?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(&encoded)?;
    Ok(())
}

/// Encodes a string as modified UTF-8: NUL is written as two bytes, and characters
/// outside of the Basic Multilingual Plane as two 3-byte encoded surrogates.
fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => buf.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                buf.push(0xC0 | (unit >> 6) as u8);
                buf.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                buf.push(0xE0 | (unit >> 12) as u8);
                buf.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                buf.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    buf
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> {
    read_array(r).map(i32::from_be_bytes)
}

fn read_i64<R: Read>(r: &mut R) -> io::Result<i64> {
    read_array(r).map(i64::from_be_bytes)
}

fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    read_array(r).map(f64::from_be_bytes)
}

fn read_count<R: Read>(r: &mut R, what: &'static str) -> Result<usize, DecodeError> {
    let x = read_i32(r)?;
    usize::try_from(x).map_err(|_| DecodeError::InvalidValue {
        what,
        value: x as i64,
    })
}

fn read_index<R: Read>(r: &mut R, what: &'static str, len: usize) -> Result<usize, DecodeError> {
    let idx = read_count(r, what)?;
    if idx < len {
        Ok(idx)
    } else {
        Err(DecodeError::InvalidValue {
            what,
            value: idx as i64,
        })
    }
}

fn read_modified_utf8<R: Read>(r: &mut R) -> Result<String, DecodeError> {
    let len = u16::from_be_bytes(read_array(r)?) as usize;
    let mut buf = vec![0; len];
    r.read_exact(&mut buf)?;
    decode_modified_utf8(&buf).ok_or(DecodeError::InvalidString)
}

/// Decodes modified UTF-8. Only the shortest forms (as produced by [encode_modified_utf8])
/// are accepted: raw NUL bytes and overlong sequences are rejected.
fn decode_modified_utf8(data: &[u8]) -> Option<String> {
    let continuation = |b: Option<&u8>| b.filter(|&&b| b & 0xC0 == 0x80).map(|&b| (b & 0x3F) as u16);

    let mut units: Vec<u16> = Vec::with_capacity(data.len());
    let mut bytes = data.iter();
    while let Some(&b) = bytes.next() {
        let unit = if b & 0x80 == 0 {
            if b == 0 {
                return None;
            }
            b as u16
        } else if b & 0xE0 == 0xC0 {
            let unit = ((b & 0x1F) as u16) << 6 | continuation(bytes.next())?;
            if unit != 0 && unit < 0x80 {
                return None;
            }
            unit
        } else if b & 0xF0 == 0xE0 {
            let hi = continuation(bytes.next())?;
            let lo = continuation(bytes.next())?;
            let unit = ((b & 0x0F) as u16) << 12 | hi << 6 | lo;
            if unit < 0x800 {
                return None;
            }
            unit
        } else {
            return None;
        };
        units.push(unit);
    }

    String::from_utf16(&units).ok()
}
