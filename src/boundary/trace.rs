// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Readers for GPS traces, used to infer [boundaries](crate::Boundary) covering a recorded trip.
//!
//! Two formats are supported:
//! - plain text (`.txt`), with a 3-line header followed by `timestamp,lat,lon` rows,
//! - [GPX](https://www.topografix.com/gpx.asp) (`.gpx`), reading `trkpt` elements of the first track.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::str::from_utf8;

/// Error which can occur when reading a GPS trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unsupported trace file extension (supported: .txt and .gpx)")]
    UnknownFormat,

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("invalid GPX timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("trace has no points")]
    Empty,
}

/// Summary of a GPS trace: the extent of all its points.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,

    /// Number of track points read
    pub points: u64,

    /// Reference timestamp of the trace, in milliseconds since the Unix epoch
    /// for GPX files, or as declared in the header of text files. Zero if unknown.
    pub ref_timestamp: i64,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            min_lat: f64::MAX,
            min_lon: f64::MAX,
            max_lat: -f64::MAX,
            max_lon: -f64::MAX,
            points: 0,
            ref_timestamp: 0,
        }
    }
}

impl Trace {
    /// Reads a trace from a file, picking the format by the (case-insensitive) extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Self::from_text(io::BufReader::new(File::open(path)?)),
            "gpx" => Self::from_gpx(io::BufReader::new(File::open(path)?)),
            _ => Err(TraceError::UnknownFormat),
        }
    }

    /// Returns the extent as `[min_lat, min_lon, max_lat, max_lon]`.
    pub fn bbox(&self) -> [f64; 4] {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
    }

    fn add_point(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lat = self.max_lat.max(lat);
        self.max_lon = self.max_lon.max(lon);
        self.points += 1;
    }

    fn non_empty(self) -> Result<Self, TraceError> {
        if self.points == 0 {
            Err(TraceError::Empty)
        } else {
            Ok(self)
        }
    }

    /// Reads a plain text trace:
    ///
    /// ```text
    /// #3
    /// #all Tstamps substracted by 1349194636000
    /// #timestamp,latitude,longitude
    /// 0,51.1527874,7.0117601
    /// 1000,51.1528012,7.0118544
    /// 2000,51.1528467,7.0119815
    /// ```
    ///
    /// Malformed header lines and rows are logged and skipped.
    pub fn from_text<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        let mut t = Self::default();
        let mut declared_points = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            match line_no {
                0 => {
                    declared_points = line.strip_prefix('#').and_then(|n| n.parse::<u64>().ok());
                    if declared_points.is_none() {
                        log::warn!("GPS trace: number of points couldn't be read from {line:?}");
                    }
                }

                1 => match parse_timestamp_header(&line) {
                    Some(ts) => t.ref_timestamp = ts,
                    None => log::warn!("GPS trace: reference timestamp couldn't be read from {line:?}"),
                },

                // Column description
                2 => {}

                _ => match parse_text_point(&line) {
                    Some((lat, lon)) => t.add_point(lat, lon),
                    None => log::warn!("GPS trace: {line:?} doesn't match the point format"),
                },
            }
        }

        if let Some(declared) = declared_points {
            if declared != t.points {
                log::warn!(
                    "GPS trace: header declares {declared} points, but {} were read",
                    t.points
                );
            }
        }

        t.non_empty()
    }

    /// Reads a GPX trace, considering all `trkpt` elements of the first `trk`.
    pub fn from_gpx<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        use quick_xml::events::Event;

        let mut parser = quick_xml::Reader::from_reader(reader);
        let mut buf = Vec::default();
        let mut t = Self::default();
        let mut in_metadata = false;
        let mut in_metadata_time = false;

        loop {
            match parser.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"metadata" => in_metadata = true,
                    b"time" if in_metadata => in_metadata_time = true,
                    b"trkpt" => {
                        let (lat, lon) = parse_trkpt(&e)?;
                        t.add_point(lat, lon);
                    }
                    _ => {}
                },

                Event::Empty(e) => {
                    if e.local_name().as_ref() == b"trkpt" {
                        let (lat, lon) = parse_trkpt(&e)?;
                        t.add_point(lat, lon);
                    }
                }

                Event::Text(text) if in_metadata_time => {
                    let text = String::from_utf8_lossy(&text);
                    t.ref_timestamp = parse_gpx_time(text.trim())?;
                }

                Event::End(e) => match e.local_name().as_ref() {
                    b"trk" => break,
                    b"metadata" => in_metadata = false,
                    b"time" => in_metadata_time = false,
                    _ => {}
                },

                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        t.non_empty()
    }
}

fn parse_timestamp_header(line: &str) -> Option<i64> {
    const PREFIX: &str = "#all tstamps substracted by ";
    let prefix = line.get(..PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(PREFIX) {
        line[PREFIX.len()..].trim().parse().ok()
    } else {
        None
    }
}

fn parse_text_point(line: &str) -> Option<(f64, f64)> {
    let mut fields = line.split(',');
    let timestamp = fields.next()?;
    let lat = fields.next()?.trim().parse().ok()?;
    let lon = fields.next()?.trim().parse().ok()?;

    if timestamp.trim().is_empty() || fields.next().is_some() {
        None
    } else {
        Some((lat, lon))
    }
}

fn parse_trkpt(e: &quick_xml::events::BytesStart<'_>) -> Result<(f64, f64), TraceError> {
    let mut lat = 0.0;
    let mut lon = 0.0;

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"lat" => lat = parse_number(&attr.value)?,
            b"lon" => lon = parse_number(&attr.value)?,
            _ => {}
        }
    }

    Ok((lat, lon))
}

fn parse_number(raw: &[u8]) -> Result<f64, TraceError> {
    let s = from_utf8(raw)
        .map_err(|_| TraceError::InvalidNumber(String::from_utf8_lossy(raw).into_owned()))?;
    s.trim()
        .parse()
        .map_err(|_| TraceError::InvalidNumber(s.to_string()))
}

fn parse_gpx_time(s: &str) -> Result<i64, TraceError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| TraceError::InvalidTimestamp(s.to_string()))
}
