// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;

use crate::boundary::trace::TraceError;
use crate::codec::EncodeError;

/// Error which can occur when extracting routing graphs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("can't guess the format of {0:?} - provide the file format explicitly")]
    UnknownFileFormat(PathBuf),

    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("GPS trace {path:?}: {source}")]
    Trace {
        path: PathBuf,
        #[source]
        source: TraceError,
    },

    #[error("no boundary with index {0}")]
    UnknownBoundary(usize),

    #[error("boundary {boundary:?}: way {way_id} references node {node_id} outside of the boundary")]
    MissingNode {
        boundary: String,
        way_id: i64,
        node_id: i64,
    },

    #[error("writing {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },
}
