// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::{Error, Extractor};

pub(crate) mod model;
mod xml;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the file extension
    /// (for files) or the first few bytes of the content (for streams)
    #[default]
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format from the extension of a file.
    /// Returns [FileFormat::Unknown] if the extension is not recognized.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".osm") || name.ends_with(".xml") {
            Self::Xml
        } else if name.ends_with(".osm.gz") || name.ends_with(".xml.gz") {
            Self::XmlGz
        } else if name.ends_with(".osm.bz2") || name.ends_with(".xml.bz2") {
            Self::XmlBz2
        } else {
            Self::Unknown
        }
    }

    /// Guesses the format from the magic bytes at the start of the content.
    /// Anything which is neither gzip nor bzip2 is assumed to be plain XML.
    pub fn from_magic(prefix: &[u8]) -> Self {
        if prefix.starts_with(&[0x1F, 0x8B]) {
            Self::XmlGz
        } else if prefix.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Parse OSM features from a reader into all boundaries of an [Extractor].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
/// [FileFormat::Unknown] is resolved by looking at the first bytes of the stream.
pub fn add_features_from_io<R: io::Read>(
    extractor: &mut Extractor,
    file_format: FileFormat,
    reader: R,
) -> Result<(), Error> {
    let mut b = io::BufReader::new(reader);
    let file_format = match file_format {
        FileFormat::Unknown => {
            let detected = FileFormat::from_magic(b.fill_buf()?);
            log::debug!("detected input format: {detected:?}");
            detected
        }
        known => known,
    };

    match file_format {
        FileFormat::Unknown | FileFormat::Xml => extractor.add_features(xml::Reader::from_io(b)),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            extractor.add_features(xml::Reader::from_io(io::BufReader::new(d)))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            extractor.add_features(xml::Reader::from_io(io::BufReader::new(d)))
        }
    }
}

/// Parse OSM features from a file at the provided path into all boundaries of an [Extractor].
///
/// [FileFormat::Unknown] is resolved using the file extension.
pub fn add_features_from_file<P: AsRef<Path>>(
    extractor: &mut Extractor,
    file_format: FileFormat,
    path: P,
) -> Result<(), Error> {
    let path = path.as_ref();
    let file_format = match file_format {
        FileFormat::Unknown => match FileFormat::from_path(path) {
            FileFormat::Unknown => return Err(Error::UnknownFileFormat(path.to_path_buf())),
            guessed => guessed,
        },
        known => known,
    };

    log::info!("loading {}", path.display());
    let f = File::open(path)?;
    add_features_from_io(extractor, file_format, f)
}

/// Parse OSM features from a static buffer into all boundaries of an [Extractor].
pub fn add_features_from_buffer(
    extractor: &mut Extractor,
    file_format: FileFormat,
    data: &[u8],
) -> Result<(), Error> {
    let file_format = match file_format {
        FileFormat::Unknown => FileFormat::from_magic(data),
        known => known,
    };

    if file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        extractor.add_features(xml::Reader::from_buffer(data))
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let cursor = io::Cursor::new(data);
        add_features_from_io(extractor, file_format, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_path() {
        assert_eq!(FileFormat::from_path("a/monaco.osm"), FileFormat::Xml);
        assert_eq!(FileFormat::from_path("MONACO.OSM.GZ"), FileFormat::XmlGz);
        assert_eq!(FileFormat::from_path("monaco.osm.bz2"), FileFormat::XmlBz2);
        assert_eq!(FileFormat::from_path("monaco.osm.pbf"), FileFormat::Unknown);
        assert_eq!(FileFormat::from_path(""), FileFormat::Unknown);
    }

    #[test]
    fn format_from_magic() {
        assert_eq!(FileFormat::from_magic(&[0x1F, 0x8B, 0x08]), FileFormat::XmlGz);
        assert_eq!(FileFormat::from_magic(b"BZh91AY"), FileFormat::XmlBz2);
        assert_eq!(FileFormat::from_magic(b"<?xml"), FileFormat::Xml);
        assert_eq!(FileFormat::from_magic(b""), FileFormat::Xml);
    }

    #[test]
    fn unknown_file_extension() {
        let mut e = Extractor::new(Vec::default());
        let err = add_features_from_file(&mut e, FileFormat::Unknown, "planet.osm.pbf").unwrap_err();
        assert!(matches!(err, Error::UnknownFileFormat(_)));
    }
}
