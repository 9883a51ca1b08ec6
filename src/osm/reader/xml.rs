// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::{from_utf8, FromStr};

use super::model;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<quick_xml::events::Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<quick_xml::events::Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<quick_xml::events::Event<'b>> {
        self.0.read_event()
    }
}

/// Reader reads osm [Features](model::Feature) from an XML file,
/// in document order. Reading stops at the first `relation` element.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e));
                }
            };

            match event {
                quick_xml::events::Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(&start) {
                            return Some(Ok(model::Feature::Node(n)));
                        }
                    }
                    b"bounds" => {
                        if let Some(b) = parse_bounds(&start) {
                            return Some(Ok(model::Feature::Bounds(b)));
                        }
                    }
                    b"tag" => {
                        if let Some(tags) = feature_tags(&mut f) {
                            if let Some((k, v)) = parse_tag(&start) {
                                tags.insert(k, v);
                            }
                        }
                    }
                    b"nd" => {
                        if let Some(nodes) = feature_nodes(&mut f) {
                            if let Some(ref_) = parse_nd(&start) {
                                nodes.push(ref_);
                            }
                        }
                    }
                    b"relation" => self.eof = true,
                    _ => {}
                },

                quick_xml::events::Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => f = parse_node(&start).map(model::Feature::Node),
                    b"way" => f = parse_way(&start).map(model::Feature::Way),
                    b"relation" => self.eof = true,
                    // "tag", "nd" and "bounds" must be self-closing
                    _ => {}
                },

                quick_xml::events::Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                quick_xml::events::Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        f.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

/// Parses an attribute value, logging values which can't be parsed.
fn parse_attr<T: FromStr>(element: &str, key: &str, raw: &[u8]) -> Option<T> {
    let parsed = from_utf8(raw).ok().and_then(|s| s.parse().ok());
    if parsed.is_none() {
        log::warn!(
            "invalid {element} {key}={:?}",
            String::from_utf8_lossy(raw)
        );
    }
    parsed
}

fn parse_node(start: &quick_xml::events::BytesStart<'_>) -> Option<model::Node> {
    let mut id: i64 = 0;
    let mut lat = f64::NAN;
    let mut lon = f64::NAN;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = parse_attr("node", "id", &attr.value)?,
            b"lat" => lat = parse_attr("node", "lat", &attr.value)?,
            b"lon" => lon = parse_attr("node", "lon", &attr.value)?,
            _ => {}
        }
    }

    if id != 0 && lat.is_finite() && lon.is_finite() {
        Some(model::Node { id, lat, lon })
    } else {
        log::warn!("skipping node {id} without a valid position");
        None
    }
}

fn parse_bounds(start: &quick_xml::events::BytesStart<'_>) -> Option<model::Bounds> {
    let mut b = model::Bounds {
        min_lat: f64::NAN,
        min_lon: f64::NAN,
        max_lat: f64::NAN,
        max_lon: f64::NAN,
    };

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"minlat" => b.min_lat = parse_attr("bounds", "minlat", &attr.value)?,
            b"minlon" => b.min_lon = parse_attr("bounds", "minlon", &attr.value)?,
            b"maxlat" => b.max_lat = parse_attr("bounds", "maxlat", &attr.value)?,
            b"maxlon" => b.max_lon = parse_attr("bounds", "maxlon", &attr.value)?,
            _ => {}
        }
    }

    if [b.min_lat, b.min_lon, b.max_lat, b.max_lon]
        .iter()
        .all(|x| x.is_finite())
    {
        Some(b)
    } else {
        None
    }
}

fn parse_way(start: &quick_xml::events::BytesStart<'_>) -> Option<model::Way> {
    let mut id: i64 = 0;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"id" {
            id = parse_attr("way", "id", &attr.value)?;
        }
    }

    if id != 0 {
        Some(model::Way {
            id,
            nodes: Vec::default(),
            tags: HashMap::default(),
        })
    } else {
        None
    }
}

fn parse_tag(start: &quick_xml::events::BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"k" => k = attr.unescape_value().ok().map(|s| s.into_owned()),
            b"v" => v = attr.unescape_value().ok().map(|s| s.into_owned()),
            _ => {}
        }
    }

    k.map(|k| (k, v.unwrap_or_default()))
}

fn parse_nd(start: &quick_xml::events::BytesStart<'_>) -> Option<i64> {
    let mut ref_: i64 = 0;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"ref" {
            ref_ = parse_attr("nd", "ref", &attr.value)?;
        }
    }

    if ref_ != 0 {
        Some(ref_)
    } else {
        None
    }
}

fn feature_tags(f: &mut Option<model::Feature>) -> Option<&mut HashMap<String, String>> {
    match f {
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.tags),
        _ => None,
    }
}

fn feature_nodes(f: &mut Option<model::Feature>) -> Option<&mut Vec<i64>> {
    match f {
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.nodes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::model::{Bounds, Feature, Node, Way};
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    const SIMPLE_XML: &[u8] = include_bytes!("test_fixtures/simple.osm");

    fn get_expected_features() -> Vec<Feature> {
        vec![
            Feature::Bounds(Bounds {
                min_lat: 0.0,
                min_lon: 0.0,
                max_lat: 0.003,
                max_lon: 0.004,
            }),
            Feature::Node(Node {
                id: -1,
                lat: 0.0,
                lon: 0.0,
            }),
            Feature::Node(Node {
                id: -2,
                lat: 0.0,
                lon: 0.001,
            }),
            Feature::Node(Node {
                id: -3,
                lat: 0.0,
                lon: 0.002,
            }),
            Feature::Node(Node {
                id: -4,
                lat: 0.0,
                lon: 0.003,
            }),
            Feature::Node(Node {
                id: -5,
                lat: 0.001,
                lon: 0.001,
            }),
            Feature::Node(Node {
                id: -6,
                lat: 0.002,
                lon: 0.001,
            }),
            Feature::Node(Node {
                id: -7,
                lat: 0.003,
                lon: 0.004,
            }),
            Feature::Way(Way {
                id: -100,
                nodes: vec![-1, -2, -3, -4],
                tags: tags! {"highway": "residential", "lanes": "2", "name": "Main & Co"},
            }),
            Feature::Way(Way {
                id: -101,
                nodes: vec![-2, -5, -6],
                tags: tags! {"highway": "tertiary", "oneway": "yes"},
            }),
            Feature::Way(Way {
                id: -102,
                nodes: vec![-4, -7],
                tags: tags! {"highway": "service"},
            }),
        ]
    }

    fn collect_all<I: Iterator<Item = Result<Feature, quick_xml::Error>>>(
        features: I,
    ) -> Result<Vec<Feature>, quick_xml::Error> {
        features.collect()
    }

    #[test]
    fn parse_from_buf() -> Result<(), quick_xml::Error> {
        let features = collect_all(Reader::from_buffer(SIMPLE_XML))?;
        assert_eq!(features, get_expected_features());
        Ok(())
    }

    #[test]
    fn parse_from_io() -> Result<(), quick_xml::Error> {
        let features = collect_all(Reader::from_io(io::Cursor::new(SIMPLE_XML)))?;
        assert_eq!(features, get_expected_features());
        Ok(())
    }

    #[test]
    fn skips_malformed_nodes() -> Result<(), quick_xml::Error> {
        const DATA: &[u8] = br#"<osm>
            <node id="1" lat="north" lon="7.0"/>
            <node id="2" lat="51.0" lon="7.0"/>
        </osm>"#;
        let features = collect_all(Reader::from_buffer(DATA))?;
        assert_eq!(
            features,
            vec![Feature::Node(Node {
                id: 2,
                lat: 51.0,
                lon: 7.0
            })]
        );
        Ok(())
    }

    #[test]
    fn malformed_xml_is_an_error() {
        const DATA: &[u8] = b"<osm><node id=\"1\" lat=\"51.0\" lon=\"7.0\"></way></osm>";
        assert!(collect_all(Reader::from_buffer(DATA)).is_err());
    }
}
