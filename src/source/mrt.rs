//! Lazy decoding of a list of MRT files into [StreamRecord]s.
use crate::error::FeedError;
use crate::models::{AsHop, AsPath, ElemKind, StreamElement, StreamRecord};
use crate::source::Interval;
use bgpkit_parser::error::{ParserError, ParserErrorWithBytes};
use bgpkit_parser::models::{AsPath as BgpAsPath, AsPathSegment, BgpElem, ElemType, MrtRecord};
use bgpkit_parser::{BgpkitParser, Elementor};
use log::{info, warn};
use std::collections::VecDeque;

/// One MRT data file to read, local path or URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFile {
    pub collector: String,
    pub url: String,
}

type RawRecords = Box<dyn Iterator<Item = Result<MrtRecord, ParserErrorWithBytes>>>;

struct OpenFile {
    url: String,
    records: RawRecords,
    elementor: Elementor,
}

/// Iterator over the records of a list of MRT files, read one after the other.
///
/// Files are opened only when the previous one is exhausted. Records outside the interval are
/// dropped. Malformed records are skipped with a warning; an I/O failure ends the sequence with
/// a [FeedError::Read].
pub struct MrtRecordStream {
    files: VecDeque<FeedFile>,
    interval: Interval,
    current: Option<OpenFile>,
}

impl MrtRecordStream {
    pub fn new(files: Vec<FeedFile>, interval: Interval) -> Self {
        MrtRecordStream {
            files: files.into(),
            interval,
            current: None,
        }
    }

    /// Number of files not yet opened.
    pub fn remaining_files(&self) -> usize {
        self.files.len()
    }

    fn open_next(&mut self) -> Option<Result<(), FeedError>> {
        let file = self.files.pop_front()?;
        info!("reading {} file {}", file.collector, file.url);
        match BgpkitParser::new(file.url.as_str()) {
            Ok(parser) => {
                self.current = Some(OpenFile {
                    records: Box::new(parser.disable_warnings().into_fallible_record_iter()),
                    elementor: Elementor::new(),
                    url: file.url,
                });
                Some(Ok(()))
            }
            Err(e) => {
                self.files.clear();
                Some(Err(FeedError::Open {
                    url: file.url,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

impl Iterator for MrtRecordStream {
    type Item = Result<StreamRecord, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                if let Err(e) = self.open_next()? {
                    return Some(Err(e));
                }
            }
            let open = self.current.as_mut()?;

            match open.records.next() {
                None => {
                    self.current = None;
                }
                Some(Ok(record)) => {
                    let timestamp = u64::from(record.common_header.timestamp);
                    // every record goes through the elementor so peer index tables are kept
                    let elems = open.elementor.record_to_elems(record);
                    if !self.interval.contains(timestamp) {
                        continue;
                    }
                    let elements = elems.into_iter().map(to_stream_element).collect();
                    return Some(Ok(StreamRecord::new(timestamp, elements)));
                }
                Some(Err(e)) => match e.error {
                    ParserError::IoError(err) | ParserError::EofError(err) => {
                        let url = open.url.clone();
                        self.current = None;
                        self.files.clear();
                        return Some(Err(FeedError::Read {
                            url,
                            reason: err.to_string(),
                        }));
                    }
                    other => {
                        warn!("skipping malformed record in {}: {}", open.url, other);
                    }
                },
            }
        }
    }
}

/// Converts a bgpkit-parser element into the feed-independent element model.
pub(crate) fn to_stream_element(elem: BgpElem) -> StreamElement {
    let kind = match elem.elem_type {
        ElemType::ANNOUNCE => ElemKind::Announce,
        ElemType::WITHDRAW => ElemKind::Withdraw,
    };
    let as_path = elem.as_path.as_ref().map(to_as_path);
    let communities = elem
        .communities
        .as_ref()
        .map(|cs| cs.iter().map(|c| c.to_string()).collect());

    StreamElement {
        kind,
        peer_address: elem.peer_ip,
        peer_asn: Some(u32::from(elem.peer_asn)),
        prefix: elem.prefix.prefix.to_string(),
        as_path,
        next_hop: elem.next_hop,
        communities,
    }
}

/// Flattens the segments of a bgpkit AS path; confederation segments are kept in place.
fn to_as_path(path: &BgpAsPath) -> AsPath {
    let mut hops = vec![];
    for segment in path.iter_segments() {
        match segment {
            AsPathSegment::AsSequence(asns) | AsPathSegment::ConfedSequence(asns) => {
                hops.extend(asns.iter().map(|asn| AsHop::Asn(u32::from(*asn))));
            }
            AsPathSegment::AsSet(asns) | AsPathSegment::ConfedSet(asns) => {
                hops.push(AsHop::Set(asns.iter().map(|asn| u32::from(*asn)).collect()));
            }
        }
    }
    AsPath { hops }
}
