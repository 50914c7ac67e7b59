/*!
Matching of stream elements against the watch-list.

For each record, every element is counted; announcements and withdrawals that pass the optional
[Filter]s have their prefix parsed and looked up in the [RangeSet]. A prefix inside several
ranges is recorded once, attributed to the first range in load order. Elements whose prefix
cannot be parsed are skipped: malformed prefixes do occur in real feeds.
*/
use crate::counters::Counters;
use crate::error::PipelineError;
use crate::filter::{Filter, Filterable};
use crate::models::{MatchRecord, StreamElement, StreamRecord};
use crate::sink::MatchSink;
use crate::watchlist::{parse_prefix, RangeSet};
use crate::FeedError;
use log::{debug, info};

/// Matches stream elements against a [RangeSet].
pub struct MatchExtractor<'a> {
    ranges: &'a RangeSet,
    filters: &'a [Filter],
}

impl<'a> MatchExtractor<'a> {
    pub fn new(ranges: &'a RangeSet) -> Self {
        MatchExtractor {
            ranges,
            filters: &[],
        }
    }

    pub fn with_filters(mut self, filters: &'a [Filter]) -> Self {
        self.filters = filters;
        self
    }

    /// Returns the match record for `elem`, if it is an update inside the watch-list.
    pub fn match_element(&self, timestamp: u64, elem: &StreamElement) -> Option<MatchRecord> {
        if !elem.kind.is_update() || !elem.match_filters(self.filters) {
            return None;
        }
        let Some(prefix) = parse_prefix(&elem.prefix) else {
            debug!("skipping unparsable prefix {:?}", elem.prefix);
            return None;
        };
        let range = self.ranges.contains(&prefix)?;
        Some(MatchRecord {
            timestamp,
            kind: elem.kind,
            peer_address: elem.peer_address,
            peer_asn: elem.peer_asn,
            prefix,
            as_path: elem.as_path.clone(),
            next_hop: elem.next_hop,
            communities: elem.communities.clone(),
            range: *range,
        })
    }

    /// Processes one record: counts it and its elements, and appends its matches to `sink`.
    pub fn process_record<S: MatchSink + ?Sized>(
        &self,
        record: &StreamRecord,
        sink: &mut S,
        counters: &mut Counters,
    ) -> Result<(), PipelineError> {
        counters.record_seen();
        for elem in &record.elements {
            counters.element_seen();
            if let Some(matched) = self.match_element(record.timestamp, elem) {
                sink.append(&matched)?;
                counters.match_found();
                info!("Match found: {} (range {})", matched, matched.range);
            }
        }
        Ok(())
    }

    /// Drains `records` to the end, or to the first feed or sink failure.
    pub fn process<I, S>(
        &self,
        records: I,
        sink: &mut S,
        counters: &mut Counters,
    ) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = Result<StreamRecord, FeedError>>,
        S: MatchSink + ?Sized,
    {
        info!("Processing BGP records");
        for record in records {
            self.process_record(&record?, sink, counters)?;
        }
        Ok(())
    }
}
