/*!
Routing-record feeds.

A [StreamSource] turns a closed time interval and a set of collectors into a lazy, forward-only
sequence of [StreamRecord]s. Iteration may fail at any point; a failed sequence is not resumed,
the caller opens a new one for the same interval instead.

Two sources decode MRT data with [bgpkit_parser]:
- [BrokerSource] finds the updates files of each collector through the BGPKIT broker;
- [FileSource] reads a fixed list of local or remote MRT files.
*/
mod broker;
mod files;
mod mrt;

pub use broker::BrokerSource;
pub use files::FileSource;
pub use mrt::{FeedFile, MrtRecordStream};

use crate::error::{ConfigError, FeedError};
use crate::models::StreamRecord;
use std::fmt::{Display, Formatter};

/// A closed time range in seconds since the Unix epoch; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Result<Interval, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidInterval { start, end });
        }
        Ok(Interval { start, end })
    }

    pub fn contains(&self, ts: u64) -> bool {
        self.start <= ts && ts <= self.end
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

pub trait StreamSource {
    type Records: Iterator<Item = Result<StreamRecord, FeedError>>;

    /// Opens a new record sequence covering `interval` for the given collectors.
    fn open(
        &mut self,
        interval: &Interval,
        collectors: &[String],
    ) -> Result<Self::Records, FeedError>;
}
