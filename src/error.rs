/*!
error module defines the error types used in bgp-watchlist.
*/
use std::io;
use thiserror::Error;

/// Errors raised while loading a watch-list into a [RangeSet](crate::RangeSet).
#[derive(Debug, Error)]
pub enum WatchlistError {
    /// The watch-list source could not be opened.
    ///
    /// ## Occurs during:
    ///  - Opening a local, remote or compressed watch-list file
    #[error("cannot open watch-list {path}: {reason}")]
    Open { path: String, reason: String },
    /// The table itself is malformed (unbalanced quotes, unreadable bytes, ...).
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// A column required by the load options is not in the header row.
    #[error("watch-list has no column named {0:?}")]
    MissingColumn(String),
    /// A row's CIDR field cannot be parsed as an address block.
    ///
    /// Rows are numbered from 1, excluding the header row.
    #[error("row {row}: cannot parse CIDR from {value:?}")]
    InvalidCidr { row: usize, value: String },
    /// A row's start/end pair is not a valid address range.
    #[error("row {row}: invalid address range {start:?} - {end:?}")]
    InvalidRange {
        row: usize,
        start: String,
        end: String,
    },
}

/// Transient failures of the routing-record feed.
///
/// Any of these ends the current attempt and makes the fetcher restart the whole pass.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The broker index could not be queried.
    #[error("broker query failed: {0}")]
    Broker(String),
    /// A data file could not be opened.
    #[error("cannot open {url}: {reason}")]
    Open { url: String, reason: String },
    /// Reading a data file failed part way through.
    #[error("read failure in {url}: {reason}")]
    Read { url: String, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Failures writing to the match log.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("cannot encode match record: {0}")]
    Encode(#[from] serde_json::Error),
    /// A record was appended outside of an attempt.
    #[error("match log is not open for writing")]
    NotOpen,
}

/// The reasons a single pass over the feed can fail.
///
/// This is the typed result inspected by the [RetryingFetcher](crate::RetryingFetcher).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Invalid run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("start time {start} is after end time {end}")]
    InvalidInterval { start: u64, end: u64 },
    #[error("at least one collector is required")]
    NoCollectors,
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
    #[error("cannot parse {filter_type} filter from {value:?}")]
    InvalidFilter { filter_type: String, value: String },
}
