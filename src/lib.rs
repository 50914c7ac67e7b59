/*!
`bgp-watchlist` records every BGP announcement and withdrawal, seen by public route collectors
over a period of time, whose prefix falls inside a watch-list of IP ranges.

The pipeline has four parts:

1. a [RangeSet] loaded once from a CSV watch-list ([RangeSet::load]);
2. a [StreamSource] yielding [StreamRecord]s for a time [Interval] and a set of collectors, either
   [BrokerSource] (collector archives located through the BGPKIT broker) or [FileSource] (explicit
   MRT files);
3. a [MatchExtractor] checking each announced or withdrawn prefix against the ranges and writing
   a [MatchRecord] per hit to a [MatchSink];
4. a [RetryingFetcher] restarting the whole pass from the beginning of the interval when the feed
   or the match log fails, up to a bounded number of attempts.

## Example

```no_run
use bgp_watchlist::{
    BrokerSource, FetchOutcome, FileSink, LoadOptions, RangeSet, RetryingFetcher, WatchConfig,
};

let config = WatchConfig::default();
let ranges = RangeSet::load("pakistan_ip_data_with_cidr.csv", &LoadOptions::default()).unwrap();
let sink = FileSink::new("matched_records.txt");

let mut fetcher = RetryingFetcher::new(&config, &ranges, BrokerSource::new(), sink);
match fetcher.run() {
    FetchOutcome::Succeeded { stats, .. } => println!("done: {}", stats),
    FetchOutcome::Exhausted { last_error, .. } => eprintln!("gave up: {}", last_error),
}
```

## Match log

Each match is one line, appended to the log as soon as it is found:

```text
2022-06-01 00:00:00 A 192.0.2.1 10.1.2.0/24 AS Path: 65001 65002 Next Hop: 192.0.2.254 Communities: 65001:100
```

The log is never truncated. With the default [CommitMode::Incremental], matches written by an
attempt that later fails stay in the log and are written again by the next attempt;
[CommitMode::OnSuccess] only writes the matches of the attempt that succeeds.
*/

pub mod config;
pub mod counters;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod filter;
mod io;
pub mod models;
pub mod sink;
pub mod source;
pub mod watchlist;

pub use config::WatchConfig;
pub use counters::Counters;
pub use error::{ConfigError, FeedError, PipelineError, SinkError, WatchlistError};
pub use extractor::MatchExtractor;
pub use fetcher::{FetchOutcome, FetchState, NoopSleeper, RetryingFetcher, Sleeper, ThreadSleeper};
pub use filter::{Filter, Filterable};
pub use models::{AsPath, ElemKind, IpRange, MatchRecord, StreamElement, StreamRecord};
pub use sink::{CommitMode, FileSink, MatchSink, MemorySink, OutputFormat};
pub use source::{BrokerSource, FileSource, Interval, StreamSource};
pub use watchlist::{LoadOptions, RangeSet};
