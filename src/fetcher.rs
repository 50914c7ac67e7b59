/*!
Bounded retries of a whole pass over the feed.

One attempt opens a new record sequence for the configured interval and collectors, drains it
through the [MatchExtractor] into the [MatchSink], and ends. Any failure, whether opening the
feed, reading it, or writing a match, abandons the attempt: the fetcher waits for the retry delay
and starts over from the beginning of the interval, until the attempt limit is reached.

```text
Idle -> Attempting(1) -> Succeeded
            |
            +-- failure --> Attempting(2) -> ... -> Attempting(max) -- failure --> Exhausted
```

Exhaustion is reported in the returned [FetchOutcome], never as a panic or error.
*/
use crate::config::WatchConfig;
use crate::counters::Counters;
use crate::error::PipelineError;
use crate::extractor::MatchExtractor;
use crate::filter::Filter;
use crate::sink::MatchSink;
use crate::source::StreamSource;
use crate::watchlist::RangeSet;
use log::{error, info, warn};
use std::time::Duration;

/// Sleeping between attempts, injectable for tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper blocking the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper returning immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    /// Running the given attempt, numbered from 1.
    Attempting(u32),
    Succeeded,
    Exhausted,
}

/// Final result of [RetryingFetcher::run].
#[derive(Debug)]
pub enum FetchOutcome {
    /// An attempt drained the whole feed; `stats` are the totals of that attempt.
    Succeeded { attempt: u32, stats: Counters },
    /// Every attempt failed.
    Exhausted {
        attempts: u32,
        last_error: PipelineError,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Succeeded { .. })
    }
}

pub struct RetryingFetcher<'a, S, K, Z = ThreadSleeper> {
    config: &'a WatchConfig,
    ranges: &'a RangeSet,
    filters: &'a [Filter],
    source: S,
    sink: K,
    sleeper: Z,
    state: FetchState,
}

impl<'a, S, K> RetryingFetcher<'a, S, K, ThreadSleeper>
where
    S: StreamSource,
    K: MatchSink,
{
    pub fn new(config: &'a WatchConfig, ranges: &'a RangeSet, source: S, sink: K) -> Self {
        RetryingFetcher {
            config,
            ranges,
            filters: &[],
            source,
            sink,
            sleeper: ThreadSleeper,
            state: FetchState::Idle,
        }
    }
}

impl<'a, S, K, Z> RetryingFetcher<'a, S, K, Z>
where
    S: StreamSource,
    K: MatchSink,
    Z: Sleeper,
{
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> RetryingFetcher<'a, S, K, Z2> {
        RetryingFetcher {
            config: self.config,
            ranges: self.ranges,
            filters: self.filters,
            source: self.source,
            sink: self.sink,
            sleeper,
            state: self.state,
        }
    }

    pub fn with_filters(mut self, filters: &'a [Filter]) -> Self {
        self.filters = filters;
        self
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Runs attempts until one succeeds or the attempt limit is reached.
    pub fn run(&mut self) -> FetchOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.state = FetchState::Attempting(attempt);
            info!("Attempt {} to fetch BGP data", attempt);

            match self.attempt(attempt) {
                Ok(stats) => {
                    self.state = FetchState::Succeeded;
                    stats.log_totals();
                    return FetchOutcome::Succeeded { attempt, stats };
                }
                Err(e) => {
                    error!(
                        "Error: {}. Retrying... ({}/{})",
                        e, attempt, max_attempts
                    );
                    if attempt >= max_attempts {
                        self.state = FetchState::Exhausted;
                        error!("Max retries reached. Exiting.");
                        return FetchOutcome::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        };
                    }
                    self.sleeper.sleep(self.config.retry_delay);
                    attempt += 1;
                }
            }
        }
    }

    /// One full pass: open, drain, release the sink.
    fn attempt(&mut self, attempt: u32) -> Result<Counters, PipelineError> {
        let mut counters = Counters::new(self.config.progress_interval);
        self.sink.begin_attempt(attempt)?;

        let result = self
            .source
            .open(&self.config.interval, &self.config.collectors)
            .map_err(PipelineError::from)
            .and_then(|records| {
                MatchExtractor::new(self.ranges)
                    .with_filters(self.filters)
                    .process(records, &mut self.sink, &mut counters)
            });

        match result {
            Ok(()) => {
                self.sink.end_attempt(true)?;
                Ok(counters)
            }
            Err(e) => {
                if let Err(release) = self.sink.end_attempt(false) {
                    warn!("cannot release match log: {}", release);
                }
                info!("attempt {} abandoned after {}", attempt, counters);
                Err(e)
            }
        }
    }
}
