//! Run configuration.
use crate::counters::DEFAULT_PROGRESS_INTERVAL;
use crate::error::ConfigError;
use crate::sink::{CommitMode, OutputFormat};
use crate::source::Interval;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Everything a watch run needs besides the watch-list itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Inclusive time range of the records to read.
    pub interval: Interval,
    /// Collectors to query through the broker.
    pub collectors: Vec<String>,
    /// Explicit MRT files, read instead of querying the broker when not empty.
    pub mrt_files: Vec<String>,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Records between two progress lines; 0 disables them.
    pub progress_interval: u64,
    /// Commit mode of sinks built with [FileSink::from_config](crate::FileSink::from_config).
    pub commit: CommitMode,
    /// Output format of sinks built with [FileSink::from_config](crate::FileSink::from_config).
    pub format: OutputFormat,
}

impl Default for WatchConfig {
    /// June 1st to October 31st 2022 on RIPE RIS `rrc26`.
    fn default() -> Self {
        WatchConfig {
            interval: Interval {
                start: 1654041600,
                end: 1667174400,
            },
            collectors: vec!["rrc26".to_string()],
            mrt_files: vec![],
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            commit: CommitMode::default(),
            format: OutputFormat::default(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Interval::new(self.interval.start, self.interval.end)?;
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.collectors.is_empty() && self.mrt_files.is_empty() {
            return Err(ConfigError::NoCollectors);
        }
        Ok(())
    }

    /// Whether records come from explicit files rather than the broker.
    pub fn uses_files(&self) -> bool {
        !self.mrt_files.is_empty()
    }
}
