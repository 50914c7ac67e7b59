//! Running totals of one attempt over the feed.
use log::info;
use std::fmt::{Display, Formatter};

/// Default number of records between two progress lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Records, elements and matches seen during one attempt.
///
/// A fresh value is created at the start of every attempt and threaded through the extractor;
/// totals of abandoned attempts are not carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub records: u64,
    pub elements: u64,
    pub matches: u64,
    progress_interval: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Counters::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

impl Counters {
    /// Creates zeroed counters logging progress every `progress_interval` records (0 disables
    /// progress lines).
    pub fn new(progress_interval: u64) -> Self {
        Counters {
            records: 0,
            elements: 0,
            matches: 0,
            progress_interval,
        }
    }

    pub fn record_seen(&mut self) {
        self.records += 1;
        if self.progress_interval > 0 && self.records % self.progress_interval == 0 {
            info!("Processed {} records so far", self.records);
        }
    }

    pub fn element_seen(&mut self) {
        self.elements += 1;
    }

    pub fn match_found(&mut self) {
        self.matches += 1;
    }

    /// Logs the final totals.
    pub fn log_totals(&self) {
        info!("Total records processed: {}", self.records);
        info!("Total elements processed: {}", self.elements);
        info!("Total matches found: {}", self.matches);
    }
}

impl Display for Counters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records, {} elements, {} matches",
            self.records, self.elements, self.matches
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let mut counters = Counters::new(2);
        for _ in 0..5 {
            counters.record_seen();
        }
        counters.element_seen();
        counters.match_found();
        assert_eq!(counters.records, 5);
        assert_eq!(counters.elements, 1);
        assert_eq!(counters.matches, 1);
        assert_eq!(counters.to_string(), "5 records, 1 elements, 1 matches");
    }

    #[test]
    fn test_zero_interval_disables_progress() {
        let mut counters = Counters::new(0);
        counters.record_seen();
        assert_eq!(counters.records, 1);
    }
}
