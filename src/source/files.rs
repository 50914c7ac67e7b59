use crate::error::FeedError;
use crate::source::{FeedFile, Interval, MrtRecordStream, StreamSource};
use log::info;

/// Feed made of explicit MRT files, local or remote, read in the given order.
///
/// The collector set passed to [open](StreamSource::open) only labels the files in logs; the
/// first collector is used, or `local` when none is given.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    paths: Vec<String>,
}

impl FileSource {
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Self {
        FileSource {
            paths: paths.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }
}

impl StreamSource for FileSource {
    type Records = MrtRecordStream;

    fn open(
        &mut self,
        interval: &Interval,
        collectors: &[String],
    ) -> Result<MrtRecordStream, FeedError> {
        let label = collectors
            .first()
            .map(String::as_str)
            .unwrap_or("local")
            .to_string();
        info!(
            "Creating BGP stream over {} files, time interval {}",
            self.paths.len(),
            interval
        );
        let files = self
            .paths
            .iter()
            .map(|url| FeedFile {
                collector: label.clone(),
                url: url.clone(),
            })
            .collect();
        Ok(MrtRecordStream::new(files, *interval))
    }
}
