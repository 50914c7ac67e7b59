use crate::error::WatchlistError;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::Path;

/// Create a reader for a file located locally or remotely, decompressing `.gz` and `.bz2`
/// content on the fly.
pub(crate) fn get_reader(path: &str) -> Result<Box<dyn Read + Send>, WatchlistError> {
    debug!("opening {}", path);
    oneio::get_reader(path).map_err(|e| WatchlistError::Open {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Open a local file for appending, creating it when missing. Existing content is never
/// truncated.
pub(crate) fn open_append<P: AsRef<Path>>(path: P) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
