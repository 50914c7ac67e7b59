/*!
Match log output.

A [MatchSink] is used for the duration of one attempt: the fetcher calls
[begin_attempt](MatchSink::begin_attempt), the extractor calls [append](MatchSink::append) once
per match, and the fetcher calls [end_attempt](MatchSink::end_attempt) whether the attempt
succeeded or not.

With [CommitMode::Incremental] every match is written and flushed as it is found, so a crash or
an abandoned attempt leaves its matches in the log and a retried pass writes them again. With
[CommitMode::OnSuccess] an attempt's matches are held in memory and appended only if the attempt
succeeds, as one write; a commit that fails part way is truncated off the log again.
*/
use crate::config::WatchConfig;
use crate::error::SinkError;
use crate::io::open_append;
use crate::models::MatchRecord;
use log::{debug, warn};
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

/// When an attempt's matches reach the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Write each match immediately; output of abandoned attempts is kept.
    #[default]
    Incremental,
    /// Buffer matches and write them only when the attempt succeeds.
    OnSuccess,
}

/// How one match is rendered in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The human-readable line of [MatchRecord]'s `Display`.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    pub fn format(&self, record: &MatchRecord) -> Result<String, SinkError> {
        match self {
            OutputFormat::Text => Ok(record.to_string()),
            OutputFormat::Json => Ok(serde_json::to_string(record)?),
        }
    }
}

pub trait MatchSink {
    /// Acquires the output for a new attempt. Attempts are numbered from 1.
    fn begin_attempt(&mut self, attempt: u32) -> Result<(), SinkError>;

    fn append(&mut self, record: &MatchRecord) -> Result<(), SinkError>;

    /// Releases the output acquired by [begin_attempt](MatchSink::begin_attempt).
    fn end_attempt(&mut self, succeeded: bool) -> Result<(), SinkError>;
}

/// Append-only match log file, one match per line.
///
/// The file is opened in append mode at the start of each attempt and closed when the attempt
/// ends. It is never truncated, so it can be tailed while a run is in progress.
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
    commit: CommitMode,
    writer: Option<LineWriter<File>>,
    pending: Vec<String>,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSink {
            path: path.as_ref().to_path_buf(),
            format: OutputFormat::default(),
            commit: CommitMode::default(),
            writer: None,
            pending: vec![],
        }
    }

    /// Creates a sink using the output format and commit mode of `config`.
    pub fn from_config<P: AsRef<Path>>(path: P, config: &WatchConfig) -> Self {
        FileSink::new(path)
            .with_format(config.format)
            .with_commit_mode(config.commit)
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_commit_mode(mut self, commit: CommitMode) -> Self {
        self.commit = commit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatchSink for FileSink {
    fn begin_attempt(&mut self, attempt: u32) -> Result<(), SinkError> {
        debug!("attempt {}: opening {}", attempt, self.path.display());
        self.pending.clear();
        self.writer = Some(LineWriter::new(open_append(&self.path)?));
        Ok(())
    }

    fn append(&mut self, record: &MatchRecord) -> Result<(), SinkError> {
        let line = self.format.format(record)?;
        let writer = self.writer.as_mut().ok_or(SinkError::NotOpen)?;
        match self.commit {
            CommitMode::Incremental => writeln!(writer, "{}", line)?,
            CommitMode::OnSuccess => self.pending.push(line),
        }
        Ok(())
    }

    fn end_attempt(&mut self, succeeded: bool) -> Result<(), SinkError> {
        let pending = std::mem::take(&mut self.pending);
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush()?;
        if succeeded && !pending.is_empty() {
            let mut batch = String::new();
            for line in &pending {
                batch.push_str(line);
                batch.push('\n');
            }
            append_batch(writer.get_mut(), batch.as_bytes())?;
        }
        Ok(())
    }
}

/// Output whose length can be restored after a failed append.
trait Rollback: Write {
    fn committed_len(&self) -> io::Result<u64>;
    fn rollback(&mut self, len: u64) -> io::Result<()>;
}

impl Rollback for File {
    fn committed_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn rollback(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Appends `batch` in full or not at all.
///
/// A failed write is undone by truncating the output back to its length before the batch.
fn append_batch<W: Rollback>(out: &mut W, batch: &[u8]) -> io::Result<()> {
    let len = out.committed_len()?;
    match out.write_all(batch).and_then(|_| out.flush()) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(undo) = out.rollback(len) {
                warn!("cannot roll back partial commit to {} bytes: {}", len, undo);
            }
            Err(e)
        }
    }
}

/// In-memory sink keeping every committed match, with the same commit semantics as
/// [FileSink].
#[derive(Debug, Default)]
pub struct MemorySink {
    commit: CommitMode,
    records: Vec<MatchRecord>,
    pending: Vec<MatchRecord>,
    open: bool,
}

impl MemorySink {
    pub fn new(commit: CommitMode) -> Self {
        MemorySink {
            commit,
            ..Default::default()
        }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }
}

impl MatchSink for MemorySink {
    fn begin_attempt(&mut self, _attempt: u32) -> Result<(), SinkError> {
        self.pending.clear();
        self.open = true;
        Ok(())
    }

    fn append(&mut self, record: &MatchRecord) -> Result<(), SinkError> {
        if !self.open {
            return Err(SinkError::NotOpen);
        }
        match self.commit {
            CommitMode::Incremental => self.records.push(record.clone()),
            CommitMode::OnSuccess => self.pending.push(record.clone()),
        }
        Ok(())
    }

    fn end_attempt(&mut self, succeeded: bool) -> Result<(), SinkError> {
        let pending = std::mem::take(&mut self.pending);
        if succeeded {
            self.records.extend(pending);
        }
        self.open = false;
        Ok(())
    }
}
