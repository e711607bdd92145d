//! Local log file tailing.
//!
//! Follows a server log the way `tail -F` does: starts at the end of the
//! file, emits each complete new line, and starts over if the file shrinks.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::common::error::{ConfigError, SourceError};

/// Substring every chat line contains (`...]: <Name> text`).
pub const CHAT_LINE_MARKER: &str = ": <";

/// Fallback poll period for filesystems that drop change events.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Whether a log line looks like player chat.
pub fn is_chat_line(line: &str) -> bool {
    line.contains(CHAT_LINE_MARKER)
}

/// Reads lines appended to a file since the last call.
#[derive(Debug)]
pub struct TailReader {
    path: PathBuf,
    offset: u64,
    /// Bytes after the last newline seen so far.
    pending: Vec<u8>,
}

impl TailReader {
    /// Start reading at the current end of the file.
    pub async fn at_end(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let offset = tokio::fs::metadata(&path).await?.len();
        Ok(Self {
            path,
            offset,
            pending: Vec::new(),
        })
    }

    /// Read complete lines appended since the previous call.
    pub async fn read_new_lines(&mut self) -> std::io::Result<Vec<String>> {
        let mut file = File::open(&self.path).await?;
        let len = file.metadata().await?.len();

        if len < self.offset {
            debug!("{} shrank, reading from the start", self.path.display());
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut appended = Vec::new();
        file.read_to_end(&mut appended).await?;
        self.offset += appended.len() as u64;
        self.pending.extend_from_slice(&appended);

        Ok(self.drain_complete_lines())
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        String::from_utf8_lossy(&complete)
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect()
    }
}

/// File-tail input source.
#[derive(Debug, Clone)]
pub struct LogTail {
    path: PathBuf,
    poll_interval: Duration,
}

impl LogTail {
    /// The file must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::LocalFileMissing {
                path: path.display().to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Override the fallback poll period.
    #[cfg(test)]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Emit chat-looking lines until the receiver goes away.
    pub async fn run(self, tx: mpsc::UnboundedSender<String>) -> Result<(), SourceError> {
        let watch_error = |source| SourceError::Watch {
            path: self.path.display().to_string(),
            source,
        };

        let (changed_tx, mut changed_rx) = mpsc::unbounded_channel::<()>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                    if changed_tx.send(()).is_err() {
                        debug!("Tail stopped, dropping change event");
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("File watch error: {}", e),
            }
        })
        .map_err(watch_error)?;
        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;

        let mut reader = TailReader::at_end(&self.path).await?;
        let mut poll = tokio::time::interval(self.poll_interval);
        info!("Tailing {}", self.path.display());

        loop {
            tokio::select! {
                _ = changed_rx.recv() => {}
                _ = poll.tick() => {}
            }

            let lines = match reader.read_new_lines().await {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("Failed to read {}: {}", self.path.display(), e);
                    continue;
                }
            };

            for line in lines.into_iter().filter(|line| is_chat_line(line)) {
                if tx.send(line).is_err() {
                    info!("Line receiver closed, stopping tail");
                    return Ok(());
                }
            }
        }
    }
}
