//! Append-only text journal of cycle events.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Fire-and-forget line sink. Implementations must never fail or block the caller.
pub trait SignalLog: Send + Sync {
    fn append(&self, line: &str);
}

enum Command {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Writes `[YYYY-MM-DD HH:MM:SS] line` records to a file.
///
/// Lines are timestamped on `append` and handed to a background task that
/// owns the file, so appending never waits on disk I/O. Records keep their
/// append order.
pub struct FileSignalLog {
    path: PathBuf,
    tx: mpsc::UnboundedSender<Command>,
}

impl FileSignalLog {
    /// Spawns the writer task; must be called from within a tokio runtime.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path.clone(), rx));
        Self { path, tx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves once every line appended so far has been written (or dropped on error).
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl SignalLog for FileSignalLog {
    fn append(&self, line: &str) {
        let record = format!("[{}] {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S"), line);
        if self.tx.send(Command::Line(record)).is_err() {
            warn!(path = %self.path.display(), "Signal log writer has stopped, line dropped");
        }
    }
}

async fn open(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    OpenOptions::new().create(true).append(true).open(path).await
}

async fn write_record(file: &mut Option<File>, path: &Path, record: &str) -> std::io::Result<()> {
    if file.is_none() {
        *file = Some(open(path).await?);
    }
    if let Some(f) = file.as_mut() {
        f.write_all(record.as_bytes()).await?;
        f.flush().await?;
    }
    Ok(())
}

async fn run_writer(path: PathBuf, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut file: Option<File> = None;
    while let Some(command) = rx.recv().await {
        match command {
            Command::Line(record) => {
                if let Err(e) = write_record(&mut file, &path, &record).await {
                    warn!(path = %path.display(), error = %e, "Failed to append to signal log");
                    // Reopen on the next line.
                    file = None;
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!(path = %path.display(), "Signal log writer exited");
}

#[derive(Debug, Default)]
pub struct NullSignalLog;

impl SignalLog for NullSignalLog {
    fn append(&self, _line: &str) {}
}
