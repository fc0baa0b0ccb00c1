//! # Camera Scanner Task
//!
//! Polls a capture source for a barcode until one is read, then hands the
//! code to the bill as if it had been typed into the code field.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ScanSession::start()                                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌──────────────┐  tick   ┌──────────────┐  Some(code)  ┌────────────┐ │
//! │  │   waiting    │ ──────► │  poll_code() │ ───────────► │  on_code() │ │
//! │  └──────────────┘ ◄────── └──────────────┘              └─────┬──────┘ │
//! │        │           None          │ Err                        │        │
//! │        │ close()                 ▼                            ▼        │
//! │        └────────────────────► release() ◄────────────── stop itself   │
//! │                                                                         │
//! │  The source is released on every exit path, including when the        │
//! │  session handle is dropped without calling close().                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    /// The camera could not be opened or stopped delivering frames.
    #[error("Capture device error: {0}")]
    Device(String),
}

/// A camera (or anything else) that may yield a barcode when polled.
#[async_trait]
pub trait CaptureSource: Send + 'static {
    /// Grabs one frame and tries to read a code from it.
    async fn poll_code(&mut self) -> Result<Option<String>, ScanError>;

    /// Stops capturing and frees the device.
    fn release(&mut self);
}

/// Reads codes that an external decoder writes to a file.
///
/// Decoders such as `zbarcam` can be pointed at a file; each non-blank
/// content is one scan. The file is removed once read so a code is only
/// consumed once.
#[derive(Debug, Clone)]
pub struct FileCaptureSource {
    path: PathBuf,
}

impl FileCaptureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    async fn poll_code(&mut self) -> Result<Option<String>, ScanError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ScanError::Device(e.to_string())),
        };

        let code = contents
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);
        if code.is_some() {
            tokio::fs::remove_file(&self.path)
                .await
                .map_err(|e| ScanError::Device(e.to_string()))?;
        }
        Ok(code)
    }

    fn release(&mut self) {
        debug!(path = ?self.path, "Stopped watching capture file");
    }
}

/// How a scan session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Detected(String),
    Closed,
    Failed(String),
}

/// Releases the source when the polling task ends, however it ends.
struct ReleaseGuard<S: CaptureSource> {
    source: S,
}

impl<S: CaptureSource> Drop for ReleaseGuard<S> {
    fn drop(&mut self) {
        self.source.release();
        debug!("Capture source released");
    }
}

/// Handle to a running scan.
pub struct ScanSession {
    task: Option<JoinHandle<ScanOutcome>>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ScanSession {
    /// Starts polling `source` every `interval`.
    ///
    /// `on_code` runs once, on the first non-blank code, after which the
    /// session stops itself.
    pub fn start<S, F>(source: S, interval: Duration, on_code: F) -> Self
    where
        S: CaptureSource,
        F: FnOnce(String) + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut guard = ReleaseGuard { source };
            let mut on_code = Some(on_code);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Scan session closed");
                        return ScanOutcome::Closed;
                    }
                    _ = ticker.tick() => {
                        match guard.source.poll_code().await {
                            Ok(Some(code)) if !code.trim().is_empty() => {
                                let code = code.trim().to_string();
                                info!(code = %code, "Barcode detected");
                                if let Some(callback) = on_code.take() {
                                    callback(code.clone());
                                }
                                return ScanOutcome::Detected(code);
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "Scan polling failed");
                                return ScanOutcome::Failed(e.to_string());
                            }
                        }
                    }
                }
            }
        });

        ScanSession {
            task: Some(task),
            shutdown_tx,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the session to end on its own (detection or failure).
    pub async fn finished(mut self) -> ScanOutcome {
        match self.task.take() {
            Some(task) => Self::join(task).await,
            None => ScanOutcome::Closed,
        }
    }

    /// Stops polling and waits for the source to be released.
    pub async fn close(mut self) -> ScanOutcome {
        // A full channel or a finished task both mean nothing to signal
        let _ = self.shutdown_tx.try_send(());
        match self.task.take() {
            Some(task) => Self::join(task).await,
            None => ScanOutcome::Closed,
        }
    }

    async fn join(task: JoinHandle<ScanOutcome>) -> ScanOutcome {
        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => ScanOutcome::Closed,
            Err(e) => ScanOutcome::Failed(e.to_string()),
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
