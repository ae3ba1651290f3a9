use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::engine::assets::AssetError;

/// Shared cancellation flag between a handle and the worker serving it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub enum LoadEvent<T> {
    Progress { loaded: u64, total: Option<u64> },
    Loaded(T),
    Failed(AssetError),
}

impl<T> LoadEvent<T> {
    /// Percentage for progress events with a known total.
    pub fn percent(&self) -> Option<f64> {
        match *self {
            LoadEvent::Progress {
                loaded,
                total: Some(total),
            } if total > 0 => Some(loaded as f64 / total as f64 * 100.0),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress { .. })
    }
}

/// Frame-thread end of a load.
///
/// Design:
/// - events arrive over an mpsc channel and are drained without blocking
/// - at most one terminal event (`Loaded` / `Failed`) is ever returned
/// - a worker that vanishes without a terminal event reads as `Failed(Disconnected)`
#[derive(Debug)]
pub struct LoadHandle<T> {
    url: String,
    rx: Receiver<LoadEvent<T>>,
    cancel: CancelToken,
    finished: bool,
}

/// Worker end of a load.
#[derive(Debug)]
pub struct LoadReporter<T> {
    tx: Sender<LoadEvent<T>>,
    cancel: CancelToken,
}

impl<T> LoadHandle<T> {
    pub fn channel(url: impl Into<String>) -> (LoadReporter<T>, LoadHandle<T>) {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        (
            LoadReporter {
                tx,
                cancel: cancel.clone(),
            },
            LoadHandle {
                url: url.into(),
                rx,
                cancel,
                finished: false,
            },
        )
    }

    /// A handle that fails on its first poll.
    pub fn failed(url: impl Into<String>, error: AssetError) -> Self {
        let (reporter, handle) = Self::channel(url);
        reporter.finish(Err(error));
        handle
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ask the worker to stop. Events already queued may still be drained.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drain everything that arrived since the last poll.
    pub fn poll(&mut self) -> Vec<LoadEvent<T>> {
        let mut out = Vec::new();
        while !self.finished {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.finished = event.is_terminal();
                    out.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    out.push(LoadEvent::Failed(AssetError::Disconnected));
                }
            }
        }
        out
    }
}

impl<T> LoadReporter<T> {
    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        let _ = self.tx.send(LoadEvent::Progress { loaded, total });
    }

    pub fn finish(self, result: Result<T, AssetError>) {
        let event = match result {
            Ok(value) => LoadEvent::Loaded(value),
            Err(e) => LoadEvent::Failed(e),
        };
        let _ = self.tx.send(event);
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
