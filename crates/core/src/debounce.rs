//! Single-slot debouncer.
//!
//! Values are pushed through a [`DebounceHandle`]; the debouncer task holds only
//! the most recent one and emits it on the output channel once no newer value
//! has arrived for the quiet period. Every new value restarts the timer.
//!
//! Dropping every handle (or calling [`DebounceHandle::shutdown`]) stops the
//! task and discards any pending value without emitting it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Buffer size for values waiting to be picked up by the debouncer task.
const INPUT_BUFFER_SIZE: usize = 64;

/// Buffer size for emitted values.
const OUTPUT_BUFFER_SIZE: usize = 16;

enum Command<T> {
    Observe { value: T, quiet: Duration },
    Shutdown,
}

/// Handle for feeding values into a running debouncer.
///
/// Cheaply cloneable. The debouncer stops once all handles are dropped.
#[derive(Debug)]
pub struct DebounceHandle<T> {
    tx: mpsc::Sender<Command<T>>,
    default_quiet: Duration,
}

impl<T> Clone for DebounceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            default_quiet: self.default_quiet,
        }
    }
}

impl<T: Send + 'static> DebounceHandle<T> {
    /// Observe a new value using the default quiet period.
    pub async fn observe(&self, value: T) {
        self.observe_for(value, self.default_quiet).await;
    }

    /// Observe a new value with an explicit quiet period.
    ///
    /// Replaces any pending value and restarts the timer.
    pub async fn observe_for(&self, value: T, quiet: Duration) {
        if self
            .tx
            .send(Command::Observe { value, quiet })
            .await
            .is_err()
        {
            debug!("Debouncer stopped, dropping observed value");
        }
    }

    /// Stop the debouncer. A pending value is discarded.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

/// Debouncer task state.
pub struct Debouncer<T> {
    rx: mpsc::Receiver<Command<T>>,
    out: mpsc::Sender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer, returning the input handle, the task and the output receiver.
    ///
    /// The task must be driven by calling [`run`](Self::run), usually via `tokio::spawn`.
    pub fn new(quiet: Duration) -> (DebounceHandle<T>, Self, mpsc::Receiver<T>) {
        let (tx, rx) = mpsc::channel(INPUT_BUFFER_SIZE);
        let (out, out_rx) = mpsc::channel(OUTPUT_BUFFER_SIZE);
        let handle = DebounceHandle {
            tx,
            default_quiet: quiet,
        };
        (handle, Self { rx, out }, out_rx)
    }

    /// Create a debouncer and spawn its task on the current runtime.
    pub fn spawn(quiet: Duration) -> (DebounceHandle<T>, JoinHandle<()>, mpsc::Receiver<T>) {
        let (handle, debouncer, out_rx) = Self::new(quiet);
        let task = tokio::spawn(debouncer.run());
        (handle, task, out_rx)
    }

    /// Run until every handle is dropped, shutdown is requested or the output is closed.
    pub async fn run(mut self) {
        let mut pending: Option<(T, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, at)| *at);

            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Observe { value, quiet }) => {
                        pending = Some((value, Instant::now() + quiet));
                    }
                    Some(Command::Shutdown) | None => {
                        if pending.is_some() {
                            debug!("Debouncer stopping, pending value discarded");
                        }
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((value, _)) = pending.take() {
                        if self.out.send(value).await.is_err() {
                            debug!("Debounce output closed");
                            break;
                        }
                    }
                }
            }
        }
    }
}
