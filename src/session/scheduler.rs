//! Fixed-interval tick scheduler on a dedicated thread.
//!
//! The tick channel holds at most one pending tick, so a handler that runs
//! long causes later ticks to be skipped rather than queued. Ticks are
//! never run concurrently.

use crossbeam_channel::{bounded, select, tick, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Handle to a running scheduler thread.
pub struct TickScheduler {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    /// Spawn a thread calling `on_tick` every `interval` until cancelled.
    pub fn spawn<F>(name: String, interval: Duration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new().name(name).spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => on_tick(),
                }
            }
            debug!("Tick scheduler exited");
        })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it. No tick runs after this returns.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
