//! Background refresh loop.
//!
//! One thread per [`Refresher`]. It sleeps for the configured interval, calls
//! [`Registry::refresh`], and repeats. Failed refreshes are already logged by
//! the registry and leave the serving snapshot alone, so the loop just keeps
//! going. Stopping wakes the thread immediately instead of waiting out the
//! interval.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::registry::Registry;
use crate::storage::Storage;
use crate::structured_log::{LogEntry, LogLevel, Outcome};

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    /// Sleep until `deadline`. Returns true if asked to stop.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

/// Handle to a running refresh thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct Refresher {
    registry: Arc<Registry>,
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<u64>>,
}

impl Refresher {
    /// Start refreshing `registry` from `storage` every `interval`.
    pub fn spawn(
        registry: Arc<Registry>,
        storage: Arc<dyn Storage>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let thread_registry = Arc::clone(&registry);
        let handle = std::thread::Builder::new()
            .name("elwin-refresh".to_string())
            .spawn(move || run(&thread_registry, storage.as_ref(), interval, &thread_signal))?;
        Ok(Self {
            registry,
            signal,
            handle: Some(handle),
        })
    }

    /// Stop the loop and wait for the thread. Returns how many refresh
    /// attempts ran, or 0 if the thread panicked.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.signal.stop();
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        match handle.join() {
            Ok(attempts) => attempts,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.registry.log(
                    LogEntry::new(LogLevel::Error, "refresher.stopped")
                        .with_outcome(Outcome::Failed)
                        .with_details(serde_json::json!({ "panic": reason })),
                );
                0
            }
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

fn run(registry: &Registry, storage: &dyn Storage, interval: Duration, signal: &StopSignal) -> u64 {
    registry.log(
        LogEntry::new(LogLevel::Info, "refresher.started")
            .with_duration_ms(interval.as_millis() as u64),
    );
    let mut attempts = 0;
    loop {
        if signal.wait_until(Instant::now() + interval) {
            break;
        }
        attempts += 1;
        let _ = registry.refresh(storage);
    }
    registry.log(
        LogEntry::new(LogLevel::Info, "refresher.stopped")
            .with_details(serde_json::json!({ "attempts": attempts })),
    );
    attempts
}
