//! Background removal of expired sessions

use parking_lot::Mutex;
use std::fmt;
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::sqlite::Shared;

/// Owned handle to the recurring sweep task.
///
/// The task only holds a weak reference to the store, and is aborted when the
/// `Sweeper` is stopped or dropped.
pub(crate) struct Sweeper {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawn the sweep on `runtime`. The first sweep runs one full `period`
    /// after this call.
    pub fn spawn(runtime: &Handle, period: Duration, shared: Weak<Shared>) -> Self {
        let handle = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let Some(store) = shared.upgrade() else {
                    debug!("Session store dropped, stopping expiry sweep");
                    break;
                };

                match store.sweep_expired() {
                    Ok(0) => debug!(table = %store.table_name, "No expired sessions"),
                    Ok(removed) => {
                        info!(table = %store.table_name, removed, "Swept expired sessions")
                    }
                    Err(e) => {
                        warn!(table = %store.table_name, error = %e, "Expiry sweep failed")
                    }
                }
            }
        });

        Self {
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Cancel the sweep. Safe to call more than once.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            debug!("Expiry sweep stopped");
        }
    }

    #[cfg(test)]
    pub(crate) fn abort_handle(&self) -> Option<tokio::task::AbortHandle> {
        self.handle.lock().as_ref().map(JoinHandle::abort_handle)
    }

    /// Whether the sweep task is still scheduled
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
