//! Host threads that drive one state concurrently.

use crate::runtime::RuntimeState;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error};

/// Spawns commands on OS threads and collects their verdicts.
///
/// There is no cancellation: a command that never returns makes
/// [`wait_threads`](HostThreads::wait_threads) block forever.
pub struct HostThreads {
    state: Arc<dyn RuntimeState>,
    results: Arc<Mutex<Vec<bool>>>,
    handles: Mutex<Vec<(u32, JoinHandle<()>)>>,
}

impl HostThreads {
    pub fn new(state: Arc<dyn RuntimeState>) -> Self {
        Self {
            state,
            results: Arc::new(Mutex::new(Vec::new())),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &Arc<dyn RuntimeState> {
        &self.state
    }

    /// Reserves a result slot, initially `false`, and runs `command` on a
    /// new thread.
    pub fn start_thread<F>(&self, id: u32, command: F)
    where
        F: FnOnce(&dyn RuntimeState) -> bool + Send + 'static,
    {
        let slot = {
            let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
            results.push(false);
            results.len() - 1
        };
        let state = self.state.clone();
        let results = self.results.clone();
        let handle = std::thread::spawn(move || {
            let passed = command(state.as_ref());
            debug!(thread = id, passed, "host thread finished");
            results.lock().unwrap_or_else(PoisonError::into_inner)[slot] = passed;
        });
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handle));
    }

    /// Joins every started thread and ANDs their results. A thread that
    /// panicked counts as failed.
    pub fn wait_threads(&self) -> bool {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
        let mut passed = true;
        for (id, handle) in handles {
            if handle.join().is_err() {
                error!(thread = id, "host thread panicked");
                passed = false;
            }
        }
        let results = std::mem::take(&mut *self.results.lock().unwrap_or_else(PoisonError::into_inner));
        passed && results.into_iter().all(|r| r)
    }
}

impl std::fmt::Debug for HostThreads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let running = self.handles.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("HostThreads").field("running", &running).finish()
    }
}
