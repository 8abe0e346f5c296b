use crate::api::HsaApi;
use crate::bindings;
use crate::error::{HsaError, Result};
use std::ptr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Bounds for a blocking wait.
///
/// `timeout` is wall-clock and is the only deadline. `poll_hint` is the
/// timeout hint handed to each native wait call, in timestamp ticks; it only
/// controls how often the deadline and the abort condition are re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_hint: u64,
}

impl WaitPolicy {
    /// Converts `poll_interval` to ticks of a `frequency` Hz timestamp clock.
    pub fn new(timeout: Duration, poll_interval: Duration, frequency: u64) -> Self {
        let ticks = (frequency as u128 * poll_interval.as_nanos()) / 1_000_000_000;
        Self {
            timeout,
            poll_hint: u64::try_from(ticks).unwrap_or(u64::MAX).max(1),
        }
    }
}

pub struct Signal {
    api: Arc<HsaApi>,
    handle: bindings::hsa_signal_t,
}

impl Signal {
    pub fn create(api: Arc<HsaApi>, initial_value: i64) -> Result<Self> {
        let mut handle = bindings::hsa_signal_t { handle: 0 };

        // SAFETY: no consumer list, plain out-parameter.
        let status = unsafe { (api.hsa_signal_create)(initial_value, 0, ptr::null(), &mut handle) };
        api.check(
            status,
            &format!("hsa_signal_create (initial value {})", initial_value),
        )?;

        if handle.handle == 0 {
            return Err(HsaError::InvalidSignal(
                "Signal creation returned invalid handle (0)".to_string(),
            ));
        }

        debug!(signal = handle.handle, initial_value, "created signal");
        Ok(Signal { api, handle })
    }

    pub fn handle(&self) -> bindings::hsa_signal_t {
        self.handle
    }

    pub fn load(&self) -> i64 {
        // SAFETY: the handle is live until drop.
        unsafe { (self.api.hsa_signal_load_scacquire)(self.handle) }
    }

    pub fn store(&self, value: i64) {
        debug!(signal = self.handle.handle, value, "storing signal value");
        // SAFETY: the handle is live until drop.
        unsafe { (self.api.hsa_signal_store_relaxed)(self.handle, value) }
    }

    /// Store with release semantics.
    pub fn store_release(&self, value: i64) {
        // SAFETY: the handle is live until drop.
        unsafe { (self.api.hsa_signal_store_screlease)(self.handle, value) }
    }

    /// One native wait for the value to equal `value`. Returns the value
    /// observed when the call returned, which may differ on timeout.
    pub fn wait_eq(&self, value: i64, timeout_hint: u64) -> i64 {
        // SAFETY: the handle is live until drop.
        unsafe {
            (self.api.hsa_signal_wait_scacquire)(
                self.handle,
                bindings::hsa_signal_condition_t_HSA_SIGNAL_CONDITION_EQ,
                value,
                timeout_hint,
                bindings::hsa_wait_state_t_HSA_WAIT_STATE_BLOCKED,
            )
        }
    }

    /// Waits until the signal equals `expected`, giving up once
    /// `policy.timeout` has elapsed or as soon as `abort` reports an error.
    pub fn wait_eq_bounded<F>(
        &self,
        expected: i64,
        policy: WaitPolicy,
        what: &str,
        mut abort: F,
    ) -> Result<()>
    where
        F: FnMut() -> Option<HsaError>,
    {
        debug!(signal = self.handle.handle, expected, "waiting on signal");
        let start = Instant::now();
        loop {
            let acquired = self.wait_eq(expected, policy.poll_hint);
            if acquired == expected {
                debug!(
                    signal = self.handle.handle,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "signal reached expected value"
                );
                return Ok(());
            }

            if let Some(e) = abort() {
                error!(signal = self.handle.handle, expected, acquired, "{}: {}", what, e);
                return Err(e);
            }

            let elapsed = start.elapsed();
            if elapsed >= policy.timeout {
                error!(
                    signal = self.handle.handle,
                    expected,
                    acquired,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "{} timed out",
                    what
                );
                return Err(HsaError::Timeout {
                    what: format!("{} (expected {}, acquired {})", what, expected, acquired),
                    elapsed_ms: elapsed.as_millis(),
                });
            }
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("handle", &self.handle.handle)
            .finish()
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        debug!(signal = self.handle.handle, "destroying signal");
        // SAFETY: created in `create`, destroyed once.
        let status = unsafe { (self.api.hsa_signal_destroy)(self.handle) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy signal: {}", self.api.status_string(status));
        }
    }
}

unsafe impl Send for Signal {}
unsafe impl Sync for Signal {}
