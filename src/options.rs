use crate::error::{HsaError, Result};
use std::time::Duration;
use tracing::debug;

/// Default upper bound on a single dispatch or signal wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Granularity of one native wait call inside a bounded wait loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[cfg(target_os = "windows")]
pub const DEFAULT_RTLIB: &str = "hsa-runtime64.dll";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_RTLIB: &str = "libhsa-runtime64.so.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeKind {
    #[default]
    Hsa,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Full,
    Base,
}

impl Profile {
    pub(crate) fn to_hsa(self) -> crate::bindings::hsa_profile_t {
        match self {
            Profile::Full => crate::bindings::hsa_profile_t_HSA_PROFILE_FULL,
            Profile::Base => crate::bindings::hsa_profile_t_HSA_PROFILE_BASE,
        }
    }
}

/// Settings a harness hands to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub runtime: RuntimeKind,
    pub rtlib: String,
    pub timeout: Duration,
    pub profile: Profile,
    pub poll_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            runtime: RuntimeKind::default(),
            rtlib: DEFAULT_RTLIB.to_string(),
            timeout: DEFAULT_TIMEOUT,
            profile: Profile::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runtime(mut self, runtime: RuntimeKind) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn rtlib(mut self, rtlib: impl Into<String>) -> Self {
        self.rtlib = rtlib.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Applies one harness option given as strings.
    ///
    /// Recognized keys are `rt`, `rtlib`, `timeout` (seconds) and `profile`.
    /// Unknown keys belong to other layers and are skipped.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "rt" => {
                self.runtime = match value {
                    "hsa" => RuntimeKind::Hsa,
                    "none" => RuntimeKind::None,
                    other => {
                        return Err(HsaError::InvalidArgument(format!(
                            "unknown runtime '{}'",
                            other
                        )));
                    }
                }
            }
            "rtlib" => self.rtlib = value.to_string(),
            "timeout" => {
                let secs: f64 = value.trim().parse().map_err(|_| {
                    HsaError::InvalidArgument(format!("timeout '{}' is not a number", value))
                })?;
                self.timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
                    HsaError::InvalidArgument(format!("timeout '{}' out of range", value))
                })?;
            }
            "profile" => {
                self.profile = if value == "base" {
                    Profile::Base
                } else {
                    Profile::Full
                }
            }
            _ => debug!(key, "ignoring option not used by the runtime"),
        }
        Ok(())
    }

    /// Defaults overridden by `HEXL_RT`, `HEXL_RTLIB`, `HEXL_TIMEOUT` and
    /// `HEXL_PROFILE`.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();
        for (var, key) in [
            ("HEXL_RT", "rt"),
            ("HEXL_RTLIB", "rtlib"),
            ("HEXL_TIMEOUT", "timeout"),
            ("HEXL_PROFILE", "profile"),
        ] {
            if let Ok(value) = std::env::var(var) {
                options.set(key, &value)?;
            }
        }
        Ok(options)
    }
}
