use crate::agent::Agent;
use crate::api::HsaApi;
use crate::bindings;
use crate::error::{HsaError, Result};
use crate::memory::{MemoryRegion, RegionInfo};
use crate::options::{Profile, RuntimeOptions};
use crate::queue::Queue;
use crate::runtime::{RuntimeContext, RuntimeState};
use crate::signal::WaitPolicy;
use crate::state::HsaState;
use crate::store::ValueStore;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Balances a successful `hsa_init`.
struct Initialized {
    api: Arc<HsaApi>,
}

impl Drop for Initialized {
    fn drop(&mut self) {
        debug!("shutting down HSA runtime");
        // SAFETY: paired with the `hsa_init` that created this guard.
        let status = unsafe { (self.api.hsa_shut_down)() };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to shut down runtime: {}", self.api.status_string(status));
        }
    }
}

/// Device binding for one run on the HSA runtime.
///
/// Field order is teardown order: the queue goes before the runtime is
/// shut down.
pub struct HsaContext {
    queue: Mutex<Arc<Queue>>,
    agent: Agent,
    kernarg_region: MemoryRegion,
    system_region: MemoryRegion,
    profile: Profile,
    module_profile: Profile,
    little_endian: bool,
    queue_size: u32,
    wavesize: u32,
    waves_per_group: u32,
    wait_policy: WaitPolicy,
    _initialized: Initialized,
    api: Arc<HsaApi>,
}

impl HsaContext {
    /// Loads `options.rtlib` and brings up the runtime.
    pub fn new(options: &RuntimeOptions) -> Result<Self> {
        let api = Arc::new(HsaApi::load(&options.rtlib)?);
        Self::with_api(api, options)
    }

    pub(crate) fn with_api(api: Arc<HsaApi>, options: &RuntimeOptions) -> Result<Self> {
        // SAFETY: no preconditions.
        let status = unsafe { (api.hsa_init)() };
        api.check(status, "hsa_init")?;
        let initialized = Initialized { api: api.clone() };

        let agent = Agent::find_kernel_agent(&api)?;
        let queue_size = agent.queue_max_size()?;
        let profile = agent.profile()?;
        let wavesize = agent.wavefront_size()?;
        let workgroup_max_size = agent.workgroup_max_size()?;
        if wavesize == 0 {
            return Err(HsaError::InvalidAgent("agent reports a zero wavefront size".to_string()));
        }
        let waves_per_group = workgroup_max_size / wavesize;

        let endianness: bindings::hsa_endianness_t = api.system_info(
            bindings::hsa_system_info_t_HSA_SYSTEM_INFO_ENDIANNESS,
            "system endianness",
        )?;
        let frequency: u64 = api.system_info(
            bindings::hsa_system_info_t_HSA_SYSTEM_INFO_TIMESTAMP_FREQUENCY,
            "system timestamp frequency",
        )?;
        let wait_policy = WaitPolicy::new(options.timeout, options.poll_interval, frequency);

        let queue = Queue::create(api.clone(), &agent, queue_size, true)?;

        let regions = agent.iterate_memory_regions()?;
        let kernarg_region = MemoryRegion::find(&regions, RegionInfo::is_kernarg)?
            .ok_or(HsaError::MemoryRegionNotFound("kernarg"))?;
        let system_region = MemoryRegion::find(&regions, RegionInfo::is_system)?
            .ok_or(HsaError::MemoryRegionNotFound("system"))?;

        info!(
            agent = %agent.name()?,
            device = ?agent.device_type()?,
            ?profile,
            wavesize,
            waves_per_group,
            queue_size,
            "HSA context ready"
        );

        Ok(HsaContext {
            queue: Mutex::new(Arc::new(queue)),
            agent,
            kernarg_region,
            system_region,
            profile,
            module_profile: options.profile,
            little_endian: endianness == bindings::hsa_endianness_t_HSA_ENDIANNESS_LITTLE,
            queue_size,
            wavesize,
            waves_per_group,
            wait_policy,
            _initialized: initialized,
            api,
        })
    }

    pub fn api(&self) -> &Arc<HsaApi> {
        &self.api
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn kernarg_region(&self) -> &MemoryRegion {
        &self.kernarg_region
    }

    pub fn system_region(&self) -> &MemoryRegion {
        &self.system_region
    }

    /// Agent profile; decides how buffers are allocated.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Profile programs and executables are built for.
    pub fn module_profile(&self) -> Profile {
        self.module_profile
    }

    pub fn queue_size(&self) -> u32 {
        self.queue_size
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait_policy
    }

    /// The primary queue, replaced first if it was marked errored.
    pub fn queue_no_error(&self) -> Result<Arc<Queue>> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.is_errored() {
            warn!(queue = queue.id(), "recreating queue after an error");
            let replacement = Queue::create(self.api.clone(), &self.agent, self.queue_size, true)?;
            *queue = Arc::new(replacement);
        }
        Ok(queue.clone())
    }

    /// Marks the primary queue errored. Cleanup is left to the next
    /// `queue_no_error`.
    pub fn queue_error(&self, status: bindings::hsa_status_t) {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        error!(status, queue = queue.id(), "queue error");
        queue.mark_errored();
    }
}

impl RuntimeContext for HsaContext {
    fn description(&self) -> String {
        format!("hsa ({})", self.api.library_name())
    }

    fn is_full_profile(&self) -> bool {
        self.profile == Profile::Full
    }

    fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    fn wavesize(&self) -> u32 {
        self.wavesize
    }

    fn waves_per_group(&self) -> u32 {
        self.waves_per_group
    }

    fn new_state(self: Arc<Self>, store: Arc<ValueStore>) -> Arc<dyn RuntimeState> {
        Arc::new(HsaState::new(self, store))
    }
}

impl std::fmt::Debug for HsaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HsaContext")
            .field("agent", &self.agent)
            .field("profile", &self.profile)
            .field("wavesize", &self.wavesize)
            .field("waves_per_group", &self.waves_per_group)
            .finish_non_exhaustive()
    }
}
