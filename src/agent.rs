use crate::api::HsaApi;
use crate::bindings;
use crate::error::{HsaError, Result};
use crate::memory::MemoryRegion;
use crate::options::Profile;
use bitflags::bitflags;
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::sync::Arc;
use tracing::debug;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AgentFeature: u32 {
        const KERNEL_DISPATCH = bindings::hsa_agent_feature_t_HSA_AGENT_FEATURE_KERNEL_DISPATCH;
        const AGENT_DISPATCH = bindings::hsa_agent_feature_t_HSA_AGENT_FEATURE_AGENT_DISPATCH;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExceptionPolicy: u16 {
        const BREAK = bindings::hsa_exception_policy_t_HSA_EXCEPTION_POLICY_BREAK as u16;
        const DETECT = bindings::hsa_exception_policy_t_HSA_EXCEPTION_POLICY_DETECT as u16;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Cpu,
    Gpu,
    Dsp,
}

#[derive(Clone)]
pub struct Agent {
    api: Arc<HsaApi>,
    pub(crate) handle: bindings::hsa_agent_t,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("handle", &format_args!("0x{:x}", self.handle.handle))
            .finish()
    }
}

struct FindAgent<'a> {
    api: &'a HsaApi,
    found: Option<bindings::hsa_agent_t>,
}

impl Agent {
    /// The first agent that supports kernel dispatch.
    pub fn find_kernel_agent(api: &Arc<HsaApi>) -> Result<Self> {
        let mut search = FindAgent {
            api: api.as_ref(),
            found: None,
        };

        // SAFETY: `search` outlives the iteration and the callback only
        // reinterprets the pointer as `FindAgent`.
        let status = unsafe {
            (api.hsa_iterate_agents)(
                Some(find_kernel_agent_callback),
                &mut search as *mut FindAgent<'_> as *mut c_void,
            )
        };
        api.check_iteration(status, "hsa_iterate_agents")?;

        let handle = search.found.ok_or(HsaError::AgentNotFound)?;
        debug!(agent = handle.handle, "selected kernel agent");
        Ok(Agent {
            api: api.clone(),
            handle,
        })
    }

    pub fn handle(&self) -> u64 {
        self.handle.handle
    }

    pub(crate) fn api(&self) -> &Arc<HsaApi> {
        &self.api
    }

    /// Reads a fixed-size agent attribute.
    pub(crate) fn info<T: Copy + Default>(
        &self,
        attribute: bindings::hsa_agent_info_t,
        what: &str,
    ) -> Result<T> {
        let mut value = T::default();
        // SAFETY: `T` matches the attribute's documented type.
        let status = unsafe {
            (self.api.hsa_agent_get_info)(
                self.handle,
                attribute,
                &mut value as *mut T as *mut c_void,
            )
        };
        self.api.check(status, what)?;
        Ok(value)
    }

    pub fn name(&self) -> Result<String> {
        let mut name = [0 as c_char; 64];
        // SAFETY: the runtime writes at most 64 bytes, NUL terminated.
        let status = unsafe {
            (self.api.hsa_agent_get_info)(
                self.handle,
                bindings::hsa_agent_info_t_HSA_AGENT_INFO_NAME,
                name.as_mut_ptr() as *mut c_void,
            )
        };
        self.api.check(status, "agent name")?;
        name[63] = 0;
        // SAFETY: terminated above.
        let name = unsafe { CStr::from_ptr(name.as_ptr()) };
        Ok(name.to_string_lossy().into_owned())
    }

    pub fn device_type(&self) -> Result<DeviceType> {
        let device_type: u32 =
            self.info(bindings::hsa_agent_info_t_HSA_AGENT_INFO_DEVICE, "agent device type")?;
        Ok(match device_type {
            bindings::hsa_device_type_t_HSA_DEVICE_TYPE_CPU => DeviceType::Cpu,
            bindings::hsa_device_type_t_HSA_DEVICE_TYPE_GPU => DeviceType::Gpu,
            bindings::hsa_device_type_t_HSA_DEVICE_TYPE_DSP => DeviceType::Dsp,
            other => {
                return Err(HsaError::InvalidAgent(format!("unknown device type {}", other)));
            }
        })
    }

    pub fn features(&self) -> Result<AgentFeature> {
        let features: u32 =
            self.info(bindings::hsa_agent_info_t_HSA_AGENT_INFO_FEATURE, "agent features")?;
        Ok(AgentFeature::from_bits_truncate(features))
    }

    pub fn profile(&self) -> Result<Profile> {
        let profile: u32 =
            self.info(bindings::hsa_agent_info_t_HSA_AGENT_INFO_PROFILE, "agent profile")?;
        Ok(if profile == bindings::hsa_profile_t_HSA_PROFILE_BASE {
            Profile::Base
        } else {
            Profile::Full
        })
    }

    pub fn queue_max_size(&self) -> Result<u32> {
        self.info(bindings::hsa_agent_info_t_HSA_AGENT_INFO_QUEUE_MAX_SIZE, "agent queue max size")
    }

    pub fn wavefront_size(&self) -> Result<u32> {
        self.info(bindings::hsa_agent_info_t_HSA_AGENT_INFO_WAVEFRONT_SIZE, "agent wavefront size")
    }

    pub fn workgroup_max_size(&self) -> Result<u32> {
        self.info(
            bindings::hsa_agent_info_t_HSA_AGENT_INFO_WORKGROUP_MAX_SIZE,
            "agent workgroup max size",
        )
    }

    pub fn isa(&self) -> Result<bindings::hsa_isa_t> {
        self.info(bindings::hsa_agent_info_t_HSA_AGENT_INFO_ISA, "agent ISA")
    }

    /// Exception policies the agent supports for `profile`.
    pub fn exception_policies(&self, profile: Profile) -> Result<ExceptionPolicy> {
        let mut mask = 0u16;
        // SAFETY: plain out-parameter.
        let status = unsafe {
            (self.api.hsa_agent_get_exception_policies)(self.handle, profile.to_hsa(), &mut mask)
        };
        self.api.check(status, "hsa_agent_get_exception_policies")?;
        Ok(ExceptionPolicy::from_bits_truncate(mask))
    }

    pub fn iterate_memory_regions(&self) -> Result<Vec<MemoryRegion>> {
        let mut regions: Vec<bindings::hsa_region_t> = Vec::new();

        // SAFETY: `regions` outlives the iteration.
        let status = unsafe {
            (self.api.hsa_agent_iterate_regions)(
                self.handle,
                Some(collect_regions_callback),
                &mut regions as *mut _ as *mut c_void,
            )
        };
        self.api.check(status, "hsa_agent_iterate_regions")?;

        Ok(regions
            .into_iter()
            .map(|handle| MemoryRegion::new(self.api.clone(), handle))
            .collect())
    }
}

unsafe extern "C" fn find_kernel_agent_callback(
    agent: bindings::hsa_agent_t,
    data: *mut c_void,
) -> bindings::hsa_status_t {
    // SAFETY: `data` is the `FindAgent` passed by `find_kernel_agent`.
    let search = unsafe { &mut *(data as *mut FindAgent<'_>) };

    let mut features = 0u32;
    let status = unsafe {
        (search.api.hsa_agent_get_info)(
            agent,
            bindings::hsa_agent_info_t_HSA_AGENT_INFO_FEATURE,
            &mut features as *mut _ as *mut c_void,
        )
    };

    if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
        return status;
    }

    if AgentFeature::from_bits_truncate(features).contains(AgentFeature::KERNEL_DISPATCH) {
        search.found = Some(agent);
        return bindings::hsa_status_t_HSA_STATUS_INFO_BREAK;
    }

    bindings::hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn collect_regions_callback(
    region: bindings::hsa_region_t,
    data: *mut c_void,
) -> bindings::hsa_status_t {
    let regions = unsafe { &mut *(data as *mut Vec<bindings::hsa_region_t>) };
    regions.push(region);
    bindings::hsa_status_t_HSA_STATUS_SUCCESS
}
