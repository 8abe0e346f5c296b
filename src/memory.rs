use crate::api::HsaApi;
use crate::bindings;
use crate::error::{HsaError, Result};
use bitflags::bitflags;
use std::alloc::{self, Layout};
use std::os::raw::c_void;
use std::ptr;
use std::sync::Arc;
use tracing::{debug, error};

/// Smallest allocation handed to a test, and the smallest region capacity
/// accepted for kernarg and system memory.
pub const MIN_ALLOCATION_SIZE: usize = 256;

/// Alignment of host allocations registered with the runtime.
pub const HOST_ALLOCATION_ALIGNMENT: usize = 256;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RegionGlobalFlags: u32 {
        const KERNARG = bindings::hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_KERNARG;
        const FINE_GRAINED = bindings::hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_FINE_GRAINED;
        const COARSE_GRAINED = bindings::hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_COARSE_GRAINED;
    }
}

/// Capability snapshot of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionInfo {
    pub segment: bindings::hsa_region_segment_t,
    pub global_flags: RegionGlobalFlags,
    pub runtime_alloc_allowed: bool,
    pub alloc_granule: usize,
    pub alloc_max_size: usize,
}

impl RegionInfo {
    fn allocatable(&self) -> bool {
        self.runtime_alloc_allowed
            && self.alloc_granule > 0
            && self.alloc_max_size >= MIN_ALLOCATION_SIZE
    }

    /// Region kernel arguments are allocated from.
    pub fn is_kernarg(&self) -> bool {
        self.allocatable()
            && self.segment == bindings::hsa_region_segment_t_HSA_REGION_SEGMENT_GLOBAL
            && self.global_flags.contains(RegionGlobalFlags::KERNARG)
    }

    /// Host-visible fine-grained global region.
    pub fn is_system(&self) -> bool {
        self.allocatable()
            && self.segment == bindings::hsa_region_segment_t_HSA_REGION_SEGMENT_GLOBAL
            && self.global_flags.contains(RegionGlobalFlags::FINE_GRAINED)
    }
}

#[derive(Clone)]
pub struct MemoryRegion {
    api: Arc<HsaApi>,
    pub(crate) handle: bindings::hsa_region_t,
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("handle", &self.handle.handle)
            .finish()
    }
}

impl MemoryRegion {
    pub(crate) fn new(api: Arc<HsaApi>, handle: bindings::hsa_region_t) -> Self {
        Self { api, handle }
    }

    pub fn handle(&self) -> u64 {
        self.handle.handle
    }

    fn get_info<T: Copy + Default>(&self, attribute: bindings::hsa_region_info_t, what: &str) -> Result<T> {
        let mut value = T::default();
        // SAFETY: `T` matches the attribute's documented type.
        let status = unsafe {
            (self.api.hsa_region_get_info)(self.handle, attribute, &mut value as *mut T as *mut c_void)
        };
        self.api.check(status, what)?;
        Ok(value)
    }

    pub fn segment(&self) -> Result<bindings::hsa_region_segment_t> {
        self.get_info(
            bindings::hsa_region_info_t_HSA_REGION_INFO_SEGMENT,
            "Failed to get memory region segment",
        )
    }

    pub fn global_flags(&self) -> Result<RegionGlobalFlags> {
        let flags: u32 = self.get_info(
            bindings::hsa_region_info_t_HSA_REGION_INFO_GLOBAL_FLAGS,
            "Failed to get memory region global flags",
        )?;
        Ok(RegionGlobalFlags::from_bits_truncate(flags))
    }

    pub fn max_alloc_size(&self) -> Result<usize> {
        self.get_info(
            bindings::hsa_region_info_t_HSA_REGION_INFO_ALLOC_MAX_SIZE,
            "Failed to get memory region max allocation size",
        )
    }

    pub fn runtime_alloc_allowed(&self) -> Result<bool> {
        let allowed: u8 = self.get_info(
            bindings::hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_ALLOWED,
            "Failed to get memory region allocation permission",
        )?;
        Ok(allowed != 0)
    }

    pub fn alloc_granule(&self) -> Result<usize> {
        self.get_info(
            bindings::hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_GRANULE,
            "Failed to get memory region allocation granule",
        )
    }

    pub fn info(&self) -> Result<RegionInfo> {
        let segment = self.segment()?;
        let global_flags = if segment == bindings::hsa_region_segment_t_HSA_REGION_SEGMENT_GLOBAL {
            self.global_flags()?
        } else {
            RegionGlobalFlags::empty()
        };
        let runtime_alloc_allowed = self.runtime_alloc_allowed()?;
        let (alloc_granule, alloc_max_size) = if runtime_alloc_allowed {
            (self.alloc_granule()?, self.max_alloc_size()?)
        } else {
            (0, 0)
        };
        Ok(RegionInfo {
            segment,
            global_flags,
            runtime_alloc_allowed,
            alloc_granule,
            alloc_max_size,
        })
    }

    /// First region in `regions` whose capabilities satisfy `predicate`.
    pub fn find(
        regions: &[MemoryRegion],
        predicate: impl Fn(&RegionInfo) -> bool,
    ) -> Result<Option<MemoryRegion>> {
        for region in regions {
            if predicate(&region.info()?) {
                return Ok(Some(region.clone()));
            }
        }
        Ok(None)
    }

    pub fn allocate(&self, size: usize) -> Result<Memory> {
        debug!(size, region = self.handle.handle, "allocating from memory region");

        let mut ptr = ptr::null_mut();
        // SAFETY: plain out-parameter.
        let status = unsafe { (self.api.hsa_memory_allocate)(self.handle, size, &mut ptr) };
        if let Err(e) = self.api.check(status, "hsa_memory_allocate") {
            return Err(HsaError::MemoryAllocationFailed(format!(
                "{} bytes from region 0x{:x}: {}",
                size, self.handle.handle, e
            )));
        }
        if ptr.is_null() {
            return Err(HsaError::MemoryAllocationFailed(format!(
                "{} bytes from region 0x{:x}: null pointer",
                size, self.handle.handle
            )));
        }

        debug!(size, address = ptr as usize, "allocated region memory");
        Ok(Memory {
            api: self.api.clone(),
            ptr,
            size,
        })
    }
}

/// Memory allocated from a runtime region, freed on drop.
pub struct Memory {
    api: Arc<HsaApi>,
    ptr: *mut c_void,
    size: usize,
}

impl Memory {
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is a live, host-accessible allocation of `size` bytes.
        unsafe { std::slice::from_raw_parts(self.ptr as *const u8, self.size) }
    }

    /// Mutable view of the allocation.
    ///
    /// # Safety
    ///
    /// No other view of the allocation may be live, and the device must not
    /// be accessing it.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr as *mut u8, self.size) }
    }
}

impl Drop for Memory {
    fn drop(&mut self) {
        debug!(address = self.ptr as usize, size = self.size, "freeing region memory");
        // SAFETY: `ptr` came from `hsa_memory_allocate` and is freed once.
        let status = unsafe { (self.api.hsa_memory_free)(self.ptr) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to free memory: {}", self.api.status_string(status));
        }
    }
}

// SAFETY: the allocation is plain memory; synchronization of its contents
// is the caller's concern.
unsafe impl Send for Memory {}
unsafe impl Sync for Memory {}

/// Host allocation registered with the runtime so agents can access it.
/// Used on full-profile agents.
pub struct HostMemory {
    api: Arc<HsaApi>,
    ptr: *mut u8,
    layout: Layout,
}

impl HostMemory {
    pub fn allocate(api: Arc<HsaApi>, size: usize, alignment: usize) -> Result<Self> {
        let layout = Layout::from_size_align(size.max(1), alignment.max(HOST_ALLOCATION_ALIGNMENT))
            .map_err(|e| HsaError::MemoryAllocationFailed(format!("{} bytes: {}", size, e)))?;

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(HsaError::MemoryAllocationFailed(format!(
                "host allocation of {} bytes",
                size
            )));
        }

        // SAFETY: `ptr` is a live allocation of `layout.size()` bytes.
        let status = unsafe { (api.hsa_memory_register)(ptr as *mut c_void, layout.size()) };
        if let Err(e) = api.check(status, "hsa_memory_register") {
            // SAFETY: allocated above with the same layout.
            unsafe { alloc::dealloc(ptr, layout) };
            return Err(e);
        }

        debug!(size, address = ptr as usize, "allocated registered host memory");
        Ok(Self { api, ptr, layout })
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr as *mut c_void
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: live allocation of `layout.size()` bytes.
        unsafe { std::slice::from_raw_parts(self.ptr, self.layout.size()) }
    }

    /// Mutable view of the allocation.
    ///
    /// # Safety
    ///
    /// Same contract as [`Memory::as_mut_slice`].
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.layout.size()) }
    }
}

impl Drop for HostMemory {
    fn drop(&mut self) {
        debug!(address = self.ptr as usize, size = self.layout.size(), "freeing registered host memory");
        // SAFETY: registered in `allocate` with the same pointer and size.
        let status =
            unsafe { (self.api.hsa_memory_deregister)(self.ptr as *mut c_void, self.layout.size()) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to deregister memory: {}", self.api.status_string(status));
        }
        // SAFETY: allocated in `allocate` with `layout`.
        unsafe { alloc::dealloc(self.ptr, self.layout) };
    }
}

unsafe impl Send for HostMemory {}
unsafe impl Sync for HostMemory {}

/// Buffer or image backing store, allocated the way the agent's profile
/// requires.
pub enum Allocation {
    /// Host memory registered with the runtime (full profile).
    Host(HostMemory),
    /// Memory from the system region (base profile).
    Region(Memory),
}

impl Allocation {
    pub fn as_ptr(&self) -> *mut c_void {
        match self {
            Allocation::Host(m) => m.as_ptr(),
            Allocation::Region(m) => m.as_ptr(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Allocation::Host(m) => m.size(),
            Allocation::Region(m) => m.size(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Allocation::Host(m) => m.as_slice(),
            Allocation::Region(m) => m.as_slice(),
        }
    }

    /// # Safety
    ///
    /// Same contract as [`Memory::as_mut_slice`].
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self) -> &mut [u8] {
        match self {
            Allocation::Host(m) => unsafe { m.as_mut_slice() },
            Allocation::Region(m) => unsafe { m.as_mut_slice() },
        }
    }
}

impl std::fmt::Debug for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Allocation::Host(_) => "host",
            Allocation::Region(_) => "region",
        };
        f.debug_struct("Allocation")
            .field("kind", &kind)
            .field("address", &(self.as_ptr() as usize))
            .field("size", &self.size())
            .finish()
    }
}
