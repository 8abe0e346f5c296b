//! Kernel dispatch: packet setup, argument packing, publish and wait.

use crate::api::HsaApi;
use crate::bindings as b;
use crate::error::{HsaError, Result};
use crate::executable::{Executable, KernelInfo};
use crate::kernarg::{KernargWriter, group_offset};
use crate::memory::{Memory, MemoryRegion};
use crate::queue::{Queue, publish_packet};
use crate::signal::{Signal, WaitPolicy};
use crate::value::Value;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Private segment granted to kernels that use a dynamic call stack.
pub const DYNAMIC_CALLSTACK_PRIVATE_SIZE: u32 = 4096;

/// Launch geometry a test stores under `"dispatchSetup"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSetup {
    pub dimensions: u8,
    pub grid_size: [u32; 3],
    pub workgroup_size: [u16; 3],
    /// Group memory requested on top of the kernel's static group segment.
    pub dynamic_group_segment_size: u32,
}

impl Default for DispatchSetup {
    fn default() -> Self {
        Self {
            dimensions: 1,
            grid_size: [1, 1, 1],
            workgroup_size: [1, 1, 1],
            dynamic_group_segment_size: 0,
        }
    }
}

impl DispatchSetup {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.dimensions) {
            return Err(HsaError::InvalidArgument(format!(
                "dispatch dimensions must be 1, 2 or 3, got {}",
                self.dimensions
            )));
        }
        if self.grid_size.contains(&0) || self.workgroup_size.contains(&0) {
            return Err(HsaError::InvalidArgument(format!(
                "grid {:?} and workgroup {:?} sizes must be non-zero",
                self.grid_size, self.workgroup_size
            )));
        }
        Ok(())
    }
}

/// Kernel dispatch header: barrier bit, system scope acquire and release
/// fences.
pub fn dispatch_header() -> u16 {
    ((b::hsa_packet_type_t_HSA_PACKET_TYPE_KERNEL_DISPATCH << b::hsa_packet_header_t_HSA_PACKET_HEADER_TYPE)
        | (1 << b::hsa_packet_header_t_HSA_PACKET_HEADER_BARRIER)
        | (b::hsa_fence_scope_t_HSA_FENCE_SCOPE_SYSTEM
            << b::hsa_packet_header_t_HSA_PACKET_HEADER_SCACQUIRE_FENCE_SCOPE)
        | (b::hsa_fence_scope_t_HSA_FENCE_SCOPE_SYSTEM
            << b::hsa_packet_header_t_HSA_PACKET_HEADER_SCRELEASE_FENCE_SCOPE)) as u16
}

pub fn dispatch_setup(dimensions: u8) -> u16 {
    (dimensions as u16) << b::hsa_kernel_dispatch_packet_setup_t_HSA_KERNEL_DISPATCH_PACKET_SETUP_DIMENSIONS
}

pub struct Dispatch {
    id: String,
    queue: Arc<Queue>,
    _executable: Arc<Executable>,
    index: u64,
    packet: NonNull<b::hsa_kernel_dispatch_packet_t>,
    kernarg: Option<Memory>,
    writer: Mutex<KernargWriter>,
    completion: Signal,
    static_group_size: u32,
    dimensions: u8,
    executed: AtomicBool,
}

impl Dispatch {
    /// Prepares a dispatch of the kernel described by `info` on `queue`.
    ///
    /// Everything that can fail happens before the packet slot is claimed,
    /// so a failed create never leaves a hole in the ring.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        api: &Arc<HsaApi>,
        id: &str,
        queue: Arc<Queue>,
        executable: Arc<Executable>,
        info: &KernelInfo,
        setup: &DispatchSetup,
        kernarg_region: &MemoryRegion,
        policy: &WaitPolicy,
    ) -> Result<Self> {
        setup.validate()?;
        if !executable.is_frozen() {
            return Err(HsaError::InvalidExecutable(format!(
                "executable 0x{:x} must be frozen before dispatch {}",
                executable.handle(),
                id
            )));
        }

        let group_segment_size = group_offset(info.group_segment_size, setup.dynamic_group_segment_size)?;
        let private_segment_size = if info.dynamic_callstack {
            info.private_segment_size.max(DYNAMIC_CALLSTACK_PRIVATE_SIZE)
        } else {
            info.private_segment_size
        };

        let kernarg = match info.kernarg_segment_size as usize {
            0 => None,
            size => {
                let memory = kernarg_region.allocate(size)?;
                // SAFETY: freshly allocated, not yet visible to the device.
                unsafe { memory.as_mut_slice() }.fill(0);
                Some(memory)
            }
        };
        let kernarg_address = kernarg.as_ref().map_or(ptr::null_mut(), Memory::as_ptr);
        let completion = Signal::create(api.clone(), 1)?;

        let index = queue.reserve_slot(policy)?;
        let packet = queue.packet(index);

        // SAFETY: the slot at `index` belongs to this dispatch. The header
        // stays as the packet processor left it until `execute` publishes.
        unsafe {
            let raw = packet.as_ptr() as *mut u8;
            ptr::write_bytes(raw.add(2), 0, crate::queue::PACKET_SIZE - 2);
            let p = packet.as_ptr();
            (*p).workgroup_size_x = setup.workgroup_size[0];
            (*p).workgroup_size_y = setup.workgroup_size[1];
            (*p).workgroup_size_z = setup.workgroup_size[2];
            (*p).grid_size_x = setup.grid_size[0];
            (*p).grid_size_y = setup.grid_size[1];
            (*p).grid_size_z = setup.grid_size[2];
            (*p).private_segment_size = private_segment_size;
            (*p).group_segment_size = group_segment_size;
            (*p).kernel_object = info.kernel_object;
            (*p).kernarg_address = kernarg_address;
            (*p).completion_signal = completion.handle();
        }

        debug!(
            dispatch = id,
            queue = queue.id(),
            index,
            kernel_object = info.kernel_object,
            kernarg_size = info.kernarg_segment_size,
            group_segment_size,
            private_segment_size,
            "created dispatch"
        );

        Ok(Dispatch {
            id: id.to_string(),
            queue,
            _executable: executable,
            index,
            packet,
            writer: Mutex::new(KernargWriter::new(
                kernarg.as_ref().map_or(0, Memory::size),
            )),
            kernarg,
            completion,
            static_group_size: info.group_segment_size,
            dimensions: setup.dimensions,
            executed: AtomicBool::new(false),
        })
    }

    pub fn packet_index(&self) -> u64 {
        self.index
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    fn with_segment<T>(&self, f: impl FnOnce(&mut KernargWriter, &mut [u8]) -> Result<T>) -> Result<T> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if self.executed.load(Ordering::Acquire) {
            return Err(HsaError::AlreadyExecuted(self.id.clone()));
        }
        let segment: &mut [u8] = match &self.kernarg {
            // SAFETY: writes are serialized by the writer lock and the packet
            // is not yet published.
            Some(memory) => unsafe { memory.as_mut_slice() },
            None => &mut [],
        };
        f(&mut writer, segment)
    }

    pub fn push_value(&self, value: &Value) -> Result<usize> {
        let offset = self.with_segment(|w, s| w.write_value(s, value))?;
        debug!(dispatch = %self.id, offset, value = %value, "kernel argument");
        Ok(offset)
    }

    pub fn push_values(&self, values: &[Value]) -> Result<usize> {
        self.with_segment(|w, s| {
            let mut first = None;
            for value in values {
                let offset = w.write_value(s, value)?;
                first.get_or_insert(offset);
            }
            Ok(first.unwrap_or_else(|| w.offset()))
        })
    }

    /// A device address, sized per the process address model.
    pub fn push_pointer(&self, address: usize) -> Result<usize> {
        let offset = self.with_segment(|w, s| w.write_bytes(s, &address.to_ne_bytes()))?;
        debug!(dispatch = %self.id, offset, address, "pointer argument");
        Ok(offset)
    }

    /// An 8-byte opaque handle (image, sampler, signal).
    pub fn push_handle(&self, handle: u64) -> Result<usize> {
        let offset = self.with_segment(|w, s| w.write_bytes(s, &handle.to_ne_bytes()))?;
        debug!(dispatch = %self.id, offset, handle, "handle argument");
        Ok(offset)
    }

    pub fn push_group_offset(&self, dynamic_offset: u32) -> Result<usize> {
        let value = group_offset(self.static_group_size, dynamic_offset)?;
        self.push_value(&Value::U32(value))
    }

    /// Publishes the packet, rings the doorbell and waits for completion.
    pub fn execute(&self, policy: &WaitPolicy) -> Result<()> {
        {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            if self.executed.swap(true, Ordering::AcqRel) {
                return Err(HsaError::AlreadyExecuted(self.id.clone()));
            }
        }

        // SAFETY: the slot was reserved for this dispatch and all other
        // fields were written in `create`/`push_*`.
        unsafe { publish_packet(self.packet, dispatch_header(), dispatch_setup(self.dimensions)) };
        self.queue.ring_doorbell(self.index);

        let queue = &self.queue;
        self.completion
            .wait_eq_bounded(0, *policy, &format!("dispatch {}", self.id), || {
                queue.is_errored().then(|| {
                    HsaError::QueueFault(format!(
                        "queue {} faulted during dispatch",
                        queue.id()
                    ))
                })
            })?;
        debug!(dispatch = %self.id, "dispatch completed");
        Ok(())
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("id", &self.id)
            .field("queue", &self.queue.id())
            .field("index", &self.index)
            .field("executed", &self.executed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
impl Dispatch {
    pub(crate) fn kernarg_bytes(&self) -> Vec<u8> {
        self.kernarg.as_ref().map_or_else(Vec::new, |m| m.as_slice().to_vec())
    }

    pub(crate) fn packet_snapshot(&self) -> b::hsa_kernel_dispatch_packet_t {
        // SAFETY: the slot stays reserved for this dispatch.
        unsafe { self.packet.as_ptr().read() }
    }
}

// SAFETY: the packet pointer is only written before publication and under
// the writer lock.
unsafe impl Send for Dispatch {}
unsafe impl Sync for Dispatch {}
