use crate::agent::Agent;
use crate::api::HsaApi;
use crate::bindings;
use crate::error::{HsaError, Result};
use crate::signal::WaitPolicy;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, error};

/// AQL packets are 64 bytes; the ring is an array of them.
pub const PACKET_SIZE: usize = 64;

pub struct Queue {
    api: Arc<HsaApi>,
    ptr: NonNull<bindings::hsa_queue_t>,
    // Handed to the runtime as callback data; outlives the native queue
    // because `Drop` destroys the queue before fields are dropped.
    error: Arc<AtomicBool>,
}

impl Queue {
    /// Creates a multi-producer queue on `agent`. With `report_errors` the
    /// runtime's asynchronous error callback marks this queue as errored.
    pub fn create(api: Arc<HsaApi>, agent: &Agent, size: u32, report_errors: bool) -> Result<Self> {
        let error = Arc::new(AtomicBool::new(false));
        let (callback, data): (bindings::hsa_queue_error_callback_t, *mut c_void) = if report_errors
        {
            (Some(queue_error_callback), Arc::as_ptr(&error) as *mut c_void)
        } else {
            (None, ptr::null_mut())
        };

        let mut queue_ptr = ptr::null_mut();
        // SAFETY: `data` points at an `AtomicBool` kept alive by `error` for
        // the queue's whole lifetime.
        let status = unsafe {
            (api.hsa_queue_create)(
                agent.handle,
                size,
                bindings::hsa_queue_type_t_HSA_QUEUE_TYPE_MULTI,
                callback,
                data,
                u32::MAX,
                u32::MAX,
                &mut queue_ptr,
            )
        };
        if let Err(e) = api.check(status, "hsa_queue_create") {
            return Err(HsaError::QueueCreationFailed(e.to_string()));
        }
        let ptr = NonNull::new(queue_ptr).ok_or_else(|| {
            HsaError::QueueCreationFailed("hsa_queue_create returned a null queue".to_string())
        })?;

        let queue = Queue { api, ptr, error };
        debug!(
            queue = queue.id(),
            size = queue.size(),
            doorbell = queue.doorbell().handle,
            "created queue"
        );
        Ok(queue)
    }

    pub fn as_ptr(&self) -> *mut bindings::hsa_queue_t {
        self.ptr.as_ptr()
    }

    pub fn get(&self) -> &bindings::hsa_queue_t {
        // SAFETY: the runtime keeps the queue structure alive until destroy.
        unsafe { self.ptr.as_ref() }
    }

    pub fn id(&self) -> u64 {
        self.get().id
    }

    pub fn size(&self) -> u32 {
        self.get().size
    }

    pub fn doorbell(&self) -> bindings::hsa_signal_t {
        self.get().doorbell_signal
    }

    pub fn is_errored(&self) -> bool {
        self.error.load(Ordering::Acquire)
    }

    pub fn mark_errored(&self) {
        self.error.store(true, Ordering::Release);
    }

    pub fn add_write_index(&self, value: u64) -> u64 {
        // SAFETY: live queue.
        unsafe { (self.api.hsa_queue_add_write_index_relaxed)(self.as_ptr(), value) }
    }

    pub fn load_read_index(&self) -> u64 {
        // SAFETY: live queue.
        unsafe { (self.api.hsa_queue_load_read_index_scacquire)(self.as_ptr()) }
    }

    /// Claims the next packet slot.
    ///
    /// The fetch-add on the write index hands every caller a distinct
    /// index. If the ring is full the caller then waits for the packet
    /// processor to catch up, bounded by `policy.timeout`.
    pub fn reserve_slot(&self, policy: &WaitPolicy) -> Result<u64> {
        let index = self.add_write_index(1);
        let size = self.size() as u64;
        let start = Instant::now();
        while index.wrapping_sub(self.load_read_index()) >= size {
            if self.is_errored() {
                return Err(HsaError::QueueFault(format!(
                    "queue {} faulted while waiting for a free slot",
                    self.id()
                )));
            }
            let elapsed = start.elapsed();
            if elapsed >= policy.timeout {
                error!(queue = self.id(), index, "no free packet slot");
                return Err(HsaError::Timeout {
                    what: format!("free slot in queue {}", self.id()),
                    elapsed_ms: elapsed.as_millis(),
                });
            }
            thread::yield_now();
        }
        debug!(queue = self.id(), index, "reserved packet slot");
        Ok(index)
    }

    /// The packet at ring position `index`.
    pub fn packet(&self, index: u64) -> NonNull<bindings::hsa_kernel_dispatch_packet_t> {
        let queue = self.get();
        let slot = (index % queue.size as u64) as usize;
        // SAFETY: `base_address` is an array of `size` packets and `slot`
        // is in range.
        unsafe {
            let packet = (queue.base_address as *mut u8).add(slot * PACKET_SIZE);
            NonNull::new_unchecked(packet as *mut bindings::hsa_kernel_dispatch_packet_t)
        }
    }

    /// Tells the packet processor that packets up to `index` are ready.
    pub fn ring_doorbell(&self, index: u64) {
        debug!(queue = self.id(), index, "ringing doorbell");
        // SAFETY: the doorbell is owned by the queue and live with it.
        unsafe { (self.api.hsa_signal_store_screlease)(self.doorbell(), index as i64) }
    }
}

/// Publishes a packet by storing `header` and `setup` as one 32-bit release
/// store, so every field written before becomes visible to the packet
/// processor no later than the header.
///
/// # Safety
///
/// `packet` must point at a reserved slot of a live queue.
pub unsafe fn publish_packet(
    packet: NonNull<bindings::hsa_kernel_dispatch_packet_t>,
    header: u16,
    setup: u16,
) {
    let word = header as u32 | ((setup as u32) << 16);
    // SAFETY: header and setup are the first, 4-byte aligned, 4 bytes of
    // the packet.
    let atomic = unsafe { AtomicU32::from_ptr(packet.as_ptr() as *mut u32) };
    atomic.store(word, Ordering::Release);
}

unsafe extern "C" fn queue_error_callback(
    status: bindings::hsa_status_t,
    source: *mut bindings::hsa_queue_t,
    data: *mut c_void,
) {
    if data.is_null() {
        return;
    }
    // SAFETY: `data` is the `AtomicBool` registered in `Queue::create`.
    let flag = unsafe { &*(data as *const AtomicBool) };
    flag.store(true, Ordering::Release);

    let id = if source.is_null() {
        0
    } else {
        // SAFETY: the runtime passes the live queue that faulted.
        unsafe { (*source).id }
    };
    error!(status, queue = id, "queue error reported by runtime");
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("id", &self.id())
            .field("size", &self.size())
            .field("errored", &self.is_errored())
            .finish()
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        debug!(queue = self.id(), "destroying queue");
        // SAFETY: created in `create`, destroyed once.
        let status = unsafe { (self.api.hsa_queue_destroy)(self.as_ptr()) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy queue: {}", self.api.status_string(status));
        }
    }
}

unsafe impl Send for Queue {}
unsafe impl Sync for Queue {}
