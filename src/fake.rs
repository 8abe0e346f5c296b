//! In-process stand-in for the HSA runtime library, used by unit tests.
//!
//! Agent 1 is a CPU without kernel dispatch, agent 2 a GPU. Queues own a
//! real packet ring; storing to a doorbell runs every published packet up
//! to the stored index on the storing thread. Kernels are looked up by
//! name in [`KERNELS`]; a "BRIG" module is a NUL-terminated, comma separated
//! list of kernel names.
//!
//! Entry points are plain function pointers, so per-test configuration
//! lives in a thread local set by [`api_with`].

#![allow(clippy::missing_safety_doc)]

use crate::agent::ExceptionPolicy;
use crate::api::HsaApi;
use crate::bindings::*;
use crate::executable::Brig;
use crate::options::Profile;
use std::alloc::{self, Layout};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

pub const CPU_AGENT: u64 = 1;
pub const GPU_AGENT: u64 = 2;
pub const COARSE_REGION: u64 = 0x10;
pub const SYSTEM_REGION: u64 = 0x11;
pub const KERNARG_REGION: u64 = 0x12;
pub const QUEUE_MAX_SIZE: u32 = 128;
pub const TIMESTAMP_FREQUENCY: u64 = 1_000_000;
pub const MAX_IMAGE_WIDTH: usize = 16384;
const ISA: u64 = 0x15a;
const REGION_MAX_ALLOC: usize = 1 << 20;
const KERNEL_OBJECT_BASE: u64 = 0x4000;

#[derive(Debug, Clone, Copy)]
pub struct FakeConfig {
    pub gpu_present: bool,
    pub profile: Profile,
    pub exception_policies: ExceptionPolicy,
    pub kernarg_region: bool,
    pub image_capability: u32,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            gpu_present: true,
            profile: Profile::Full,
            exception_policies: ExceptionPolicy::DETECT,
            kernarg_region: true,
            image_capability: hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_ONLY
                | hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_WRITE_ONLY
                | hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_WRITE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    /// Writes the u32 at kernarg+8 to the address at kernarg+0.
    StoreU32,
    /// Completes without side effects.
    Complete,
    /// Never completes.
    Hang,
    /// Reports a queue error instead of completing.
    Fault,
}

struct FakeKernel {
    name: &'static str,
    kernarg: u32,
    group: u32,
    private: u32,
    dynamic_callstack: bool,
    behavior: Behavior,
}

const KERNELS: &[FakeKernel] = &[
    FakeKernel {
        name: "&store_u32",
        kernarg: 16,
        group: 0,
        private: 0,
        dynamic_callstack: false,
        behavior: Behavior::StoreU32,
    },
    FakeKernel {
        name: "&group_offset",
        kernarg: 8,
        group: 64,
        private: 0,
        dynamic_callstack: false,
        behavior: Behavior::Complete,
    },
    FakeKernel {
        name: "&recursive",
        kernarg: 0,
        group: 0,
        private: 64,
        dynamic_callstack: true,
        behavior: Behavior::Complete,
    },
    FakeKernel {
        name: "&noop",
        kernarg: 0,
        group: 0,
        private: 0,
        dynamic_callstack: false,
        behavior: Behavior::Complete,
    },
    FakeKernel {
        name: "&hang",
        kernarg: 0,
        group: 0,
        private: 0,
        dynamic_callstack: false,
        behavior: Behavior::Hang,
    },
    FakeKernel {
        name: "&fault",
        kernarg: 0,
        group: 0,
        private: 0,
        dynamic_callstack: false,
        behavior: Behavior::Fault,
    },
];

thread_local! {
    static CONFIG: Cell<FakeConfig> = Cell::new(FakeConfig::default());
    static INIT_COUNT: Cell<i64> = const { Cell::new(0) };
    static DESTROYED: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn config() -> FakeConfig {
    CONFIG.with(Cell::get)
}

fn destroyed(kind: &'static str) {
    DESTROYED.with(|log| log.borrow_mut().push(kind));
}

struct FakeImage {
    data: usize,
    extent: [usize; 3],
    pixel_size: usize,
}

#[derive(Default)]
struct World {
    allocations: HashMap<usize, Layout>,
    registered: HashMap<usize, usize>,
    signals: HashSet<u64>,
    programs: HashMap<u64, Vec<usize>>,
    code_objects: HashMap<u64, Vec<usize>>,
    executables: HashMap<u64, Vec<usize>>,
    images: HashMap<u64, FakeImage>,
    samplers: HashSet<u64>,
}

static WORLD: LazyLock<Mutex<World>> = LazyLock::new(|| Mutex::new(World::default()));
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0x100);
static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

fn world() -> MutexGuard<'static, World> {
    WORLD.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

struct FakeSignal {
    value: AtomicI64,
    // Address of the `FakeQueue` this signal is the doorbell of, or 0.
    queue: AtomicUsize,
}

#[repr(C, align(64))]
struct Slot([u8; 64]);

#[repr(C)]
struct FakeQueue {
    // Must stay first: the runtime hands out `*mut hsa_queue_t`.
    queue: hsa_queue_t,
    write_index: AtomicU64,
    read_index: AtomicU64,
    ring: Box<[Slot]>,
    callback: hsa_queue_error_callback_t,
    data: *mut c_void,
    processing: Mutex<()>,
}

unsafe fn put<T>(value: *mut c_void, v: T) {
    unsafe { (value as *mut T).write_unaligned(v) }
}

/// The fake API table. Resets this thread's configuration to the default.
pub fn api() -> HsaApi {
    api_with(FakeConfig::default())
}

pub fn api_with(config: FakeConfig) -> HsaApi {
    CONFIG.with(|c| c.set(config));
    HsaApi {
        library: None,
        library_name: "fake".to_string(),
        hsa_init: fake_init,
        hsa_shut_down: fake_shut_down,
        hsa_status_string: fake_status_string,
        hsa_system_get_info: fake_system_get_info,
        hsa_iterate_agents: fake_iterate_agents,
        hsa_agent_get_info: fake_agent_get_info,
        hsa_agent_iterate_regions: fake_agent_iterate_regions,
        hsa_agent_get_exception_policies: fake_agent_get_exception_policies,
        hsa_region_get_info: fake_region_get_info,
        hsa_memory_allocate: fake_memory_allocate,
        hsa_memory_free: fake_memory_free,
        hsa_memory_register: fake_memory_register,
        hsa_memory_deregister: fake_memory_deregister,
        hsa_queue_create: fake_queue_create,
        hsa_queue_destroy: fake_queue_destroy,
        hsa_queue_add_write_index_relaxed: fake_queue_add_write_index,
        hsa_queue_load_read_index_scacquire: fake_queue_load_read_index,
        hsa_signal_create: fake_signal_create,
        hsa_signal_destroy: fake_signal_destroy,
        hsa_signal_load_scacquire: fake_signal_load,
        hsa_signal_store_relaxed: fake_signal_store,
        hsa_signal_store_screlease: fake_signal_store,
        hsa_signal_wait_scacquire: fake_signal_wait,
        hsa_ext_program_create: fake_program_create,
        hsa_ext_program_destroy: fake_program_destroy,
        hsa_ext_program_add_module: fake_program_add_module,
        hsa_ext_program_finalize: fake_program_finalize,
        hsa_code_object_destroy: fake_code_object_destroy,
        hsa_executable_create: fake_executable_create,
        hsa_executable_destroy: fake_executable_destroy,
        hsa_executable_load_code_object: fake_executable_load_code_object,
        hsa_executable_freeze: fake_executable_freeze,
        hsa_executable_get_symbol: fake_executable_get_symbol,
        hsa_executable_iterate_symbols: fake_executable_iterate_symbols,
        hsa_executable_symbol_get_info: fake_symbol_get_info,
        hsa_ext_image_get_capability: fake_image_get_capability,
        hsa_ext_image_data_get_info: fake_image_data_get_info,
        hsa_ext_image_create: fake_image_create,
        hsa_ext_image_destroy: fake_image_destroy,
        hsa_ext_image_import: fake_image_import,
        hsa_ext_sampler_create: fake_sampler_create,
        hsa_ext_sampler_destroy: fake_sampler_destroy,
    }
}

/// A module declaring the given comma separated kernels.
pub fn brig(names: &str) -> Brig {
    let mut bytes = names.as_bytes().to_vec();
    bytes.push(0);
    Brig::new(bytes)
}

/// `hsa_init` calls minus `hsa_shut_down` calls on this thread.
pub fn init_count() -> i64 {
    INIT_COUNT.with(Cell::get)
}

/// Kinds of objects destroyed on this thread since the last call.
pub fn take_destroy_log() -> Vec<&'static str> {
    DESTROYED.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

pub fn allocation_size(address: usize) -> Option<usize> {
    world().allocations.get(&address).map(Layout::size)
}

pub fn registered_size(address: usize) -> Option<usize> {
    world().registered.get(&address).copied()
}

pub fn signal_alive(handle: u64) -> bool {
    world().signals.contains(&handle)
}

/// Reports an asynchronous error on `queue` the way the runtime would.
pub fn raise_queue_error(queue: *mut hsa_queue_t) {
    // SAFETY: test code passes a live queue created by this fake.
    let fake = unsafe { &*(queue as *const FakeQueue) };
    if let Some(callback) = fake.callback {
        // SAFETY: forwards the data pointer registered at creation.
        unsafe { callback(hsa_status_t_HSA_STATUS_ERROR_EXCEPTION, queue, fake.data) };
    }
}

/// Pixel bytes of an image, as last imported.
pub fn image_pixels(handle: u64) -> Vec<u8> {
    let world = world();
    let Some(image) = world.images.get(&handle) else {
        return Vec::new();
    };
    let len = image.extent.iter().product::<usize>() * image.pixel_size;
    // SAFETY: the image data holds 16 bytes per pixel, more than `len`.
    unsafe { std::slice::from_raw_parts(image.data as *const u8, len) }.to_vec()
}

unsafe extern "C" fn fake_init() -> hsa_status_t {
    INIT_COUNT.with(|c| c.set(c.get() + 1));
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_shut_down() -> hsa_status_t {
    INIT_COUNT.with(|c| c.set(c.get() - 1));
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_status_string(status: hsa_status_t, string: *mut *const c_char) -> hsa_status_t {
    let text: &'static CStr = match status {
        hsa_status_t_HSA_STATUS_SUCCESS => c"success",
        hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT => c"invalid argument",
        hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES => c"out of resources",
        _ => c"fake runtime error",
    };
    unsafe { *string = text.as_ptr() };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_system_get_info(attribute: hsa_system_info_t, value: *mut c_void) -> hsa_status_t {
    unsafe {
        match attribute {
            hsa_system_info_t_HSA_SYSTEM_INFO_ENDIANNESS => put::<u32>(
                value,
                if cfg!(target_endian = "little") {
                    hsa_endianness_t_HSA_ENDIANNESS_LITTLE
                } else {
                    hsa_endianness_t_HSA_ENDIANNESS_BIG
                },
            ),
            hsa_system_info_t_HSA_SYSTEM_INFO_TIMESTAMP_FREQUENCY => put::<u64>(value, TIMESTAMP_FREQUENCY),
            _ => return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT,
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_iterate_agents(callback: hsa_agent_callback_t, data: *mut c_void) -> hsa_status_t {
    let Some(callback) = callback else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    };
    let mut agents = vec![CPU_AGENT];
    if config().gpu_present {
        agents.push(GPU_AGENT);
    }
    for handle in agents {
        let status = unsafe { callback(hsa_agent_t { handle }, data) };
        if status != hsa_status_t_HSA_STATUS_SUCCESS {
            return status;
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_agent_get_info(
    agent: hsa_agent_t,
    attribute: hsa_agent_info_t,
    value: *mut c_void,
) -> hsa_status_t {
    let gpu = match agent.handle {
        GPU_AGENT => true,
        CPU_AGENT => false,
        _ => return hsa_status_t_HSA_STATUS_ERROR_INVALID_AGENT,
    };
    unsafe {
        match attribute {
            hsa_agent_info_t_HSA_AGENT_INFO_NAME => {
                let mut name = [0u8; 64];
                let text: &[u8] = if gpu { b"fake-gpu" } else { b"fake-cpu" };
                name[..text.len()].copy_from_slice(text);
                put(value, name);
            }
            hsa_agent_info_t_HSA_AGENT_INFO_FEATURE => put::<u32>(
                value,
                if gpu { hsa_agent_feature_t_HSA_AGENT_FEATURE_KERNEL_DISPATCH } else { 0 },
            ),
            hsa_agent_info_t_HSA_AGENT_INFO_DEVICE => put::<u32>(
                value,
                if gpu { hsa_device_type_t_HSA_DEVICE_TYPE_GPU } else { hsa_device_type_t_HSA_DEVICE_TYPE_CPU },
            ),
            hsa_agent_info_t_HSA_AGENT_INFO_PROFILE => put::<u32>(value, config().profile.to_hsa()),
            hsa_agent_info_t_HSA_AGENT_INFO_WAVEFRONT_SIZE => put::<u32>(value, 64),
            hsa_agent_info_t_HSA_AGENT_INFO_WORKGROUP_MAX_SIZE => put::<u32>(value, 256),
            hsa_agent_info_t_HSA_AGENT_INFO_QUEUE_MAX_SIZE => put::<u32>(value, QUEUE_MAX_SIZE),
            hsa_agent_info_t_HSA_AGENT_INFO_ISA => put(value, hsa_isa_t { handle: ISA }),
            _ => return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT,
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_agent_iterate_regions(
    agent: hsa_agent_t,
    callback: hsa_region_callback_t,
    data: *mut c_void,
) -> hsa_status_t {
    let Some(callback) = callback else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    };
    if agent.handle != GPU_AGENT && agent.handle != CPU_AGENT {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_AGENT;
    }
    let mut regions = vec![COARSE_REGION, SYSTEM_REGION];
    if config().kernarg_region {
        regions.push(KERNARG_REGION);
    }
    for handle in regions {
        let status = unsafe { callback(hsa_region_t { handle }, data) };
        if status != hsa_status_t_HSA_STATUS_SUCCESS {
            return status;
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_agent_get_exception_policies(
    _agent: hsa_agent_t,
    _profile: hsa_profile_t,
    mask: *mut u16,
) -> hsa_status_t {
    unsafe { *mask = config().exception_policies.bits() };
    hsa_status_t_HSA_STATUS_SUCCESS
}

fn region_flags(handle: u64) -> Option<u32> {
    match handle {
        COARSE_REGION => Some(hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_COARSE_GRAINED),
        SYSTEM_REGION => Some(hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_FINE_GRAINED),
        KERNARG_REGION => Some(
            hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_KERNARG
                | hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_FINE_GRAINED,
        ),
        _ => None,
    }
}

unsafe extern "C" fn fake_region_get_info(
    region: hsa_region_t,
    attribute: hsa_region_info_t,
    value: *mut c_void,
) -> hsa_status_t {
    let Some(flags) = region_flags(region.handle) else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_REGION;
    };
    unsafe {
        match attribute {
            hsa_region_info_t_HSA_REGION_INFO_SEGMENT => {
                put::<u32>(value, hsa_region_segment_t_HSA_REGION_SEGMENT_GLOBAL)
            }
            hsa_region_info_t_HSA_REGION_INFO_GLOBAL_FLAGS => put::<u32>(value, flags),
            hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_ALLOWED => put::<u8>(value, 1),
            hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_GRANULE => put::<usize>(value, 4096),
            hsa_region_info_t_HSA_REGION_INFO_ALLOC_MAX_SIZE => put::<usize>(value, REGION_MAX_ALLOC),
            _ => return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT,
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_memory_allocate(region: hsa_region_t, size: usize, ptr: *mut *mut c_void) -> hsa_status_t {
    if region_flags(region.handle).is_none() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_REGION;
    }
    if size == 0 || size > REGION_MAX_ALLOC {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ALLOCATION;
    }
    let Ok(layout) = Layout::from_size_align(size, 64) else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ALLOCATION;
    };
    // SAFETY: non-zero size.
    let memory = unsafe { alloc::alloc_zeroed(layout) };
    if memory.is_null() {
        return hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES;
    }
    world().allocations.insert(memory as usize, layout);
    unsafe { *ptr = memory as *mut c_void };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_memory_free(ptr: *mut c_void) -> hsa_status_t {
    let Some(layout) = world().allocations.remove(&(ptr as usize)) else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    };
    // SAFETY: allocated by `fake_memory_allocate` with this layout.
    unsafe { alloc::dealloc(ptr as *mut u8, layout) };
    destroyed("memory");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_memory_register(ptr: *mut c_void, size: usize) -> hsa_status_t {
    if ptr.is_null() || size == 0 {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }
    world().registered.insert(ptr as usize, size);
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_memory_deregister(ptr: *mut c_void, _size: usize) -> hsa_status_t {
    if world().registered.remove(&(ptr as usize)).is_none() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }
    destroyed("memory");
    hsa_status_t_HSA_STATUS_SUCCESS
}

fn new_signal(initial: i64, queue: usize) -> u64 {
    let signal = Box::new(FakeSignal {
        value: AtomicI64::new(initial),
        queue: AtomicUsize::new(queue),
    });
    let handle = Box::into_raw(signal) as u64;
    world().signals.insert(handle);
    handle
}

fn drop_signal(handle: u64) -> bool {
    if !world().signals.remove(&handle) {
        return false;
    }
    // SAFETY: created by `new_signal` and removed from the live set once.
    drop(unsafe { Box::from_raw(handle as *mut FakeSignal) });
    true
}

/// The live signal behind `handle`.
///
/// # Safety
///
/// The caller must keep the signal alive while the reference is used.
unsafe fn signal<'a>(handle: hsa_signal_t) -> &'a FakeSignal {
    unsafe { &*(handle.handle as *const FakeSignal) }
}

unsafe extern "C" fn fake_signal_create(
    initial_value: hsa_signal_value_t,
    _num_consumers: u32,
    _consumers: *const hsa_agent_t,
    signal: *mut hsa_signal_t,
) -> hsa_status_t {
    let handle = new_signal(initial_value, 0);
    unsafe { *signal = hsa_signal_t { handle } };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_signal_destroy(signal: hsa_signal_t) -> hsa_status_t {
    if !drop_signal(signal.handle) {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_SIGNAL;
    }
    destroyed("signal");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_signal_load(handle: hsa_signal_t) -> hsa_signal_value_t {
    unsafe { signal(handle) }.value.load(Ordering::Acquire)
}

unsafe extern "C" fn fake_signal_store(handle: hsa_signal_t, value: hsa_signal_value_t) {
    let target = unsafe { signal(handle) };
    target.value.store(value, Ordering::Release);
    let queue = target.queue.load(Ordering::Acquire);
    if queue != 0 {
        // SAFETY: doorbells are destroyed together with their queue.
        unsafe { process(&*(queue as *const FakeQueue), value as u64) };
    }
}

unsafe extern "C" fn fake_signal_wait(
    handle: hsa_signal_t,
    condition: hsa_signal_condition_t,
    compare_value: hsa_signal_value_t,
    timeout_hint: u64,
    _wait_state_hint: hsa_wait_state_t,
) -> hsa_signal_value_t {
    let target = unsafe { signal(handle) };
    // Ticks are microseconds at the fake timestamp frequency.
    let budget = Duration::from_micros(timeout_hint.min(1_000));
    let start = Instant::now();
    loop {
        let value = target.value.load(Ordering::Acquire);
        let satisfied = match condition {
            hsa_signal_condition_t_HSA_SIGNAL_CONDITION_EQ => value == compare_value,
            hsa_signal_condition_t_HSA_SIGNAL_CONDITION_NE => value != compare_value,
            hsa_signal_condition_t_HSA_SIGNAL_CONDITION_LT => value < compare_value,
            _ => value >= compare_value,
        };
        if satisfied || start.elapsed() >= budget {
            return value;
        }
        thread::sleep(Duration::from_micros(20));
    }
}

unsafe extern "C" fn fake_queue_create(
    agent: hsa_agent_t,
    size: u32,
    type_: hsa_queue_type_t,
    callback: hsa_queue_error_callback_t,
    data: *mut c_void,
    _private_segment_size: u32,
    _group_segment_size: u32,
    queue: *mut *mut hsa_queue_t,
) -> hsa_status_t {
    if agent.handle != GPU_AGENT {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_AGENT;
    }
    if !size.is_power_of_two() || size > QUEUE_MAX_SIZE {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }

    let ring: Box<[Slot]> = (0..size)
        .map(|_| {
            let mut slot = [0u8; 64];
            slot[..2].copy_from_slice(&(hsa_packet_type_t_HSA_PACKET_TYPE_INVALID as u16).to_ne_bytes());
            Slot(slot)
        })
        .collect();
    let mut fake = Box::new(FakeQueue {
        queue: hsa_queue_t {
            type_,
            features: hsa_agent_feature_t_HSA_AGENT_FEATURE_KERNEL_DISPATCH,
            #[cfg(target_pointer_width = "32")]
            reserved0: 0,
            base_address: ptr::null_mut(),
            doorbell_signal: hsa_signal_t { handle: 0 },
            size,
            reserved1: 0,
            id: NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed),
        },
        write_index: AtomicU64::new(0),
        read_index: AtomicU64::new(0),
        ring,
        callback,
        data,
        processing: Mutex::new(()),
    });
    fake.queue.base_address = fake.ring.as_mut_ptr() as *mut c_void;
    let raw = Box::into_raw(fake);
    // SAFETY: just leaked, exclusively owned here.
    unsafe {
        (*raw).queue.doorbell_signal = hsa_signal_t {
            handle: new_signal(0, raw as usize),
        };
        *queue = raw as *mut hsa_queue_t;
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_queue_destroy(queue: *mut hsa_queue_t) -> hsa_status_t {
    if queue.is_null() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_QUEUE;
    }
    // SAFETY: created by `fake_queue_create`, destroyed once.
    let fake = unsafe { Box::from_raw(queue as *mut FakeQueue) };
    drop_signal(fake.queue.doorbell_signal.handle);
    destroyed("queue");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_queue_add_write_index(queue: *const hsa_queue_t, value: u64) -> u64 {
    unsafe { &*(queue as *const FakeQueue) }
        .write_index
        .fetch_add(value, Ordering::Relaxed)
}

unsafe extern "C" fn fake_queue_load_read_index(queue: *const hsa_queue_t) -> u64 {
    unsafe { &*(queue as *const FakeQueue) }
        .read_index
        .load(Ordering::Acquire)
}

/// Runs published packets in order up to `index`. Stops at the first slot
/// that is not yet published or whose kernel never completes.
unsafe fn process(queue: &FakeQueue, index: u64) {
    let _processing = queue.processing.lock().unwrap_or_else(PoisonError::into_inner);
    loop {
        let read = queue.read_index.load(Ordering::Acquire);
        if read > index {
            return;
        }
        let slot = (read % queue.queue.size as u64) as usize;
        // SAFETY: `base_address` points at `size` slots of `ring`.
        let slot_ptr = unsafe {
            (queue.queue.base_address as *mut Slot).add(slot) as *mut hsa_kernel_dispatch_packet_t
        };
        // SAFETY: the slot is 64-byte aligned and the header word is only
        // accessed atomically once published.
        let header = unsafe { AtomicU32::from_ptr(slot_ptr as *mut u32) };
        let word = header.load(Ordering::Acquire);
        if (word & 0xff) != hsa_packet_type_t_HSA_PACKET_TYPE_KERNEL_DISPATCH {
            return;
        }
        // SAFETY: published packets are not written by producers any more.
        let packet = unsafe { slot_ptr.read() };
        let behavior = packet
            .kernel_object
            .checked_sub(KERNEL_OBJECT_BASE)
            .and_then(|i| KERNELS.get(i as usize))
            .map_or(Behavior::Complete, |k| k.behavior);

        match behavior {
            Behavior::Hang => return,
            Behavior::Fault => {
                if let Some(callback) = queue.callback {
                    // SAFETY: forwards the data pointer registered at creation.
                    unsafe {
                        callback(
                            hsa_status_t_HSA_STATUS_ERROR_EXCEPTION,
                            &queue.queue as *const hsa_queue_t as *mut hsa_queue_t,
                            queue.data,
                        )
                    };
                }
                return;
            }
            Behavior::StoreU32 => {
                let args = packet.kernarg_address as *const u8;
                if !args.is_null() {
                    // SAFETY: the kernarg segment of `&store_u32` is 16 bytes.
                    unsafe {
                        let target = (args as *const usize).read_unaligned() as *mut u32;
                        let value = (args.add(8) as *const u32).read_unaligned();
                        if !target.is_null() {
                            target.write_unaligned(value);
                        }
                    }
                }
            }
            Behavior::Complete => {}
        }

        header.store(hsa_packet_type_t_HSA_PACKET_TYPE_INVALID, Ordering::Release);
        queue.read_index.store(read + 1, Ordering::Release);
        let completion = packet.completion_signal;
        if completion.handle != 0 && world().signals.contains(&completion.handle) {
            // SAFETY: still alive, checked above.
            unsafe { signal(completion) }.value.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

fn kernel_index(name: &str) -> Option<usize> {
    KERNELS.iter().position(|k| k.name == name)
}

unsafe extern "C" fn fake_program_create(
    _machine_model: hsa_machine_model_t,
    _profile: hsa_profile_t,
    _rounding: hsa_default_float_rounding_mode_t,
    _options: hsa_options_t,
    program: *mut hsa_ext_program_t,
) -> hsa_status_t {
    let handle = next_handle();
    world().programs.insert(handle, Vec::new());
    unsafe { *program = hsa_ext_program_t { handle } };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_program_destroy(program: hsa_ext_program_t) -> hsa_status_t {
    if world().programs.remove(&program.handle).is_none() {
        return hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_PROGRAM;
    }
    destroyed("program");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_program_add_module(program: hsa_ext_program_t, module: hsa_ext_module_t) -> hsa_status_t {
    if module.is_null() {
        return hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_MODULE;
    }
    // SAFETY: fake modules are NUL terminated.
    let text = unsafe { CStr::from_ptr(module as *const c_char) }.to_string_lossy();
    let mut kernels = Vec::new();
    for name in text.split(',').filter(|n| !n.is_empty()) {
        match kernel_index(name) {
            Some(index) => kernels.push(index),
            None => return hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_MODULE,
        }
    }
    match world().programs.get_mut(&program.handle) {
        Some(list) => list.extend(kernels),
        None => return hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_PROGRAM,
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_program_finalize(
    program: hsa_ext_program_t,
    isa: hsa_isa_t,
    _call_convention: hsa_ext_finalizer_call_convention_t,
    _control_directives: hsa_ext_control_directives_t,
    _options: hsa_options_t,
    _code_object_type: hsa_code_object_type_t,
    code_object: *mut hsa_code_object_t,
) -> hsa_status_t {
    if isa.handle != ISA {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ISA;
    }
    let mut world = world();
    let Some(kernels) = world.programs.get(&program.handle).cloned() else {
        return hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_PROGRAM;
    };
    let handle = next_handle();
    world.code_objects.insert(handle, kernels);
    unsafe { *code_object = hsa_code_object_t { handle } };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_code_object_destroy(code_object: hsa_code_object_t) -> hsa_status_t {
    if world().code_objects.remove(&code_object.handle).is_none() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_CODE_OBJECT;
    }
    destroyed("code_object");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_executable_create(
    _profile: hsa_profile_t,
    _state: hsa_executable_state_t,
    _options: hsa_options_t,
    executable: *mut hsa_executable_t,
) -> hsa_status_t {
    let handle = next_handle();
    world().executables.insert(handle, Vec::new());
    unsafe { *executable = hsa_executable_t { handle } };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_executable_destroy(executable: hsa_executable_t) -> hsa_status_t {
    if world().executables.remove(&executable.handle).is_none() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE;
    }
    destroyed("executable");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_executable_load_code_object(
    executable: hsa_executable_t,
    _agent: hsa_agent_t,
    code_object: hsa_code_object_t,
    _options: hsa_options_t,
) -> hsa_status_t {
    let mut world = world();
    let Some(kernels) = world.code_objects.get(&code_object.handle).cloned() else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_CODE_OBJECT;
    };
    match world.executables.get_mut(&executable.handle) {
        Some(list) => list.extend(kernels),
        None => return hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE,
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_executable_freeze(executable: hsa_executable_t, _options: hsa_options_t) -> hsa_status_t {
    if !world().executables.contains_key(&executable.handle) {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE;
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

// Symbol handles carry the kernel index in the low byte.
fn symbol_handle(executable: u64, kernel: usize) -> u64 {
    (executable << 8) | (kernel as u64 + 1)
}

fn symbol_kernel(symbol: u64) -> Option<(u64, &'static FakeKernel)> {
    let index = ((symbol & 0xff) as usize).checked_sub(1)?;
    KERNELS.get(index).map(|k| (index as u64, k))
}

unsafe extern "C" fn fake_executable_get_symbol(
    executable: hsa_executable_t,
    _module_name: *const c_char,
    symbol_name: *const c_char,
    _agent: hsa_agent_t,
    _call_convention: i32,
    symbol: *mut hsa_executable_symbol_t,
) -> hsa_status_t {
    // SAFETY: callers pass a NUL terminated name.
    let name = unsafe { CStr::from_ptr(symbol_name) }.to_string_lossy();
    let world = world();
    let Some(kernels) = world.executables.get(&executable.handle) else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE;
    };
    match kernels.iter().find(|&&k| KERNELS[k].name == name) {
        Some(&kernel) => {
            unsafe {
                *symbol = hsa_executable_symbol_t {
                    handle: symbol_handle(executable.handle, kernel),
                }
            };
            hsa_status_t_HSA_STATUS_SUCCESS
        }
        None => hsa_status_t_HSA_STATUS_ERROR_INVALID_SYMBOL_NAME,
    }
}

unsafe extern "C" fn fake_executable_iterate_symbols(
    executable: hsa_executable_t,
    callback: hsa_executable_symbol_callback_t,
    data: *mut c_void,
) -> hsa_status_t {
    let Some(callback) = callback else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    };
    // Released before calling back into the caller.
    let Some(kernels) = world().executables.get(&executable.handle).cloned() else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE;
    };
    for kernel in kernels {
        let symbol = hsa_executable_symbol_t {
            handle: symbol_handle(executable.handle, kernel),
        };
        let status = unsafe { callback(executable, symbol, data) };
        if status != hsa_status_t_HSA_STATUS_SUCCESS {
            return status;
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_symbol_get_info(
    symbol: hsa_executable_symbol_t,
    attribute: hsa_executable_symbol_info_t,
    value: *mut c_void,
) -> hsa_status_t {
    let Some((index, kernel)) = symbol_kernel(symbol.handle) else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    };
    unsafe {
        match attribute {
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_TYPE => {
                put::<u32>(value, hsa_symbol_kind_t_HSA_SYMBOL_KIND_KERNEL)
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_NAME_LENGTH => {
                put::<u32>(value, kernel.name.len() as u32)
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_NAME => {
                ptr::copy_nonoverlapping(kernel.name.as_ptr(), value as *mut u8, kernel.name.len())
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_KERNARG_SEGMENT_SIZE => {
                put::<u32>(value, kernel.kernarg)
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_GROUP_SEGMENT_SIZE => {
                put::<u32>(value, kernel.group)
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_PRIVATE_SEGMENT_SIZE => {
                put::<u32>(value, kernel.private)
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_DYNAMIC_CALLSTACK => {
                put::<u8>(value, kernel.dynamic_callstack as u8)
            }
            hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_OBJECT => {
                put::<u64>(value, KERNEL_OBJECT_BASE + index)
            }
            _ => return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT,
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

fn descriptor_extent(descriptor: &hsa_ext_image_descriptor_t) -> [usize; 3] {
    let w = descriptor.width.max(1);
    let h = descriptor.height.max(1);
    let d = descriptor.depth.max(1);
    let layers = descriptor.array_size.max(1);
    match descriptor.geometry {
        hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2D
        | hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DDEPTH => [w, h, 1],
        hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_3D => [w, h, d],
        hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1DA => [w, layers, 1],
        hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DA
        | hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DADEPTH => [w, h, layers],
        _ => [w, 1, 1],
    }
}

unsafe extern "C" fn fake_image_get_capability(
    _agent: hsa_agent_t,
    _geometry: hsa_ext_image_geometry_t,
    _format: *const hsa_ext_image_format_t,
    capability_mask: *mut u32,
) -> hsa_status_t {
    unsafe { *capability_mask = config().image_capability };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_image_data_get_info(
    _agent: hsa_agent_t,
    descriptor: *const hsa_ext_image_descriptor_t,
    _access_permission: hsa_access_permission_t,
    info: *mut hsa_ext_image_data_info_t,
) -> hsa_status_t {
    let extent = descriptor_extent(unsafe { &*descriptor });
    unsafe {
        *info = hsa_ext_image_data_info_t {
            size: extent.iter().product::<usize>() * 16,
            alignment: 256,
        }
    };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_image_create(
    _agent: hsa_agent_t,
    descriptor: *const hsa_ext_image_descriptor_t,
    image_data: *const c_void,
    _access_permission: hsa_access_permission_t,
    image: *mut hsa_ext_image_t,
) -> hsa_status_t {
    let descriptor = unsafe { &*descriptor };
    if descriptor.width > MAX_IMAGE_WIDTH {
        return hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES;
    }
    if image_data.is_null() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }
    let handle = next_handle();
    world().images.insert(handle, FakeImage {
        data: image_data as usize,
        extent: descriptor_extent(descriptor),
        pixel_size: 0,
    });
    unsafe { *image = hsa_ext_image_t { handle } };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_image_destroy(_agent: hsa_agent_t, image: hsa_ext_image_t) -> hsa_status_t {
    if world().images.remove(&image.handle).is_none() {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }
    destroyed("image");
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_image_import(
    _agent: hsa_agent_t,
    src_memory: *const c_void,
    src_row_pitch: usize,
    src_slice_pitch: usize,
    dst_image: hsa_ext_image_t,
    image_region: *const hsa_ext_image_region_t,
) -> hsa_status_t {
    let region = unsafe { &*image_region };
    let mut world = world();
    let Some(image) = world.images.get_mut(&dst_image.handle) else {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    };
    if region.range.x == 0 {
        return hsa_status_t_HSA_STATUS_SUCCESS;
    }
    let pixel_size = src_row_pitch / region.range.x as usize;
    if pixel_size == 0 || pixel_size > 16 {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }
    image.pixel_size = pixel_size;
    let [width, height, _] = image.extent;
    for z in 0..region.range.z as usize {
        for y in 0..region.range.y as usize {
            let src = z * src_slice_pitch + y * src_row_pitch;
            let (dx, dy, dz) = (
                region.offset.x as usize,
                region.offset.y as usize + y,
                region.offset.z as usize + z,
            );
            let dst = ((dz * height + dy) * width + dx) * pixel_size;
            // SAFETY: the caller checked the region against the extent and
            // the image data holds 16 bytes per pixel.
            unsafe {
                ptr::copy_nonoverlapping(
                    (src_memory as *const u8).add(src),
                    (image.data as *mut u8).add(dst),
                    src_row_pitch,
                )
            };
        }
    }
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_sampler_create(
    _agent: hsa_agent_t,
    _descriptor: *const hsa_ext_sampler_descriptor_t,
    sampler: *mut hsa_ext_sampler_t,
) -> hsa_status_t {
    let handle = next_handle();
    world().samplers.insert(handle);
    unsafe { *sampler = hsa_ext_sampler_t { handle } };
    hsa_status_t_HSA_STATUS_SUCCESS
}

unsafe extern "C" fn fake_sampler_destroy(_agent: hsa_agent_t, sampler: hsa_ext_sampler_t) -> hsa_status_t {
    if !world().samplers.remove(&sampler.handle) {
        return hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT;
    }
    destroyed("sampler");
    hsa_status_t_HSA_STATUS_SUCCESS
}
