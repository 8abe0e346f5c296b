use crate::agent::Agent;
use crate::api::HsaApi;
use crate::bindings;
use crate::error::{HsaError, Result};
use crate::options::Profile;
use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};

/// An assembled BRIG module. The bytes are produced elsewhere and handed to
/// the finalizer untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct Brig {
    bytes: Arc<[u8]>,
}

impl Brig {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn module(&self) -> bindings::hsa_ext_module_t {
        self.bytes.as_ptr() as *mut c_void
    }
}

impl std::fmt::Debug for Brig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brig").field("len", &self.bytes.len()).finish()
    }
}

fn machine_model() -> bindings::hsa_machine_model_t {
    if cfg!(target_pointer_width = "64") {
        bindings::hsa_machine_model_t_HSA_MACHINE_MODEL_LARGE
    } else {
        bindings::hsa_machine_model_t_HSA_MACHINE_MODEL_SMALL
    }
}

pub struct Program {
    api: Arc<HsaApi>,
    handle: bindings::hsa_ext_program_t,
    // The finalizer reads module bytes in place until the program is gone.
    modules: Mutex<Vec<Brig>>,
}

impl Program {
    pub fn create(api: Arc<HsaApi>, profile: Profile) -> Result<Self> {
        let mut handle = bindings::hsa_ext_program_t { handle: 0 };
        // SAFETY: plain out-parameter, no options.
        let status = unsafe {
            (api.hsa_ext_program_create)(
                machine_model(),
                profile.to_hsa(),
                bindings::hsa_default_float_rounding_mode_t_HSA_DEFAULT_FLOAT_ROUNDING_MODE_NEAR,
                ptr::null(),
                &mut handle,
            )
        };
        api.check(status, "hsa_ext_program_create")?;
        debug!(program = handle.handle, ?profile, "created program");
        Ok(Self {
            api,
            handle,
            modules: Mutex::new(Vec::new()),
        })
    }

    pub fn handle(&self) -> u64 {
        self.handle.handle
    }

    pub fn add_module(&self, brig: &Brig) -> Result<()> {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: the module bytes are kept alive in `modules`.
        let status = unsafe { (self.api.hsa_ext_program_add_module)(self.handle, brig.module()) };
        self.api.check(status, "hsa_ext_program_add_module")?;
        modules.push(brig.clone());
        debug!(program = self.handle.handle, bytes = brig.len(), "added module to program");
        Ok(())
    }

    /// Finalizes the program for `isa` with zeroed control directives.
    pub fn finalize(&self, isa: bindings::hsa_isa_t) -> Result<CodeObject> {
        let mut code_object = bindings::hsa_code_object_t { handle: 0 };
        // SAFETY: plain out-parameter; directives are passed by value.
        let status = unsafe {
            (self.api.hsa_ext_program_finalize)(
                self.handle,
                isa,
                0,
                bindings::hsa_ext_control_directives_t::default(),
                ptr::null(),
                bindings::hsa_code_object_type_t_HSA_CODE_OBJECT_TYPE_PROGRAM,
                &mut code_object,
            )
        };
        self.api.check(status, "hsa_ext_program_finalize")?;
        debug!(
            program = self.handle.handle,
            code_object = code_object.handle,
            "finalized program"
        );
        Ok(CodeObject {
            api: self.api.clone(),
            handle: code_object,
        })
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        debug!(program = self.handle.handle, "destroying program");
        // SAFETY: created in `create`, destroyed once.
        let status = unsafe { (self.api.hsa_ext_program_destroy)(self.handle) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy program: {}", self.api.status_string(status));
        }
    }
}

pub struct CodeObject {
    api: Arc<HsaApi>,
    handle: bindings::hsa_code_object_t,
}

impl CodeObject {
    pub fn handle(&self) -> u64 {
        self.handle.handle
    }
}

impl Drop for CodeObject {
    fn drop(&mut self) {
        debug!(code_object = self.handle.handle, "destroying code object");
        // SAFETY: produced by finalize, destroyed once.
        let status = unsafe { (self.api.hsa_code_object_destroy)(self.handle) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy code object: {}", self.api.status_string(status));
        }
    }
}

pub struct Executable {
    api: Arc<HsaApi>,
    handle: bindings::hsa_executable_t,
    frozen: AtomicBool,
}

impl Executable {
    pub fn create(api: Arc<HsaApi>, profile: Profile) -> Result<Self> {
        let mut handle = bindings::hsa_executable_t { handle: 0 };
        // SAFETY: plain out-parameter, no options.
        let status = unsafe {
            (api.hsa_executable_create)(
                profile.to_hsa(),
                bindings::hsa_executable_state_t_HSA_EXECUTABLE_STATE_UNFROZEN,
                ptr::null(),
                &mut handle,
            )
        };
        api.check(status, "hsa_executable_create")?;
        debug!(executable = handle.handle, "created executable");
        Ok(Executable {
            api,
            handle,
            frozen: AtomicBool::new(false),
        })
    }

    pub fn handle(&self) -> u64 {
        self.handle.handle
    }

    pub fn load_code_object(&self, agent: &Agent, code_object: &CodeObject) -> Result<()> {
        // SAFETY: all handles are live.
        let status = unsafe {
            (self.api.hsa_executable_load_code_object)(
                self.handle,
                agent.handle,
                code_object.handle,
                ptr::null(),
            )
        };
        self.api.check(status, "hsa_executable_load_code_object")?;
        debug!(
            executable = self.handle.handle,
            code_object = code_object.handle.handle,
            "loaded code object"
        );
        Ok(())
    }

    pub fn freeze(&self) -> Result<()> {
        // SAFETY: live executable, no options.
        let status = unsafe { (self.api.hsa_executable_freeze)(self.handle, ptr::null()) };
        self.api.check(status, "hsa_executable_freeze")?;
        self.frozen.store(true, Ordering::Release);
        debug!(executable = self.handle.handle, "froze executable");
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn get_kernel_symbol(&self, name: &str, agent: &Agent) -> Result<KernelSymbol> {
        let c_name = CString::new(name).map_err(|_| {
            HsaError::InvalidArgument(format!("kernel name {:?} contains a NUL byte", name))
        })?;
        let mut symbol = bindings::hsa_executable_symbol_t { handle: 0 };

        // SAFETY: `c_name` outlives the call.
        let status = unsafe {
            (self.api.hsa_executable_get_symbol)(
                self.handle,
                ptr::null(),
                c_name.as_ptr(),
                agent.handle,
                0,
                &mut symbol,
            )
        };
        self.api
            .check(status, "hsa_executable_get_symbol")
            .map_err(|e| HsaError::KernelNotFound(format!("{}: {}", name, e)))?;

        Ok(KernelSymbol {
            api: self.api.clone(),
            handle: symbol,
            name: name.to_string(),
        })
    }

    /// The only kernel symbol in the executable.
    pub fn unique_kernel_symbol(&self) -> Result<KernelSymbol> {
        let mut kernels = Collect {
            api: self.api.as_ref(),
            kernels: Vec::new(),
            status: bindings::hsa_status_t_HSA_STATUS_SUCCESS,
        };
        // SAFETY: `kernels` outlives the iteration.
        let status = unsafe {
            (self.api.hsa_executable_iterate_symbols)(
                self.handle,
                Some(collect_kernels_callback),
                &mut kernels as *mut Collect<'_> as *mut c_void,
            )
        };
        self.api.check(status, "hsa_executable_iterate_symbols")?;
        self.api.check(kernels.status, "hsa_executable_symbol_get_info")?;

        let mut found = kernels.kernels.into_iter();
        match (found.next(), found.next()) {
            (Some(handle), None) => {
                let mut symbol = KernelSymbol {
                    api: self.api.clone(),
                    handle,
                    name: String::new(),
                };
                symbol.name = symbol.query_name()?;
                Ok(symbol)
            }
            (None, _) => Err(HsaError::KernelNotFound(format!(
                "no kernel symbol in executable 0x{:x}",
                self.handle.handle
            ))),
            (Some(_), Some(_)) => Err(HsaError::AmbiguousKernel(format!(
                "0x{:x}",
                self.handle.handle
            ))),
        }
    }
}

impl Drop for Executable {
    fn drop(&mut self) {
        debug!(executable = self.handle.handle, "destroying executable");
        // SAFETY: created in `create`, destroyed once.
        let status = unsafe { (self.api.hsa_executable_destroy)(self.handle) };
        if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy executable: {}", self.api.status_string(status));
        }
    }
}

struct Collect<'a> {
    api: &'a HsaApi,
    kernels: Vec<bindings::hsa_executable_symbol_t>,
    status: bindings::hsa_status_t,
}

unsafe extern "C" fn collect_kernels_callback(
    _executable: bindings::hsa_executable_t,
    symbol: bindings::hsa_executable_symbol_t,
    data: *mut c_void,
) -> bindings::hsa_status_t {
    // SAFETY: `data` is the `Collect` passed by `unique_kernel_symbol`.
    let collect = unsafe { &mut *(data as *mut Collect<'_>) };

    let mut kind: bindings::hsa_symbol_kind_t = 0;
    let status = unsafe {
        (collect.api.hsa_executable_symbol_get_info)(
            symbol,
            bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_TYPE,
            &mut kind as *mut _ as *mut c_void,
        )
    };
    if status != bindings::hsa_status_t_HSA_STATUS_SUCCESS {
        collect.status = status;
        return bindings::hsa_status_t_HSA_STATUS_INFO_BREAK;
    }

    if kind == bindings::hsa_symbol_kind_t_HSA_SYMBOL_KIND_KERNEL {
        collect.kernels.push(symbol);
    }
    bindings::hsa_status_t_HSA_STATUS_SUCCESS
}

/// Launch requirements of a finalized kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelInfo {
    pub kernel_object: u64,
    pub kernarg_segment_size: u32,
    pub group_segment_size: u32,
    pub private_segment_size: u32,
    pub dynamic_callstack: bool,
}

pub struct KernelSymbol {
    api: Arc<HsaApi>,
    handle: bindings::hsa_executable_symbol_t,
    name: String,
}

impl KernelSymbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn get_info<T: Copy + Default>(
        &self,
        attribute: bindings::hsa_executable_symbol_info_t,
        what: &str,
    ) -> Result<T> {
        let mut value = T::default();
        // SAFETY: `T` matches the attribute's documented type.
        let status = unsafe {
            (self.api.hsa_executable_symbol_get_info)(
                self.handle,
                attribute,
                &mut value as *mut T as *mut c_void,
            )
        };
        self.api.check(status, what)?;
        Ok(value)
    }

    fn query_name(&self) -> Result<String> {
        let len: u32 = self.get_info(
            bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_NAME_LENGTH,
            "symbol name length",
        )?;
        let mut name = vec![0 as c_char; len as usize + 1];
        // SAFETY: the buffer holds `len` bytes plus a terminator.
        let status = unsafe {
            (self.api.hsa_executable_symbol_get_info)(
                self.handle,
                bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_NAME,
                name.as_mut_ptr() as *mut c_void,
            )
        };
        self.api.check(status, "symbol name")?;
        let bytes: Vec<u8> = name[..len as usize].iter().map(|&c| c as u8).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn kernel_object(&self) -> Result<u64> {
        self.get_info(
            bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_OBJECT,
            "kernel object",
        )
    }

    pub fn info(&self) -> Result<KernelInfo> {
        let dynamic_callstack: u8 = self.get_info(
            bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_DYNAMIC_CALLSTACK,
            "kernel dynamic callstack",
        )?;
        let info = KernelInfo {
            kernel_object: self.kernel_object()?,
            kernarg_segment_size: self.get_info(
                bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_KERNARG_SEGMENT_SIZE,
                "kernel kernarg segment size",
            )?,
            group_segment_size: self.get_info(
                bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_GROUP_SEGMENT_SIZE,
                "kernel group segment size",
            )?,
            private_segment_size: self.get_info(
                bindings::hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_PRIVATE_SEGMENT_SIZE,
                "kernel private segment size",
            )?,
            dynamic_callstack: dynamic_callstack != 0,
        };
        debug!(kernel = %self.name, ?info, "kernel metadata");
        Ok(info)
    }
}
