//! Runtime API table resolved from the native HSA library at run time.
//!
//! Nothing links against `libhsa-runtime64` at build time. [`HsaApi::load`]
//! opens the library and resolves every entry point the dispatch core uses.
//! A missing symbol aborts the whole table build: a partially resolved
//! table is never handed out.

#![allow(clippy::type_complexity)]

use crate::bindings::*;
use crate::error::{HsaError, Result};
use libloading::{Library, Symbol};
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use tracing::{debug, error};

pub struct HsaApi {
    // Keeps the code the pointers below point into mapped.
    pub(crate) library: Option<Library>,
    pub(crate) library_name: String,

    pub(crate) hsa_init: unsafe extern "C" fn() -> hsa_status_t,
    pub(crate) hsa_shut_down: unsafe extern "C" fn() -> hsa_status_t,
    pub(crate) hsa_status_string:
        unsafe extern "C" fn(status: hsa_status_t, string: *mut *const c_char) -> hsa_status_t,
    pub(crate) hsa_system_get_info:
        unsafe extern "C" fn(attribute: hsa_system_info_t, value: *mut c_void) -> hsa_status_t,

    pub(crate) hsa_iterate_agents:
        unsafe extern "C" fn(callback: hsa_agent_callback_t, data: *mut c_void) -> hsa_status_t,
    pub(crate) hsa_agent_get_info: unsafe extern "C" fn(
        agent: hsa_agent_t,
        attribute: hsa_agent_info_t,
        value: *mut c_void,
    ) -> hsa_status_t,
    pub(crate) hsa_agent_iterate_regions: unsafe extern "C" fn(
        agent: hsa_agent_t,
        callback: hsa_region_callback_t,
        data: *mut c_void,
    ) -> hsa_status_t,
    pub(crate) hsa_agent_get_exception_policies:
        unsafe extern "C" fn(agent: hsa_agent_t, profile: hsa_profile_t, mask: *mut u16) -> hsa_status_t,

    pub(crate) hsa_region_get_info: unsafe extern "C" fn(
        region: hsa_region_t,
        attribute: hsa_region_info_t,
        value: *mut c_void,
    ) -> hsa_status_t,
    pub(crate) hsa_memory_allocate:
        unsafe extern "C" fn(region: hsa_region_t, size: usize, ptr: *mut *mut c_void) -> hsa_status_t,
    pub(crate) hsa_memory_free: unsafe extern "C" fn(ptr: *mut c_void) -> hsa_status_t,
    pub(crate) hsa_memory_register:
        unsafe extern "C" fn(ptr: *mut c_void, size: usize) -> hsa_status_t,
    pub(crate) hsa_memory_deregister:
        unsafe extern "C" fn(ptr: *mut c_void, size: usize) -> hsa_status_t,

    pub(crate) hsa_queue_create: unsafe extern "C" fn(
        agent: hsa_agent_t,
        size: u32,
        type_: hsa_queue_type_t,
        callback: hsa_queue_error_callback_t,
        data: *mut c_void,
        private_segment_size: u32,
        group_segment_size: u32,
        queue: *mut *mut hsa_queue_t,
    ) -> hsa_status_t,
    pub(crate) hsa_queue_destroy: unsafe extern "C" fn(queue: *mut hsa_queue_t) -> hsa_status_t,
    pub(crate) hsa_queue_add_write_index_relaxed:
        unsafe extern "C" fn(queue: *const hsa_queue_t, value: u64) -> u64,
    pub(crate) hsa_queue_load_read_index_scacquire:
        unsafe extern "C" fn(queue: *const hsa_queue_t) -> u64,

    pub(crate) hsa_signal_create: unsafe extern "C" fn(
        initial_value: hsa_signal_value_t,
        num_consumers: u32,
        consumers: *const hsa_agent_t,
        signal: *mut hsa_signal_t,
    ) -> hsa_status_t,
    pub(crate) hsa_signal_destroy: unsafe extern "C" fn(signal: hsa_signal_t) -> hsa_status_t,
    pub(crate) hsa_signal_load_scacquire:
        unsafe extern "C" fn(signal: hsa_signal_t) -> hsa_signal_value_t,
    pub(crate) hsa_signal_store_relaxed:
        unsafe extern "C" fn(signal: hsa_signal_t, value: hsa_signal_value_t),
    pub(crate) hsa_signal_store_screlease:
        unsafe extern "C" fn(signal: hsa_signal_t, value: hsa_signal_value_t),
    pub(crate) hsa_signal_wait_scacquire: unsafe extern "C" fn(
        signal: hsa_signal_t,
        condition: hsa_signal_condition_t,
        compare_value: hsa_signal_value_t,
        timeout_hint: u64,
        wait_state_hint: hsa_wait_state_t,
    ) -> hsa_signal_value_t,

    pub(crate) hsa_ext_program_create: unsafe extern "C" fn(
        machine_model: hsa_machine_model_t,
        profile: hsa_profile_t,
        default_float_rounding_mode: hsa_default_float_rounding_mode_t,
        options: hsa_options_t,
        program: *mut hsa_ext_program_t,
    ) -> hsa_status_t,
    pub(crate) hsa_ext_program_destroy:
        unsafe extern "C" fn(program: hsa_ext_program_t) -> hsa_status_t,
    pub(crate) hsa_ext_program_add_module:
        unsafe extern "C" fn(program: hsa_ext_program_t, module: hsa_ext_module_t) -> hsa_status_t,
    pub(crate) hsa_ext_program_finalize: unsafe extern "C" fn(
        program: hsa_ext_program_t,
        isa: hsa_isa_t,
        call_convention: hsa_ext_finalizer_call_convention_t,
        control_directives: hsa_ext_control_directives_t,
        options: hsa_options_t,
        code_object_type: hsa_code_object_type_t,
        code_object: *mut hsa_code_object_t,
    ) -> hsa_status_t,
    pub(crate) hsa_code_object_destroy:
        unsafe extern "C" fn(code_object: hsa_code_object_t) -> hsa_status_t,

    pub(crate) hsa_executable_create: unsafe extern "C" fn(
        profile: hsa_profile_t,
        executable_state: hsa_executable_state_t,
        options: hsa_options_t,
        executable: *mut hsa_executable_t,
    ) -> hsa_status_t,
    pub(crate) hsa_executable_destroy:
        unsafe extern "C" fn(executable: hsa_executable_t) -> hsa_status_t,
    pub(crate) hsa_executable_load_code_object: unsafe extern "C" fn(
        executable: hsa_executable_t,
        agent: hsa_agent_t,
        code_object: hsa_code_object_t,
        options: hsa_options_t,
    ) -> hsa_status_t,
    pub(crate) hsa_executable_freeze:
        unsafe extern "C" fn(executable: hsa_executable_t, options: hsa_options_t) -> hsa_status_t,
    pub(crate) hsa_executable_get_symbol: unsafe extern "C" fn(
        executable: hsa_executable_t,
        module_name: *const c_char,
        symbol_name: *const c_char,
        agent: hsa_agent_t,
        call_convention: i32,
        symbol: *mut hsa_executable_symbol_t,
    ) -> hsa_status_t,
    pub(crate) hsa_executable_iterate_symbols: unsafe extern "C" fn(
        executable: hsa_executable_t,
        callback: hsa_executable_symbol_callback_t,
        data: *mut c_void,
    ) -> hsa_status_t,
    pub(crate) hsa_executable_symbol_get_info: unsafe extern "C" fn(
        symbol: hsa_executable_symbol_t,
        attribute: hsa_executable_symbol_info_t,
        value: *mut c_void,
    ) -> hsa_status_t,

    pub(crate) hsa_ext_image_get_capability: unsafe extern "C" fn(
        agent: hsa_agent_t,
        geometry: hsa_ext_image_geometry_t,
        format: *const hsa_ext_image_format_t,
        capability_mask: *mut u32,
    ) -> hsa_status_t,
    pub(crate) hsa_ext_image_data_get_info: unsafe extern "C" fn(
        agent: hsa_agent_t,
        descriptor: *const hsa_ext_image_descriptor_t,
        access_permission: hsa_access_permission_t,
        info: *mut hsa_ext_image_data_info_t,
    ) -> hsa_status_t,
    pub(crate) hsa_ext_image_create: unsafe extern "C" fn(
        agent: hsa_agent_t,
        descriptor: *const hsa_ext_image_descriptor_t,
        image_data: *const c_void,
        access_permission: hsa_access_permission_t,
        image: *mut hsa_ext_image_t,
    ) -> hsa_status_t,
    pub(crate) hsa_ext_image_destroy:
        unsafe extern "C" fn(agent: hsa_agent_t, image: hsa_ext_image_t) -> hsa_status_t,
    pub(crate) hsa_ext_image_import: unsafe extern "C" fn(
        agent: hsa_agent_t,
        src_memory: *const c_void,
        src_row_pitch: usize,
        src_slice_pitch: usize,
        dst_image: hsa_ext_image_t,
        image_region: *const hsa_ext_image_region_t,
    ) -> hsa_status_t,
    pub(crate) hsa_ext_sampler_create: unsafe extern "C" fn(
        agent: hsa_agent_t,
        descriptor: *const hsa_ext_sampler_descriptor_t,
        sampler: *mut hsa_ext_sampler_t,
    ) -> hsa_status_t,
    pub(crate) hsa_ext_sampler_destroy:
        unsafe extern "C" fn(agent: hsa_agent_t, sampler: hsa_ext_sampler_t) -> hsa_status_t,
}

// SAFETY: the table only holds plain function pointers into a loaded
// library; the HSA entry points are thread safe.
unsafe impl Send for HsaApi {}
unsafe impl Sync for HsaApi {}

impl std::fmt::Debug for HsaApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HsaApi")
            .field("library", &self.library_name)
            .finish_non_exhaustive()
    }
}

/// Resolves one entry point; the caller aborts the table build on error.
fn symbol<T: Copy>(library: &Library, library_name: &str, name: &str) -> Result<T> {
    // SAFETY: `T` is the function pointer type declared for `name` in the
    // HSA headers.
    let sym: Symbol<'_, T> = unsafe { library.get(name.as_bytes()) }.map_err(|e| {
        error!(library = library_name, symbol = name, "symbol lookup failed: {}", e);
        HsaError::SymbolNotFound {
            library: library_name.to_string(),
            symbol: name.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(*sym)
}

impl HsaApi {
    /// Opens `library_name` and resolves the full API table.
    pub fn load(library_name: &str) -> Result<Self> {
        debug!(library = library_name, "loading HSA runtime library");

        // SAFETY: loading the runtime runs its initializers, which is what
        // any HSA client does.
        let library = unsafe { Library::new(library_name) }.map_err(|e| {
            error!(library = library_name, "failed to load runtime library: {}", e);
            HsaError::LibraryLoad {
                library: library_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        macro_rules! resolve {
            ($($name:ident),* $(,)?) => {
                HsaApi {
                    $($name: symbol(&library, library_name, stringify!($name))?,)*
                    library_name: library_name.to_string(),
                    library: None,
                }
            };
        }

        let mut api = resolve!(
            hsa_init,
            hsa_shut_down,
            hsa_status_string,
            hsa_system_get_info,
            hsa_iterate_agents,
            hsa_agent_get_info,
            hsa_agent_iterate_regions,
            hsa_agent_get_exception_policies,
            hsa_region_get_info,
            hsa_memory_allocate,
            hsa_memory_free,
            hsa_memory_register,
            hsa_memory_deregister,
            hsa_queue_create,
            hsa_queue_destroy,
            hsa_queue_add_write_index_relaxed,
            hsa_queue_load_read_index_scacquire,
            hsa_signal_create,
            hsa_signal_destroy,
            hsa_signal_load_scacquire,
            hsa_signal_store_relaxed,
            hsa_signal_store_screlease,
            hsa_signal_wait_scacquire,
            hsa_ext_program_create,
            hsa_ext_program_destroy,
            hsa_ext_program_add_module,
            hsa_ext_program_finalize,
            hsa_code_object_destroy,
            hsa_executable_create,
            hsa_executable_destroy,
            hsa_executable_load_code_object,
            hsa_executable_freeze,
            hsa_executable_get_symbol,
            hsa_executable_iterate_symbols,
            hsa_executable_symbol_get_info,
            hsa_ext_image_get_capability,
            hsa_ext_image_data_get_info,
            hsa_ext_image_create,
            hsa_ext_image_destroy,
            hsa_ext_image_import,
            hsa_ext_sampler_create,
            hsa_ext_sampler_destroy,
        );
        api.library = Some(library);

        debug!(library = library_name, "HSA API table resolved");
        Ok(api)
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    /// Human readable text for a status code, as reported by the runtime.
    pub fn status_string(&self, status: hsa_status_t) -> String {
        let mut string: *const c_char = std::ptr::null();
        // SAFETY: the runtime writes a pointer to a static string.
        let result = unsafe { (self.hsa_status_string)(status, &mut string) };

        if result == hsa_status_t_HSA_STATUS_SUCCESS && !string.is_null() {
            // SAFETY: non-null pointer to a NUL terminated static string.
            match unsafe { CStr::from_ptr(string) }.to_str() {
                Ok(s) => s.to_string(),
                Err(_) => format!("HSA status code: 0x{:x}", status),
            }
        } else {
            format!("HSA status code: 0x{:x}", status)
        }
    }

    /// The single reporting path for native failures: logs the status code
    /// with its description and turns it into an error.
    pub fn check(&self, status: hsa_status_t, what: &str) -> Result<()> {
        if status == hsa_status_t_HSA_STATUS_SUCCESS {
            return Ok(());
        }
        let description = self.status_string(status);
        error!(status, "{} failed: {}", what, description);
        Err(HsaError::from_status_with_context(status, description, what))
    }

    /// Like [`check`](Self::check) but also accepts `HSA_STATUS_INFO_BREAK`,
    /// which iteration functions return when a callback stopped early.
    pub fn check_iteration(&self, status: hsa_status_t, what: &str) -> Result<()> {
        if status == hsa_status_t_HSA_STATUS_INFO_BREAK {
            return Ok(());
        }
        self.check(status, what)
    }

    /// Reads a fixed-size system attribute.
    pub(crate) fn system_info<T: Copy + Default>(
        &self,
        attribute: hsa_system_info_t,
        what: &str,
    ) -> Result<T> {
        let mut value = T::default();
        // SAFETY: `T` matches the attribute's documented type.
        let status =
            unsafe { (self.hsa_system_get_info)(attribute, &mut value as *mut T as *mut c_void) };
        self.check(status, what)?;
        Ok(value)
    }
}

impl Drop for HsaApi {
    fn drop(&mut self) {
        if self.library.is_some() {
            debug!(library = %self.library_name, "unloading HSA runtime library");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_fatal() {
        let err = HsaApi::load("libhexl-does-not-exist.so.0").unwrap_err();
        assert!(matches!(err, HsaError::LibraryLoad { ref library, .. }
            if library == "libhexl-does-not-exist.so.0"));
    }

    #[test]
    fn check_passes_success_and_reports_failure() {
        let api = crate::fake::api();
        assert!(api.check(hsa_status_t_HSA_STATUS_SUCCESS, "noop").is_ok());
        let err = api
            .check(hsa_status_t_HSA_STATUS_ERROR_INVALID_QUEUE, "hsa_queue_destroy")
            .unwrap_err();
        assert!(matches!(err, HsaError::InvalidQueue(ref s) if s.starts_with("hsa_queue_destroy")));
    }

    #[test]
    fn info_break_is_not_an_error_for_iteration() {
        let api = crate::fake::api();
        assert!(api
            .check_iteration(hsa_status_t_HSA_STATUS_INFO_BREAK, "hsa_iterate_agents")
            .is_ok());
        assert!(api.check(hsa_status_t_HSA_STATUS_INFO_BREAK, "other").is_err());
    }
}
