//! Hand-declared subset of the HSA 1.0 runtime ABI (`hsa.h`,
//! `hsa_ext_finalize.h`, `hsa_ext_image.h`).
//!
//! Names follow bindgen's conventions so the code reads the same as when it
//! was generated from the headers. Layouts must match the C definitions
//! bit for bit: the queue ring and dispatch packets are shared with the
//! packet processor.

#![allow(non_camel_case_types, non_upper_case_globals, dead_code)]

use std::os::raw::{c_char, c_int, c_void};

pub type hsa_status_t = u32;
pub const hsa_status_t_HSA_STATUS_SUCCESS: hsa_status_t = 0x0;
pub const hsa_status_t_HSA_STATUS_INFO_BREAK: hsa_status_t = 0x1;
pub const hsa_status_t_HSA_STATUS_ERROR: hsa_status_t = 0x1000;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT: hsa_status_t = 0x1001;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_QUEUE_CREATION: hsa_status_t = 0x1002;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_ALLOCATION: hsa_status_t = 0x1003;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_AGENT: hsa_status_t = 0x1004;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_REGION: hsa_status_t = 0x1005;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_SIGNAL: hsa_status_t = 0x1006;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_QUEUE: hsa_status_t = 0x1007;
pub const hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES: hsa_status_t = 0x1008;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_PACKET_FORMAT: hsa_status_t = 0x1009;
pub const hsa_status_t_HSA_STATUS_ERROR_RESOURCE_FREE: hsa_status_t = 0x100A;
pub const hsa_status_t_HSA_STATUS_ERROR_NOT_INITIALIZED: hsa_status_t = 0x100B;
pub const hsa_status_t_HSA_STATUS_ERROR_REFCOUNT_OVERFLOW: hsa_status_t = 0x100C;
pub const hsa_status_t_HSA_STATUS_ERROR_INCOMPATIBLE_ARGUMENTS: hsa_status_t = 0x100D;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_INDEX: hsa_status_t = 0x100E;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_ISA: hsa_status_t = 0x100F;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_CODE_OBJECT: hsa_status_t = 0x1010;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE: hsa_status_t = 0x1011;
pub const hsa_status_t_HSA_STATUS_ERROR_FROZEN_EXECUTABLE: hsa_status_t = 0x1012;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_SYMBOL_NAME: hsa_status_t = 0x1013;
pub const hsa_status_t_HSA_STATUS_ERROR_VARIABLE_ALREADY_DEFINED: hsa_status_t = 0x1014;
pub const hsa_status_t_HSA_STATUS_ERROR_VARIABLE_UNDEFINED: hsa_status_t = 0x1015;
pub const hsa_status_t_HSA_STATUS_ERROR_EXCEPTION: hsa_status_t = 0x1016;
pub const hsa_status_t_HSA_STATUS_ERROR_INVALID_ISA_NAME: hsa_status_t = 0x1017;
pub const hsa_status_t_HSA_STATUS_ERROR_FATAL: hsa_status_t = 0x1026;

pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_PROGRAM: hsa_status_t = 0x2000;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INVALID_MODULE: hsa_status_t = 0x2001;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_INCOMPATIBLE_MODULE: hsa_status_t = 0x2002;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_MODULE_ALREADY_INCLUDED: hsa_status_t = 0x2003;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_SYMBOL_MISMATCH: hsa_status_t = 0x2004;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_FINALIZATION_FAILED: hsa_status_t = 0x2005;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_DIRECTIVE_MISMATCH: hsa_status_t = 0x2006;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_IMAGE_FORMAT_UNSUPPORTED: hsa_status_t = 0x3000;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_IMAGE_SIZE_UNSUPPORTED: hsa_status_t = 0x3001;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_IMAGE_PITCH_UNSUPPORTED: hsa_status_t = 0x3002;
pub const hsa_ext_status_t_HSA_EXT_STATUS_ERROR_SAMPLER_DESCRIPTOR_UNSUPPORTED: hsa_status_t =
    0x3003;

pub type hsa_endianness_t = u32;
pub const hsa_endianness_t_HSA_ENDIANNESS_LITTLE: hsa_endianness_t = 0;
pub const hsa_endianness_t_HSA_ENDIANNESS_BIG: hsa_endianness_t = 1;

pub type hsa_machine_model_t = u32;
pub const hsa_machine_model_t_HSA_MACHINE_MODEL_SMALL: hsa_machine_model_t = 0;
pub const hsa_machine_model_t_HSA_MACHINE_MODEL_LARGE: hsa_machine_model_t = 1;

pub type hsa_profile_t = u32;
pub const hsa_profile_t_HSA_PROFILE_BASE: hsa_profile_t = 0;
pub const hsa_profile_t_HSA_PROFILE_FULL: hsa_profile_t = 1;

pub type hsa_system_info_t = u32;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_VERSION_MAJOR: hsa_system_info_t = 0;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_VERSION_MINOR: hsa_system_info_t = 1;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_TIMESTAMP: hsa_system_info_t = 2;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_TIMESTAMP_FREQUENCY: hsa_system_info_t = 3;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_SIGNAL_MAX_WAIT: hsa_system_info_t = 4;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_ENDIANNESS: hsa_system_info_t = 5;
pub const hsa_system_info_t_HSA_SYSTEM_INFO_MACHINE_MODEL: hsa_system_info_t = 6;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_agent_t {
    pub handle: u64,
}

pub type hsa_agent_feature_t = u32;
pub const hsa_agent_feature_t_HSA_AGENT_FEATURE_KERNEL_DISPATCH: hsa_agent_feature_t = 1;
pub const hsa_agent_feature_t_HSA_AGENT_FEATURE_AGENT_DISPATCH: hsa_agent_feature_t = 2;

pub type hsa_device_type_t = u32;
pub const hsa_device_type_t_HSA_DEVICE_TYPE_CPU: hsa_device_type_t = 0;
pub const hsa_device_type_t_HSA_DEVICE_TYPE_GPU: hsa_device_type_t = 1;
pub const hsa_device_type_t_HSA_DEVICE_TYPE_DSP: hsa_device_type_t = 2;

pub type hsa_default_float_rounding_mode_t = u32;
pub const hsa_default_float_rounding_mode_t_HSA_DEFAULT_FLOAT_ROUNDING_MODE_DEFAULT:
    hsa_default_float_rounding_mode_t = 0;
pub const hsa_default_float_rounding_mode_t_HSA_DEFAULT_FLOAT_ROUNDING_MODE_ZERO:
    hsa_default_float_rounding_mode_t = 1;
pub const hsa_default_float_rounding_mode_t_HSA_DEFAULT_FLOAT_ROUNDING_MODE_NEAR:
    hsa_default_float_rounding_mode_t = 2;

pub type hsa_agent_info_t = u32;
pub const hsa_agent_info_t_HSA_AGENT_INFO_NAME: hsa_agent_info_t = 0;
pub const hsa_agent_info_t_HSA_AGENT_INFO_VENDOR_NAME: hsa_agent_info_t = 1;
pub const hsa_agent_info_t_HSA_AGENT_INFO_FEATURE: hsa_agent_info_t = 2;
pub const hsa_agent_info_t_HSA_AGENT_INFO_MACHINE_MODEL: hsa_agent_info_t = 3;
pub const hsa_agent_info_t_HSA_AGENT_INFO_PROFILE: hsa_agent_info_t = 4;
pub const hsa_agent_info_t_HSA_AGENT_INFO_DEFAULT_FLOAT_ROUNDING_MODE: hsa_agent_info_t = 5;
pub const hsa_agent_info_t_HSA_AGENT_INFO_WAVEFRONT_SIZE: hsa_agent_info_t = 6;
pub const hsa_agent_info_t_HSA_AGENT_INFO_WORKGROUP_MAX_DIM: hsa_agent_info_t = 7;
pub const hsa_agent_info_t_HSA_AGENT_INFO_WORKGROUP_MAX_SIZE: hsa_agent_info_t = 8;
pub const hsa_agent_info_t_HSA_AGENT_INFO_GRID_MAX_DIM: hsa_agent_info_t = 9;
pub const hsa_agent_info_t_HSA_AGENT_INFO_GRID_MAX_SIZE: hsa_agent_info_t = 10;
pub const hsa_agent_info_t_HSA_AGENT_INFO_FBARRIER_MAX_SIZE: hsa_agent_info_t = 11;
pub const hsa_agent_info_t_HSA_AGENT_INFO_QUEUES_MAX: hsa_agent_info_t = 12;
pub const hsa_agent_info_t_HSA_AGENT_INFO_QUEUE_MIN_SIZE: hsa_agent_info_t = 13;
pub const hsa_agent_info_t_HSA_AGENT_INFO_QUEUE_MAX_SIZE: hsa_agent_info_t = 14;
pub const hsa_agent_info_t_HSA_AGENT_INFO_QUEUE_TYPE: hsa_agent_info_t = 15;
pub const hsa_agent_info_t_HSA_AGENT_INFO_NODE: hsa_agent_info_t = 16;
pub const hsa_agent_info_t_HSA_AGENT_INFO_DEVICE: hsa_agent_info_t = 17;
pub const hsa_agent_info_t_HSA_AGENT_INFO_CACHE_SIZE: hsa_agent_info_t = 18;
pub const hsa_agent_info_t_HSA_AGENT_INFO_ISA: hsa_agent_info_t = 19;

pub type hsa_exception_policy_t = u32;
pub const hsa_exception_policy_t_HSA_EXCEPTION_POLICY_BREAK: hsa_exception_policy_t = 1;
pub const hsa_exception_policy_t_HSA_EXCEPTION_POLICY_DETECT: hsa_exception_policy_t = 2;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_signal_t {
    pub handle: u64,
}

pub type hsa_signal_value_t = i64;

pub type hsa_signal_condition_t = u32;
pub const hsa_signal_condition_t_HSA_SIGNAL_CONDITION_EQ: hsa_signal_condition_t = 0;
pub const hsa_signal_condition_t_HSA_SIGNAL_CONDITION_NE: hsa_signal_condition_t = 1;
pub const hsa_signal_condition_t_HSA_SIGNAL_CONDITION_LT: hsa_signal_condition_t = 2;
pub const hsa_signal_condition_t_HSA_SIGNAL_CONDITION_GTE: hsa_signal_condition_t = 3;

pub type hsa_wait_state_t = u32;
pub const hsa_wait_state_t_HSA_WAIT_STATE_BLOCKED: hsa_wait_state_t = 0;
pub const hsa_wait_state_t_HSA_WAIT_STATE_ACTIVE: hsa_wait_state_t = 1;

pub type hsa_queue_type_t = u32;
pub const hsa_queue_type_t_HSA_QUEUE_TYPE_MULTI: hsa_queue_type_t = 0;
pub const hsa_queue_type_t_HSA_QUEUE_TYPE_SINGLE: hsa_queue_type_t = 1;

/// User mode queue as laid out by the runtime.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct hsa_queue_t {
    pub type_: hsa_queue_type_t,
    pub features: u32,
    #[cfg(target_pointer_width = "32")]
    pub reserved0: u32,
    pub base_address: *mut c_void,
    pub doorbell_signal: hsa_signal_t,
    pub size: u32,
    pub reserved1: u32,
    pub id: u64,
}

pub type hsa_packet_type_t = u32;
pub const hsa_packet_type_t_HSA_PACKET_TYPE_VENDOR_SPECIFIC: hsa_packet_type_t = 0;
pub const hsa_packet_type_t_HSA_PACKET_TYPE_INVALID: hsa_packet_type_t = 1;
pub const hsa_packet_type_t_HSA_PACKET_TYPE_KERNEL_DISPATCH: hsa_packet_type_t = 2;
pub const hsa_packet_type_t_HSA_PACKET_TYPE_BARRIER_AND: hsa_packet_type_t = 3;
pub const hsa_packet_type_t_HSA_PACKET_TYPE_AGENT_DISPATCH: hsa_packet_type_t = 4;
pub const hsa_packet_type_t_HSA_PACKET_TYPE_BARRIER_OR: hsa_packet_type_t = 5;

pub type hsa_fence_scope_t = u32;
pub const hsa_fence_scope_t_HSA_FENCE_SCOPE_NONE: hsa_fence_scope_t = 0;
pub const hsa_fence_scope_t_HSA_FENCE_SCOPE_AGENT: hsa_fence_scope_t = 1;
pub const hsa_fence_scope_t_HSA_FENCE_SCOPE_SYSTEM: hsa_fence_scope_t = 2;

pub type hsa_packet_header_t = u32;
pub const hsa_packet_header_t_HSA_PACKET_HEADER_TYPE: hsa_packet_header_t = 0;
pub const hsa_packet_header_t_HSA_PACKET_HEADER_BARRIER: hsa_packet_header_t = 8;
pub const hsa_packet_header_t_HSA_PACKET_HEADER_SCACQUIRE_FENCE_SCOPE: hsa_packet_header_t = 9;
pub const hsa_packet_header_t_HSA_PACKET_HEADER_SCRELEASE_FENCE_SCOPE: hsa_packet_header_t = 11;

pub type hsa_kernel_dispatch_packet_setup_t = u32;
pub const hsa_kernel_dispatch_packet_setup_t_HSA_KERNEL_DISPATCH_PACKET_SETUP_DIMENSIONS:
    hsa_kernel_dispatch_packet_setup_t = 0;

/// AQL kernel dispatch packet, 64 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct hsa_kernel_dispatch_packet_t {
    pub header: u16,
    pub setup: u16,
    pub workgroup_size_x: u16,
    pub workgroup_size_y: u16,
    pub workgroup_size_z: u16,
    pub reserved0: u16,
    pub grid_size_x: u32,
    pub grid_size_y: u32,
    pub grid_size_z: u32,
    pub private_segment_size: u32,
    pub group_segment_size: u32,
    pub kernel_object: u64,
    pub kernarg_address: *mut c_void,
    #[cfg(target_pointer_width = "32")]
    pub reserved1: u32,
    pub reserved2: u64,
    pub completion_signal: hsa_signal_t,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_region_t {
    pub handle: u64,
}

pub type hsa_region_segment_t = u32;
pub const hsa_region_segment_t_HSA_REGION_SEGMENT_GLOBAL: hsa_region_segment_t = 0;
pub const hsa_region_segment_t_HSA_REGION_SEGMENT_READONLY: hsa_region_segment_t = 1;
pub const hsa_region_segment_t_HSA_REGION_SEGMENT_PRIVATE: hsa_region_segment_t = 2;
pub const hsa_region_segment_t_HSA_REGION_SEGMENT_GROUP: hsa_region_segment_t = 3;

pub type hsa_region_global_flag_t = u32;
pub const hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_KERNARG: hsa_region_global_flag_t = 1;
pub const hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_FINE_GRAINED: hsa_region_global_flag_t =
    2;
pub const hsa_region_global_flag_t_HSA_REGION_GLOBAL_FLAG_COARSE_GRAINED:
    hsa_region_global_flag_t = 4;

pub type hsa_region_info_t = u32;
pub const hsa_region_info_t_HSA_REGION_INFO_SEGMENT: hsa_region_info_t = 0;
pub const hsa_region_info_t_HSA_REGION_INFO_GLOBAL_FLAGS: hsa_region_info_t = 1;
pub const hsa_region_info_t_HSA_REGION_INFO_SIZE: hsa_region_info_t = 2;
pub const hsa_region_info_t_HSA_REGION_INFO_ALLOC_MAX_SIZE: hsa_region_info_t = 4;
pub const hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_ALLOWED: hsa_region_info_t = 5;
pub const hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_GRANULE: hsa_region_info_t = 6;
pub const hsa_region_info_t_HSA_REGION_INFO_RUNTIME_ALLOC_ALIGNMENT: hsa_region_info_t = 7;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_isa_t {
    pub handle: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_code_object_t {
    pub handle: u64,
}

pub type hsa_code_object_type_t = u32;
pub const hsa_code_object_type_t_HSA_CODE_OBJECT_TYPE_PROGRAM: hsa_code_object_type_t = 0;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_executable_t {
    pub handle: u64,
}

pub type hsa_executable_state_t = u32;
pub const hsa_executable_state_t_HSA_EXECUTABLE_STATE_UNFROZEN: hsa_executable_state_t = 0;
pub const hsa_executable_state_t_HSA_EXECUTABLE_STATE_FROZEN: hsa_executable_state_t = 1;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_executable_symbol_t {
    pub handle: u64,
}

pub type hsa_symbol_kind_t = u32;
pub const hsa_symbol_kind_t_HSA_SYMBOL_KIND_VARIABLE: hsa_symbol_kind_t = 0;
pub const hsa_symbol_kind_t_HSA_SYMBOL_KIND_KERNEL: hsa_symbol_kind_t = 1;
pub const hsa_symbol_kind_t_HSA_SYMBOL_KIND_INDIRECT_FUNCTION: hsa_symbol_kind_t = 2;

pub type hsa_executable_symbol_info_t = u32;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_TYPE:
    hsa_executable_symbol_info_t = 0;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_NAME_LENGTH:
    hsa_executable_symbol_info_t = 1;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_NAME:
    hsa_executable_symbol_info_t = 2;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_KERNARG_SEGMENT_SIZE:
    hsa_executable_symbol_info_t = 11;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_KERNARG_SEGMENT_ALIGNMENT:
    hsa_executable_symbol_info_t = 12;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_GROUP_SEGMENT_SIZE:
    hsa_executable_symbol_info_t = 13;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_PRIVATE_SEGMENT_SIZE:
    hsa_executable_symbol_info_t = 14;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_DYNAMIC_CALLSTACK:
    hsa_executable_symbol_info_t = 15;
pub const hsa_executable_symbol_info_t_HSA_EXECUTABLE_SYMBOL_INFO_KERNEL_OBJECT:
    hsa_executable_symbol_info_t = 22;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_dim3_t {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

// Finalizer extension.

/// Pointer to an assembled BRIG module.
pub type hsa_ext_module_t = *mut c_void;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_program_t {
    pub handle: u64,
}

pub type hsa_ext_finalizer_call_convention_t = c_int;
pub const hsa_ext_finalizer_call_convention_t_HSA_EXT_FINALIZER_CALL_CONVENTION_AUTO:
    hsa_ext_finalizer_call_convention_t = -1;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct hsa_ext_control_directives_t {
    pub control_directives_mask: u64,
    pub break_exceptions_mask: u16,
    pub detect_exceptions_mask: u16,
    pub max_dynamic_group_size: u32,
    pub max_flat_grid_size: u64,
    pub max_flat_workgroup_size: u32,
    pub reserved1: u32,
    pub required_grid_size: [u64; 3],
    pub required_workgroup_size: hsa_dim3_t,
    pub required_dim: u8,
    pub reserved2: [u8; 75],
}

impl Default for hsa_ext_control_directives_t {
    fn default() -> Self {
        Self {
            control_directives_mask: 0,
            break_exceptions_mask: 0,
            detect_exceptions_mask: 0,
            max_dynamic_group_size: 0,
            max_flat_grid_size: 0,
            max_flat_workgroup_size: 0,
            reserved1: 0,
            required_grid_size: [0; 3],
            required_workgroup_size: hsa_dim3_t::default(),
            required_dim: 0,
            reserved2: [0; 75],
        }
    }
}

// Image extension.

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_image_t {
    pub handle: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_sampler_t {
    pub handle: u64,
}

pub type hsa_ext_image_geometry_t = u32;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1D: hsa_ext_image_geometry_t = 0;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2D: hsa_ext_image_geometry_t = 1;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_3D: hsa_ext_image_geometry_t = 2;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1DA: hsa_ext_image_geometry_t = 3;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DA: hsa_ext_image_geometry_t = 4;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1DB: hsa_ext_image_geometry_t = 5;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DDEPTH: hsa_ext_image_geometry_t = 6;
pub const hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DADEPTH: hsa_ext_image_geometry_t = 7;

pub type hsa_ext_image_channel_type_t = u32;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SNORM_INT8:
    hsa_ext_image_channel_type_t = 0;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SNORM_INT16:
    hsa_ext_image_channel_type_t = 1;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT8:
    hsa_ext_image_channel_type_t = 2;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT16:
    hsa_ext_image_channel_type_t = 3;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT24:
    hsa_ext_image_channel_type_t = 4;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_SHORT_555:
    hsa_ext_image_channel_type_t = 5;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_SHORT_565:
    hsa_ext_image_channel_type_t = 6;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT_101010:
    hsa_ext_image_channel_type_t = 7;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SIGNED_INT8:
    hsa_ext_image_channel_type_t = 8;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SIGNED_INT16:
    hsa_ext_image_channel_type_t = 9;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SIGNED_INT32:
    hsa_ext_image_channel_type_t = 10;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNSIGNED_INT8:
    hsa_ext_image_channel_type_t = 11;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNSIGNED_INT16:
    hsa_ext_image_channel_type_t = 12;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNSIGNED_INT32:
    hsa_ext_image_channel_type_t = 13;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_HALF_FLOAT:
    hsa_ext_image_channel_type_t = 14;
pub const hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_FLOAT:
    hsa_ext_image_channel_type_t = 15;

pub type hsa_ext_image_channel_order_t = u32;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_A:
    hsa_ext_image_channel_order_t = 0;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_R:
    hsa_ext_image_channel_order_t = 1;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RX:
    hsa_ext_image_channel_order_t = 2;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RG:
    hsa_ext_image_channel_order_t = 3;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGX:
    hsa_ext_image_channel_order_t = 4;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RA:
    hsa_ext_image_channel_order_t = 5;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGB:
    hsa_ext_image_channel_order_t = 6;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGBX:
    hsa_ext_image_channel_order_t = 7;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGBA:
    hsa_ext_image_channel_order_t = 8;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_BGRA:
    hsa_ext_image_channel_order_t = 9;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_ARGB:
    hsa_ext_image_channel_order_t = 10;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_ABGR:
    hsa_ext_image_channel_order_t = 11;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SRGB:
    hsa_ext_image_channel_order_t = 12;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SRGBX:
    hsa_ext_image_channel_order_t = 13;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SRGBA:
    hsa_ext_image_channel_order_t = 14;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SBGRA:
    hsa_ext_image_channel_order_t = 15;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_INTENSITY:
    hsa_ext_image_channel_order_t = 16;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_LUMINANCE:
    hsa_ext_image_channel_order_t = 17;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_DEPTH:
    hsa_ext_image_channel_order_t = 18;
pub const hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_DEPTH_STENCIL:
    hsa_ext_image_channel_order_t = 19;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_image_format_t {
    pub channel_type: hsa_ext_image_channel_type_t,
    pub channel_order: hsa_ext_image_channel_order_t,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_image_descriptor_t {
    pub geometry: hsa_ext_image_geometry_t,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub array_size: usize,
    pub format: hsa_ext_image_format_t,
}

pub type hsa_ext_image_capability_t = u32;
pub const hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_NOT_SUPPORTED:
    hsa_ext_image_capability_t = 0x0;
pub const hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_ONLY:
    hsa_ext_image_capability_t = 0x1;
pub const hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_WRITE_ONLY:
    hsa_ext_image_capability_t = 0x2;
pub const hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_WRITE:
    hsa_ext_image_capability_t = 0x4;
pub const hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_MODIFY_WRITE:
    hsa_ext_image_capability_t = 0x8;

pub type hsa_access_permission_t = u32;
pub const hsa_access_permission_t_HSA_ACCESS_PERMISSION_RO: hsa_access_permission_t = 1;
pub const hsa_access_permission_t_HSA_ACCESS_PERMISSION_WO: hsa_access_permission_t = 2;
pub const hsa_access_permission_t_HSA_ACCESS_PERMISSION_RW: hsa_access_permission_t = 3;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_image_data_info_t {
    pub size: usize,
    pub alignment: usize,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_image_region_t {
    pub offset: hsa_dim3_t,
    pub range: hsa_dim3_t,
}

pub type hsa_ext_sampler_addressing_mode_t = u32;
pub const hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_UNDEFINED:
    hsa_ext_sampler_addressing_mode_t = 0;
pub const hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_CLAMP_TO_EDGE:
    hsa_ext_sampler_addressing_mode_t = 1;
pub const hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_CLAMP_TO_BORDER:
    hsa_ext_sampler_addressing_mode_t = 2;
pub const hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_REPEAT:
    hsa_ext_sampler_addressing_mode_t = 3;
pub const hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_MIRRORED_REPEAT:
    hsa_ext_sampler_addressing_mode_t = 4;

pub type hsa_ext_sampler_coordinate_mode_t = u32;
pub const hsa_ext_sampler_coordinate_mode_t_HSA_EXT_SAMPLER_COORDINATE_MODE_UNNORMALIZED:
    hsa_ext_sampler_coordinate_mode_t = 0;
pub const hsa_ext_sampler_coordinate_mode_t_HSA_EXT_SAMPLER_COORDINATE_MODE_NORMALIZED:
    hsa_ext_sampler_coordinate_mode_t = 1;

pub type hsa_ext_sampler_filter_mode_t = u32;
pub const hsa_ext_sampler_filter_mode_t_HSA_EXT_SAMPLER_FILTER_MODE_NEAREST:
    hsa_ext_sampler_filter_mode_t = 0;
pub const hsa_ext_sampler_filter_mode_t_HSA_EXT_SAMPLER_FILTER_MODE_LINEAR:
    hsa_ext_sampler_filter_mode_t = 1;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct hsa_ext_sampler_descriptor_t {
    pub coordinate_mode: hsa_ext_sampler_coordinate_mode_t,
    pub filter_mode: hsa_ext_sampler_filter_mode_t,
    pub address_mode: hsa_ext_sampler_addressing_mode_t,
}

// Callback signatures.

pub type hsa_agent_callback_t =
    Option<unsafe extern "C" fn(agent: hsa_agent_t, data: *mut c_void) -> hsa_status_t>;

pub type hsa_region_callback_t =
    Option<unsafe extern "C" fn(region: hsa_region_t, data: *mut c_void) -> hsa_status_t>;

pub type hsa_queue_error_callback_t = Option<
    unsafe extern "C" fn(status: hsa_status_t, source: *mut hsa_queue_t, data: *mut c_void),
>;

pub type hsa_executable_symbol_callback_t = Option<
    unsafe extern "C" fn(
        executable: hsa_executable_t,
        symbol: hsa_executable_symbol_t,
        data: *mut c_void,
    ) -> hsa_status_t,
>;

pub type hsa_options_t = *const c_char;
