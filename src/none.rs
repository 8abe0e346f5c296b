//! Backend that accepts every operation and touches no device.

use crate::error::Result;
use crate::runtime::{DispatchArgType, RuntimeContext, RuntimeState, TestStatus};
use crate::store::ValueStore;
use crate::validate::Comparison;
use crate::value::ValueType;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NoneContext;

impl NoneContext {
    pub fn new() -> Self {
        Self
    }
}

impl RuntimeContext for NoneContext {
    fn description(&self) -> String {
        "none".to_string()
    }

    fn is_full_profile(&self) -> bool {
        true
    }

    fn is_little_endian(&self) -> bool {
        cfg!(target_endian = "little")
    }

    fn wavesize(&self) -> u32 {
        64
    }

    fn waves_per_group(&self) -> u32 {
        4
    }

    fn new_state(self: Arc<Self>, _store: Arc<ValueStore>) -> Arc<dyn RuntimeState> {
        Arc::new(NoneState)
    }
}

#[derive(Debug, Default)]
pub struct NoneState;

macro_rules! accept {
    ($name:literal) => {{
        debug!(operation = $name, "none runtime");
        Ok(())
    }};
}

impl RuntimeState for NoneState {
    fn module_create_from_brig(&self, _module_id: &str, _brig_id: &str) -> Result<()> {
        accept!("module_create_from_brig")
    }

    fn program_create(&self, _program_id: &str) -> Result<()> {
        accept!("program_create")
    }

    fn program_add_module(&self, _program_id: &str, _module_id: &str) -> Result<()> {
        accept!("program_add_module")
    }

    fn program_finalize(&self, _code_id: &str, _program_id: &str) -> Result<()> {
        accept!("program_finalize")
    }

    fn executable_create(&self, _executable_id: &str) -> Result<()> {
        accept!("executable_create")
    }

    fn executable_load_code(&self, _executable_id: &str, _code_id: &str) -> Result<()> {
        accept!("executable_load_code")
    }

    fn executable_freeze(&self, _executable_id: &str) -> Result<()> {
        accept!("executable_freeze")
    }

    fn buffer_create(&self, _buffer_id: &str, _size: usize, _init_values_id: Option<&str>) -> Result<()> {
        accept!("buffer_create")
    }

    fn buffer_validate(
        &self,
        _buffer_id: &str,
        _expected_values_id: &str,
        _memory_type: ValueType,
        _method: Comparison,
    ) -> Result<()> {
        accept!("buffer_validate")
    }

    fn image_create(&self, _image_id: &str, _image_params_id: &str, _optional_format: bool) -> Result<()> {
        accept!("image_create")
    }

    fn image_initialize(&self, _image_id: &str, _image_params_id: &str, _values_id: &str) -> Result<()> {
        accept!("image_initialize")
    }

    fn image_write(&self, _image_id: &str, _values_id: &str, _origin: [u32; 3], _range: [u32; 3]) -> Result<()> {
        accept!("image_write")
    }

    fn sampler_create(&self, _sampler_id: &str, _sampler_params_id: &str) -> Result<()> {
        accept!("sampler_create")
    }

    fn dispatch_create(&self, _dispatch_id: &str, _executable_id: &str, _kernel_name: Option<&str>) -> Result<()> {
        accept!("dispatch_create")
    }

    fn dispatch_arg(&self, _dispatch_id: &str, _arg_type: DispatchArgType, _arg_key: &str) -> Result<()> {
        accept!("dispatch_arg")
    }

    fn dispatch_execute(&self, _dispatch_id: &str) -> Result<()> {
        accept!("dispatch_execute")
    }

    fn signal_create(&self, _signal_id: &str, _initial_value: i64) -> Result<()> {
        accept!("signal_create")
    }

    fn signal_send(&self, _signal_id: &str, _value: i64) -> Result<()> {
        accept!("signal_send")
    }

    fn signal_wait(&self, _signal_id: &str, _value: i64) -> Result<()> {
        accept!("signal_wait")
    }

    fn queue_create(&self, _queue_id: &str, _size: u32) -> Result<()> {
        accept!("queue_create")
    }

    fn is_detect_supported(&self) -> bool {
        true
    }

    fn is_break_supported(&self) -> bool {
        true
    }

    fn status(&self) -> TestStatus {
        TestStatus::Passed
    }
}
