//! Backend-independent runtime contract.
//!
//! A [`RuntimeContext`] is created once per run and binds one device. Each
//! test gets its own [`RuntimeState`] from [`RuntimeContext::new_state`];
//! the state owns every resource the test creates and releases them, newest
//! first, when it is dropped.
//!
//! Operations return `Ok(())` on success. A failure whose error
//! [`is_not_applicable`](crate::HsaError::is_not_applicable) also sets
//! [`TestStatus::NotApplicable`] so the harness can skip instead of fail.

use crate::error::Result;
use crate::none::NoneContext;
use crate::options::{RuntimeKind, RuntimeOptions};
use crate::store::ValueStore;
use crate::validate::Comparison;
use crate::value::ValueType;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_MODULE_ID: &str = "module";
pub const DEFAULT_BRIG_ID: &str = "brig";
pub const DEFAULT_PROGRAM_ID: &str = "program";
pub const DEFAULT_CODE_ID: &str = "code";
pub const DEFAULT_EXECUTABLE_ID: &str = "executable";
pub const DEFAULT_DISPATCH_ID: &str = "dispatch";
pub const DISPATCH_SETUP_ID: &str = "dispatchSetup";

/// Store keys describing the primary queue, written by `dispatch_create`.
pub const QUEUE_ID_KEY: &str = "queue.id";
pub const QUEUE_DOORBELL_KEY: &str = "queue.doorbell";

/// Verdict side channel of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Passed,
    Failed,
    NotApplicable,
}

/// How a `dispatch_arg` key is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchArgType {
    /// A stored value, packed at its natural size.
    Value,
    /// A stored value list, each value packed in turn.
    Values,
    /// Address of a buffer resource.
    Buffer,
    /// Handle of an image resource.
    Image,
    /// Handle of a sampler resource.
    Sampler,
    /// Handle of a signal resource.
    Signal,
    /// Address of a queue resource.
    Queue,
    /// Static group segment size plus the stored dynamic offset.
    GroupOffset,
}

pub trait RuntimeContext: Send + Sync {
    fn description(&self) -> String;

    fn is_full_profile(&self) -> bool;

    fn is_little_endian(&self) -> bool;

    fn wavesize(&self) -> u32;

    fn waves_per_group(&self) -> u32;

    /// Per-test resource owner reading its parameters from `store`.
    fn new_state(self: Arc<Self>, store: Arc<ValueStore>) -> Arc<dyn RuntimeState>;
}

pub trait RuntimeState: Send + Sync {
    fn module_create_from_brig(&self, module_id: &str, brig_id: &str) -> Result<()>;

    fn program_create(&self, program_id: &str) -> Result<()>;

    fn program_add_module(&self, program_id: &str, module_id: &str) -> Result<()>;

    fn program_finalize(&self, code_id: &str, program_id: &str) -> Result<()>;

    fn executable_create(&self, executable_id: &str) -> Result<()>;

    fn executable_load_code(&self, executable_id: &str, code_id: &str) -> Result<()>;

    fn executable_freeze(&self, executable_id: &str) -> Result<()>;

    /// Allocates at least 256 bytes, optionally filled from a value list.
    fn buffer_create(&self, buffer_id: &str, size: usize, init_values_id: Option<&str>)
    -> Result<()>;

    fn buffer_validate(
        &self,
        buffer_id: &str,
        expected_values_id: &str,
        memory_type: ValueType,
        method: Comparison,
    ) -> Result<()>;

    fn image_create(&self, image_id: &str, image_params_id: &str, optional_format: bool)
    -> Result<()>;

    fn image_initialize(&self, image_id: &str, image_params_id: &str, values_id: &str)
    -> Result<()>;

    fn image_write(
        &self,
        image_id: &str,
        values_id: &str,
        origin: [u32; 3],
        range: [u32; 3],
    ) -> Result<()>;

    fn sampler_create(&self, sampler_id: &str, sampler_params_id: &str) -> Result<()>;

    fn dispatch_create(
        &self,
        dispatch_id: &str,
        executable_id: &str,
        kernel_name: Option<&str>,
    ) -> Result<()>;

    fn dispatch_arg(&self, dispatch_id: &str, arg_type: DispatchArgType, arg_key: &str)
    -> Result<()>;

    fn dispatch_execute(&self, dispatch_id: &str) -> Result<()>;

    fn signal_create(&self, signal_id: &str, initial_value: i64) -> Result<()>;

    fn signal_send(&self, signal_id: &str, value: i64) -> Result<()>;

    fn signal_wait(&self, signal_id: &str, value: i64) -> Result<()>;

    /// Creates an extra queue; `size` 0 means the device maximum.
    fn queue_create(&self, queue_id: &str, size: u32) -> Result<()>;

    fn is_detect_supported(&self) -> bool;

    fn is_break_supported(&self) -> bool;

    fn status(&self) -> TestStatus;
}

/// Creates the backend selected by `options.runtime`.
pub fn create_runtime(options: &RuntimeOptions) -> Result<Arc<dyn RuntimeContext>> {
    let context: Arc<dyn RuntimeContext> = match options.runtime {
        RuntimeKind::None => Arc::new(NoneContext::new()),
        RuntimeKind::Hsa => Arc::new(crate::context::HsaContext::new(options)?),
    };
    info!(runtime = %context.description(), "runtime created");
    Ok(context)
}
