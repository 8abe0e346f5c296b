//! HSA dispatch-execution core for HSAIL conformance tests.
//!
//! A run creates one [`RuntimeContext`] with [`create_runtime`]. Each test
//! then gets a [`RuntimeState`] bound to a [`ValueStore`] holding its
//! inputs, drives it step by step (directly or through a [`Scenario`]) and
//! drops it to release everything it created.
//!
//! The HSA runtime library is loaded at run time, so the crate builds on
//! machines without it; selecting [`RuntimeKind::None`] runs the same
//! contract without a device.

mod agent;
mod api;
mod bindings;
mod context;
mod dispatch;
pub mod error;
mod executable;
#[cfg(test)]
mod fake;
pub mod image;
pub mod kernarg;
mod memory;
mod none;
pub mod options;
mod queue;
mod resources;
pub mod runtime;
pub mod scenario;
mod signal;
mod state;
pub mod store;
pub mod threads;
pub mod validate;
pub mod value;

pub use context::HsaContext;
pub use dispatch::{DYNAMIC_CALLSTACK_PRIVATE_SIZE, DispatchSetup};
pub use error::{HsaError, Result};
pub use executable::Brig;
pub use image::{
    AccessPermission, AddressingMode, ChannelOrder, ChannelType, CoordinateMode, FilterMode,
    ImageGeometry, ImageParams, SamplerParams,
};
pub use memory::MIN_ALLOCATION_SIZE;
pub use none::{NoneContext, NoneState};
pub use options::{DEFAULT_TIMEOUT, Profile, RuntimeKind, RuntimeOptions};
pub use runtime::{
    DEFAULT_BRIG_ID, DEFAULT_CODE_ID, DEFAULT_DISPATCH_ID, DEFAULT_EXECUTABLE_ID,
    DEFAULT_MODULE_ID, DEFAULT_PROGRAM_ID, DISPATCH_SETUP_ID, DispatchArgType, QUEUE_DOORBELL_KEY,
    QUEUE_ID_KEY, RuntimeContext, RuntimeState, TestStatus, create_runtime,
};
pub use scenario::{Command, Scenario};
pub use store::{Entry, ValueStore};
pub use threads::HostThreads;
pub use validate::Comparison;
pub use value::{Value, ValueType};
