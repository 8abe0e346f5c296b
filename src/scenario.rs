//! Replays a recorded list of runtime steps against one state.

use crate::error::Result;
use crate::runtime::{
    DEFAULT_BRIG_ID, DEFAULT_CODE_ID, DEFAULT_EXECUTABLE_ID, DEFAULT_MODULE_ID, DEFAULT_PROGRAM_ID,
    DispatchArgType, RuntimeState,
};
use crate::threads::HostThreads;
use crate::validate::Comparison;
use crate::value::ValueType;
use std::sync::Arc;
use tracing::{debug, error, info};

/// One step of a scenario. Each variant maps onto a [`RuntimeState`]
/// operation, except the two thread commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ModuleCreateFromBrig { module_id: String, brig_id: String },
    ProgramCreate { program_id: String },
    ProgramAddModule { program_id: String, module_id: String },
    ProgramFinalize { code_id: String, program_id: String },
    ExecutableCreate { executable_id: String },
    ExecutableLoadCode { executable_id: String, code_id: String },
    ExecutableFreeze { executable_id: String },
    BufferCreate {
        buffer_id: String,
        size: usize,
        init_values_id: Option<String>,
    },
    BufferValidate {
        buffer_id: String,
        expected_values_id: String,
        memory_type: ValueType,
        method: Comparison,
    },
    ImageCreate {
        image_id: String,
        image_params_id: String,
        optional_format: bool,
    },
    ImageInitialize {
        image_id: String,
        image_params_id: String,
        values_id: String,
    },
    ImageWrite {
        image_id: String,
        values_id: String,
        origin: [u32; 3],
        range: [u32; 3],
    },
    SamplerCreate { sampler_id: String, sampler_params_id: String },
    DispatchCreate {
        dispatch_id: String,
        executable_id: String,
        kernel_name: Option<String>,
    },
    DispatchArg {
        dispatch_id: String,
        arg_type: DispatchArgType,
        arg_key: String,
    },
    DispatchExecute { dispatch_id: String },
    SignalCreate { signal_id: String, initial_value: i64 },
    SignalSend { signal_id: String, value: i64 },
    SignalWait { signal_id: String, value: i64 },
    QueueCreate { queue_id: String, size: u32 },
    IsDetectSupported,
    IsBreakSupported,
    /// Runs `commands` in order on a new host thread.
    StartThread { id: u32, commands: Vec<Command> },
    /// Joins every thread started so far; fails if any of them failed.
    WaitThreads,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ModuleCreateFromBrig { .. } => "module_create_from_brig",
            Command::ProgramCreate { .. } => "program_create",
            Command::ProgramAddModule { .. } => "program_add_module",
            Command::ProgramFinalize { .. } => "program_finalize",
            Command::ExecutableCreate { .. } => "executable_create",
            Command::ExecutableLoadCode { .. } => "executable_load_code",
            Command::ExecutableFreeze { .. } => "executable_freeze",
            Command::BufferCreate { .. } => "buffer_create",
            Command::BufferValidate { .. } => "buffer_validate",
            Command::ImageCreate { .. } => "image_create",
            Command::ImageInitialize { .. } => "image_initialize",
            Command::ImageWrite { .. } => "image_write",
            Command::SamplerCreate { .. } => "sampler_create",
            Command::DispatchCreate { .. } => "dispatch_create",
            Command::DispatchArg { .. } => "dispatch_arg",
            Command::DispatchExecute { .. } => "dispatch_execute",
            Command::SignalCreate { .. } => "signal_create",
            Command::SignalSend { .. } => "signal_send",
            Command::SignalWait { .. } => "signal_wait",
            Command::QueueCreate { .. } => "queue_create",
            Command::IsDetectSupported => "is_detect_supported",
            Command::IsBreakSupported => "is_break_supported",
            Command::StartThread { .. } => "start_thread",
            Command::WaitThreads => "wait_threads",
        }
    }

    /// Runs a state operation. Thread commands are handled by the caller.
    fn apply(&self, state: &dyn RuntimeState) -> Result<bool> {
        match self {
            Command::ModuleCreateFromBrig { module_id, brig_id } => {
                state.module_create_from_brig(module_id, brig_id)?
            }
            Command::ProgramCreate { program_id } => state.program_create(program_id)?,
            Command::ProgramAddModule {
                program_id,
                module_id,
            } => state.program_add_module(program_id, module_id)?,
            Command::ProgramFinalize {
                code_id,
                program_id,
            } => state.program_finalize(code_id, program_id)?,
            Command::ExecutableCreate { executable_id } => state.executable_create(executable_id)?,
            Command::ExecutableLoadCode {
                executable_id,
                code_id,
            } => state.executable_load_code(executable_id, code_id)?,
            Command::ExecutableFreeze { executable_id } => state.executable_freeze(executable_id)?,
            Command::BufferCreate {
                buffer_id,
                size,
                init_values_id,
            } => state.buffer_create(buffer_id, *size, init_values_id.as_deref())?,
            Command::BufferValidate {
                buffer_id,
                expected_values_id,
                memory_type,
                method,
            } => state.buffer_validate(buffer_id, expected_values_id, *memory_type, *method)?,
            Command::ImageCreate {
                image_id,
                image_params_id,
                optional_format,
            } => state.image_create(image_id, image_params_id, *optional_format)?,
            Command::ImageInitialize {
                image_id,
                image_params_id,
                values_id,
            } => state.image_initialize(image_id, image_params_id, values_id)?,
            Command::ImageWrite {
                image_id,
                values_id,
                origin,
                range,
            } => state.image_write(image_id, values_id, *origin, *range)?,
            Command::SamplerCreate {
                sampler_id,
                sampler_params_id,
            } => state.sampler_create(sampler_id, sampler_params_id)?,
            Command::DispatchCreate {
                dispatch_id,
                executable_id,
                kernel_name,
            } => state.dispatch_create(dispatch_id, executable_id, kernel_name.as_deref())?,
            Command::DispatchArg {
                dispatch_id,
                arg_type,
                arg_key,
            } => state.dispatch_arg(dispatch_id, *arg_type, arg_key)?,
            Command::DispatchExecute { dispatch_id } => state.dispatch_execute(dispatch_id)?,
            Command::SignalCreate {
                signal_id,
                initial_value,
            } => state.signal_create(signal_id, *initial_value)?,
            Command::SignalSend { signal_id, value } => state.signal_send(signal_id, *value)?,
            Command::SignalWait { signal_id, value } => state.signal_wait(signal_id, *value)?,
            Command::QueueCreate { queue_id, size } => state.queue_create(queue_id, *size)?,
            Command::IsDetectSupported => return Ok(state.is_detect_supported()),
            Command::IsBreakSupported => return Ok(state.is_break_supported()),
            Command::StartThread { .. } | Command::WaitThreads => {}
        }
        Ok(true)
    }
}

/// An ordered list of [`Command`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    commands: Vec<Command>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module, program, code object and frozen executable under the default
    /// keys, built from the module stored under [`DEFAULT_BRIG_ID`].
    pub fn default_build() -> Self {
        let mut scenario = Self::new();
        scenario
            .push(Command::ModuleCreateFromBrig {
                module_id: DEFAULT_MODULE_ID.into(),
                brig_id: DEFAULT_BRIG_ID.into(),
            })
            .push(Command::ProgramCreate {
                program_id: DEFAULT_PROGRAM_ID.into(),
            })
            .push(Command::ProgramAddModule {
                program_id: DEFAULT_PROGRAM_ID.into(),
                module_id: DEFAULT_MODULE_ID.into(),
            })
            .push(Command::ProgramFinalize {
                code_id: DEFAULT_CODE_ID.into(),
                program_id: DEFAULT_PROGRAM_ID.into(),
            })
            .push(Command::ExecutableCreate {
                executable_id: DEFAULT_EXECUTABLE_ID.into(),
            })
            .push(Command::ExecutableLoadCode {
                executable_id: DEFAULT_EXECUTABLE_ID.into(),
                code_id: DEFAULT_CODE_ID.into(),
            })
            .push(Command::ExecutableFreeze {
                executable_id: DEFAULT_EXECUTABLE_ID.into(),
            });
        scenario
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs every command in order and returns the verdict.
    ///
    /// Stops at the first failing command. Threads still running at the end
    /// are joined and their results count. A skip is reported through
    /// [`RuntimeState::status`], not through the return value.
    pub fn execute(&self, state: Arc<dyn RuntimeState>) -> bool {
        let passed = run(&self.commands, state);
        info!(commands = self.commands.len(), passed, "scenario finished");
        passed
    }
}

impl From<Vec<Command>> for Scenario {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl FromIterator<Command> for Scenario {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

fn run(commands: &[Command], state: Arc<dyn RuntimeState>) -> bool {
    let threads = HostThreads::new(state);
    for (step, command) in commands.iter().enumerate() {
        debug!(step, command = command.name(), "running command");
        let passed = match command {
            Command::StartThread { id, commands } => {
                let commands = commands.clone();
                let state = threads.state().clone();
                threads.start_thread(*id, move |_| run(&commands, state));
                true
            }
            Command::WaitThreads => threads.wait_threads(),
            command => match command.apply(threads.state().as_ref()) {
                Ok(passed) => passed,
                Err(err) => {
                    error!(step, command = command.name(), %err, "command failed");
                    false
                }
            },
        };
        if !passed {
            threads.wait_threads();
            return false;
        }
    }
    threads.wait_threads()
}
