//! Per-test resource owner and dispatch driver on the HSA runtime.

use crate::context::HsaContext;
use crate::dispatch::{Dispatch, DispatchSetup};
use crate::error::{HsaError, Result};
use crate::executable::{Brig, CodeObject, Executable, Program};
use crate::image::{self, Image, ImageParams, Sampler, SamplerParams};
use crate::memory::{Allocation, HOST_ALLOCATION_ALIGNMENT, HostMemory, MIN_ALLOCATION_SIZE};
use crate::options::Profile;
use crate::queue::Queue;
use crate::resources::ResourceStack;
use crate::runtime::{
    DISPATCH_SETUP_ID, DispatchArgType, QUEUE_DOORBELL_KEY, QUEUE_ID_KEY, RuntimeState, TestStatus,
};
use crate::signal::Signal;
use crate::store::ValueStore;
use crate::validate::{Comparison, validate_memory};
use crate::value::{Value, ValueType, pack_values, packed_size};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, warn};

/// Everything a state can own.
enum Resource {
    Module(Brig),
    Program(Arc<Program>),
    Code(Arc<CodeObject>),
    Executable(Arc<Executable>),
    Buffer(Arc<Allocation>),
    Image(Arc<Image>),
    Sampler(Arc<Sampler>),
    Signal(Arc<Signal>),
    Queue(Arc<Queue>),
    Dispatch(Arc<Dispatch>),
}

macro_rules! lookup {
    ($name:ident, $variant:ident, $ty:ty, $kind:literal) => {
        fn $name(&self, id: &str) -> Result<$ty> {
            match self.resources().get(id) {
                Some(Resource::$variant(r)) => Ok(r.clone()),
                Some(_) => Err(HsaError::WrongKind {
                    key: id.to_string(),
                    expected: $kind,
                }),
                None => Err(HsaError::MissingValue(id.to_string())),
            }
        }
    };
}

/// Holds a key from the duplicate check until the resource is registered.
struct Reservation<'a> {
    reserved: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.reserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

pub struct HsaState {
    // Released first, newest resource first.
    resources: Mutex<ResourceStack<Resource>>,
    // Keys of resources still being created. Locked after `resources`.
    reserved: Mutex<HashSet<String>>,
    status: Mutex<TestStatus>,
    store: Arc<ValueStore>,
    context: Arc<HsaContext>,
}

impl HsaState {
    pub fn new(context: Arc<HsaContext>, store: Arc<ValueStore>) -> Self {
        Self {
            resources: Mutex::new(ResourceStack::new()),
            reserved: Mutex::new(HashSet::new()),
            status: Mutex::new(TestStatus::Passed),
            store,
            context,
        }
    }

    fn resources(&self) -> MutexGuard<'_, ResourceStack<Resource>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reserved(&self) -> MutexGuard<'_, HashSet<String>> {
        self.reserved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: &str, resource: Resource) -> Result<()> {
        let mut resources = self.resources();
        if self.reserved().contains(id) {
            return Err(HsaError::DuplicateKey(id.to_string()));
        }
        resources.push(id, resource)
    }

    /// Claims `id` for a resource whose creation cannot be undone cleanly.
    fn reserve(&self, id: &str) -> Result<Reservation<'_>> {
        let resources = self.resources();
        if resources.contains(id) || !self.reserved().insert(id.to_string()) {
            return Err(HsaError::DuplicateKey(id.to_string()));
        }
        Ok(Reservation {
            reserved: &self.reserved,
            id: id.to_string(),
        })
    }

    fn register_reserved(&self, reservation: Reservation<'_>, resource: Resource) -> Result<()> {
        let mut resources = self.resources();
        let result = resources.push(reservation.id.as_str(), resource);
        drop(reservation);
        result
    }

    fn set_status(&self, status: TestStatus) {
        let mut current = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != TestStatus::NotApplicable {
            *current = status;
        }
    }

    /// Records the outcome of one operation in the status side channel.
    fn track<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_not_applicable() {
                warn!(operation, "not applicable: {}", e);
                self.set_status(TestStatus::NotApplicable);
            } else {
                error!(operation, "{}", e);
                self.set_status(TestStatus::Failed);
            }
        }
        result
    }

    lookup!(module, Module, Brig, "a module");
    lookup!(program, Program, Arc<Program>, "a program");
    lookup!(code, Code, Arc<CodeObject>, "a code object");
    lookup!(executable, Executable, Arc<Executable>, "an executable");
    lookup!(buffer, Buffer, Arc<Allocation>, "a buffer");
    lookup!(image, Image, Arc<Image>, "an image");
    lookup!(sampler, Sampler, Arc<Sampler>, "a sampler");
    lookup!(signal, Signal, Arc<Signal>, "a signal");
    lookup!(queue, Queue, Arc<Queue>, "a queue");
    lookup!(dispatch, Dispatch, Arc<Dispatch>, "a dispatch");

    /// Allocates memory agents can access: registered host memory on full
    /// profile agents, system region memory on base profile agents.
    fn allocate(&self, size: usize, alignment: usize) -> Result<Allocation> {
        match self.context.profile() {
            Profile::Full => Ok(Allocation::Host(HostMemory::allocate(
                self.context.api().clone(),
                size,
                alignment,
            )?)),
            Profile::Base => Ok(Allocation::Region(self.context.system_region().allocate(size)?)),
        }
    }

    fn create_buffer(&self, buffer_id: &str, size: usize, init_values_id: Option<&str>) -> Result<()> {
        let size = size.max(MIN_ALLOCATION_SIZE);
        let init = init_values_id
            .map(|id| self.store.get::<Vec<Value>>(id))
            .transpose()?;
        if let Some(values) = &init {
            if packed_size(values) > size {
                return Err(HsaError::InvalidArgument(format!(
                    "{} bytes of initial values do not fit in buffer {} of {} bytes",
                    packed_size(values),
                    buffer_id,
                    size
                )));
            }
        }

        let buffer = self.allocate(size, HOST_ALLOCATION_ALIGNMENT)?;
        // SAFETY: new allocation, no other view exists.
        let bytes = unsafe { buffer.as_mut_slice() };
        bytes.fill(0);
        if let Some(values) = &init {
            pack_values(values, bytes)?;
        }
        debug!(buffer = buffer_id, size, address = buffer.as_ptr() as usize, "created buffer");
        self.register(buffer_id, Resource::Buffer(Arc::new(buffer)))
    }

    fn create_image(&self, image_id: &str, image_params_id: &str, optional_format: bool) -> Result<()> {
        let params = self.store.get::<ImageParams>(image_params_id)?;
        let agent = self.context.agent();
        if optional_format && !image::is_supported(agent, &params)? {
            return Err(HsaError::NotApplicable(format!(
                "image format {:?}/{:?} with {:?} geometry and {:?} access",
                params.channel_order, params.channel_type, params.geometry, params.access
            )));
        }
        let info = image::data_info(agent, &params)?;
        let data = self.allocate(info.size.max(1), info.alignment)?;
        let image = Image::create(agent, params, data)?;
        self.register(image_id, Resource::Image(Arc::new(image)))
    }

    fn initialize_image(&self, image_id: &str, image_params_id: &str, values_id: &str) -> Result<()> {
        let image = self.image(image_id)?;
        let params = self.store.get::<ImageParams>(image_params_id)?;
        if params != *image.params() {
            return Err(HsaError::InvalidArgument(format!(
                "image {} was not created from {}",
                image_id, image_params_id
            )));
        }
        let values = self.store.get::<Vec<Value>>(values_id)?;
        image.initialize(&values)
    }

    fn create_dispatch(&self, dispatch_id: &str, executable_id: &str, kernel_name: Option<&str>) -> Result<()> {
        // A dispatch owns a claimed packet slot, so the key is settled
        // before the slot is taken.
        let reservation = self.reserve(dispatch_id)?;
        let executable = self.executable(executable_id)?;
        let agent = self.context.agent();
        let symbol = match kernel_name {
            Some(name) => executable.get_kernel_symbol(name, agent)?,
            None => executable.unique_kernel_symbol()?,
        };
        let info = symbol.info()?;
        let setup = self
            .store
            .find::<DispatchSetup>(DISPATCH_SETUP_ID)?
            .unwrap_or_default();

        let queue = self.context.queue_no_error()?;
        let dispatch = Dispatch::create(
            self.context.api(),
            dispatch_id,
            queue.clone(),
            executable,
            &info,
            &setup,
            self.context.kernarg_region(),
            self.context.wait_policy(),
        )?;

        self.register_reserved(reservation, Resource::Dispatch(Arc::new(dispatch)))?;
        self.store.put(QUEUE_ID_KEY, Value::U64(queue.id()));
        self.store.put(QUEUE_DOORBELL_KEY, Value::U64(queue.doorbell().handle));
        Ok(())
    }

    fn add_dispatch_arg(&self, dispatch_id: &str, arg_type: DispatchArgType, arg_key: &str) -> Result<()> {
        let dispatch = self.dispatch(dispatch_id)?;
        match arg_type {
            DispatchArgType::Value => dispatch.push_value(&self.store.get::<Value>(arg_key)?),
            DispatchArgType::Values => dispatch.push_values(&self.store.get::<Vec<Value>>(arg_key)?),
            DispatchArgType::Buffer => dispatch.push_pointer(self.buffer(arg_key)?.as_ptr() as usize),
            DispatchArgType::Queue => dispatch.push_pointer(self.queue(arg_key)?.as_ptr() as usize),
            DispatchArgType::Image => dispatch.push_handle(self.image(arg_key)?.handle()),
            DispatchArgType::Sampler => dispatch.push_handle(self.sampler(arg_key)?.handle()),
            DispatchArgType::Signal => dispatch.push_handle(self.signal(arg_key)?.handle().handle),
            DispatchArgType::GroupOffset => {
                let value = self.store.get::<Value>(arg_key)?;
                let offset = value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| {
                        HsaError::InvalidArgument(format!(
                            "group offset {} under {} is not a 32-bit unsigned value",
                            value, arg_key
                        ))
                    })?;
                dispatch.push_group_offset(offset)
            }
        }
        .map(|_| ())
    }

    fn exception_policy_supported(&self, policy: crate::agent::ExceptionPolicy, name: &str) -> bool {
        match self.context.agent().exception_policies(self.context.module_profile()) {
            Ok(policies) if policies.contains(policy) => true,
            Ok(_) => {
                warn!(policy = name, "exception policy not supported by the agent");
                self.set_status(TestStatus::NotApplicable);
                false
            }
            Err(e) => {
                error!(policy = name, "{}", e);
                self.set_status(TestStatus::Failed);
                false
            }
        }
    }
}

impl RuntimeState for HsaState {
    fn module_create_from_brig(&self, module_id: &str, brig_id: &str) -> Result<()> {
        let result = self
            .store
            .get::<Brig>(brig_id)
            .and_then(|brig| self.register(module_id, Resource::Module(brig)));
        self.track("module_create_from_brig", result)
    }

    fn program_create(&self, program_id: &str) -> Result<()> {
        let result = Program::create(self.context.api().clone(), self.context.module_profile())
            .and_then(|p| self.register(program_id, Resource::Program(Arc::new(p))));
        self.track("program_create", result)
    }

    fn program_add_module(&self, program_id: &str, module_id: &str) -> Result<()> {
        let result = (|| {
            let program = self.program(program_id)?;
            program.add_module(&self.module(module_id)?)
        })();
        self.track("program_add_module", result)
    }

    fn program_finalize(&self, code_id: &str, program_id: &str) -> Result<()> {
        let result = (|| {
            let program = self.program(program_id)?;
            let code = program.finalize(self.context.agent().isa()?)?;
            self.register(code_id, Resource::Code(Arc::new(code)))
        })();
        self.track("program_finalize", result)
    }

    fn executable_create(&self, executable_id: &str) -> Result<()> {
        let result = Executable::create(self.context.api().clone(), self.context.module_profile())
            .and_then(|e| self.register(executable_id, Resource::Executable(Arc::new(e))));
        self.track("executable_create", result)
    }

    fn executable_load_code(&self, executable_id: &str, code_id: &str) -> Result<()> {
        let result = (|| {
            let executable = self.executable(executable_id)?;
            executable.load_code_object(self.context.agent(), &*self.code(code_id)?)
        })();
        self.track("executable_load_code", result)
    }

    fn executable_freeze(&self, executable_id: &str) -> Result<()> {
        let result = self.executable(executable_id).and_then(|e| e.freeze());
        self.track("executable_freeze", result)
    }

    fn buffer_create(&self, buffer_id: &str, size: usize, init_values_id: Option<&str>) -> Result<()> {
        let result = self.create_buffer(buffer_id, size, init_values_id);
        self.track("buffer_create", result)
    }

    fn buffer_validate(
        &self,
        buffer_id: &str,
        expected_values_id: &str,
        memory_type: ValueType,
        method: Comparison,
    ) -> Result<()> {
        let result = (|| {
            let buffer = self.buffer(buffer_id)?;
            let expected = self.store.get::<Vec<Value>>(expected_values_id)?;
            validate_memory(buffer.as_slice(), &expected, memory_type, method)
        })();
        self.track("buffer_validate", result)
    }

    fn image_create(&self, image_id: &str, image_params_id: &str, optional_format: bool) -> Result<()> {
        let result = self.create_image(image_id, image_params_id, optional_format);
        self.track("image_create", result)
    }

    fn image_initialize(&self, image_id: &str, image_params_id: &str, values_id: &str) -> Result<()> {
        let result = self.initialize_image(image_id, image_params_id, values_id);
        self.track("image_initialize", result)
    }

    fn image_write(&self, image_id: &str, values_id: &str, origin: [u32; 3], range: [u32; 3]) -> Result<()> {
        let result = (|| {
            let image = self.image(image_id)?;
            image.write(origin, range, &self.store.get::<Vec<Value>>(values_id)?)
        })();
        self.track("image_write", result)
    }

    fn sampler_create(&self, sampler_id: &str, sampler_params_id: &str) -> Result<()> {
        let result = (|| {
            let params = self.store.get::<SamplerParams>(sampler_params_id)?;
            let sampler = Sampler::create(self.context.agent(), &params)?;
            self.register(sampler_id, Resource::Sampler(Arc::new(sampler)))
        })();
        self.track("sampler_create", result)
    }

    fn dispatch_create(&self, dispatch_id: &str, executable_id: &str, kernel_name: Option<&str>) -> Result<()> {
        let result = self.create_dispatch(dispatch_id, executable_id, kernel_name);
        self.track("dispatch_create", result)
    }

    fn dispatch_arg(&self, dispatch_id: &str, arg_type: DispatchArgType, arg_key: &str) -> Result<()> {
        let result = self.add_dispatch_arg(dispatch_id, arg_type, arg_key);
        self.track("dispatch_arg", result)
    }

    fn dispatch_execute(&self, dispatch_id: &str) -> Result<()> {
        let result = self
            .dispatch(dispatch_id)
            .and_then(|d| d.execute(self.context.wait_policy()));
        self.track("dispatch_execute", result)
    }

    fn signal_create(&self, signal_id: &str, initial_value: i64) -> Result<()> {
        let result = Signal::create(self.context.api().clone(), initial_value)
            .and_then(|s| self.register(signal_id, Resource::Signal(Arc::new(s))));
        self.track("signal_create", result)
    }

    fn signal_send(&self, signal_id: &str, value: i64) -> Result<()> {
        let result = self.signal(signal_id).map(|s| s.store_release(value));
        self.track("signal_send", result)
    }

    fn signal_wait(&self, signal_id: &str, value: i64) -> Result<()> {
        let result = self.signal(signal_id).and_then(|s| {
            s.wait_eq_bounded(
                value,
                *self.context.wait_policy(),
                &format!("signal {}", signal_id),
                || None,
            )
        });
        self.track("signal_wait", result)
    }

    fn queue_create(&self, queue_id: &str, size: u32) -> Result<()> {
        let result = (|| {
            let size = if size == 0 { self.context.queue_size() } else { size };
            let queue = Queue::create(self.context.api().clone(), self.context.agent(), size, false)?;
            let id = queue.id();
            self.register(queue_id, Resource::Queue(Arc::new(queue)))?;
            self.store.put(format!("{}.id", queue_id), Value::U64(id));
            Ok(())
        })();
        self.track("queue_create", result)
    }

    fn is_detect_supported(&self) -> bool {
        self.exception_policy_supported(crate::agent::ExceptionPolicy::DETECT, "detect")
    }

    fn is_break_supported(&self) -> bool {
        self.exception_policy_supported(crate::agent::ExceptionPolicy::BREAK, "break")
    }

    fn status(&self) -> TestStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HsaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HsaState")
            .field("resources", &self.resources().keys().map(str::to_string).collect::<Vec<_>>())
            .field("status", &self.status())
            .finish()
    }
}
