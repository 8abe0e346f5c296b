use hexl::{
    Brig, Command, DEFAULT_BRIG_ID, DEFAULT_DISPATCH_ID, DEFAULT_EXECUTABLE_ID, DISPATCH_SETUP_ID,
    DispatchArgType, DispatchSetup, HsaError, Result, RuntimeOptions, Scenario, ValueStore,
    create_runtime,
};
use std::fs;
use std::sync::Arc;

// Usage: dispatch_brig <module.brig> [kernel name]
//
// Finalizes the module, passes one 1 KiB output buffer to the kernel and
// runs it over a 256 work-item grid. HEXL_* variables select the runtime.
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| HsaError::InvalidArgument("usage: dispatch_brig <module.brig> [kernel]".into()))?;
    let kernel = args.next();

    let options = RuntimeOptions::from_env()?;
    let context = create_runtime(&options)?;
    println!("Runtime: {}", context.description());
    println!(
        "Wavesize {}, {} waves per group, {} profile",
        context.wavesize(),
        context.waves_per_group(),
        if context.is_full_profile() { "full" } else { "base" }
    );

    let bytes = fs::read(&path)
        .map_err(|e| HsaError::InvalidArgument(format!("cannot read {}: {}", path, e)))?;
    println!("Loaded module: {} bytes", bytes.len());

    let store = Arc::new(ValueStore::new());
    store.put(DEFAULT_BRIG_ID, Brig::new(bytes));
    store.put(
        DISPATCH_SETUP_ID,
        DispatchSetup {
            dimensions: 1,
            grid_size: [256, 1, 1],
            workgroup_size: [64, 1, 1],
            dynamic_group_segment_size: 0,
        },
    );

    let mut scenario = Scenario::default_build();
    scenario
        .push(Command::BufferCreate {
            buffer_id: "out".into(),
            size: 1024,
            init_values_id: None,
        })
        .push(Command::DispatchCreate {
            dispatch_id: DEFAULT_DISPATCH_ID.into(),
            executable_id: DEFAULT_EXECUTABLE_ID.into(),
            kernel_name: kernel,
        })
        .push(Command::DispatchArg {
            dispatch_id: DEFAULT_DISPATCH_ID.into(),
            arg_type: DispatchArgType::Buffer,
            arg_key: "out".into(),
        })
        .push(Command::DispatchExecute {
            dispatch_id: DEFAULT_DISPATCH_ID.into(),
        });

    let state = context.new_state(store);
    let passed = scenario.execute(state.clone());
    println!("Dispatch {}: status {:?}", if passed { "passed" } else { "failed" }, state.status());
    Ok(())
}
