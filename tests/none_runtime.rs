use hexl::{
    Command, Comparison, DispatchArgType, RuntimeKind, RuntimeOptions, Scenario, TestStatus,
    Value, ValueStore, ValueType, create_runtime,
};
use std::sync::Arc;

fn none_options() -> RuntimeOptions {
    let mut options = RuntimeOptions::default();
    options.set("rt", "none").unwrap();
    options
}

#[test]
fn none_runtime_reports_device_properties() {
    let context = create_runtime(&none_options()).unwrap();
    assert_eq!(context.description(), "none");
    assert!(context.is_full_profile());
    assert!(context.wavesize() > 0);
    assert!(context.waves_per_group() > 0);
}

#[test]
fn direct_calls_all_succeed() {
    let context = create_runtime(&RuntimeOptions::default().runtime(RuntimeKind::None)).unwrap();
    let state = context.new_state(Arc::new(ValueStore::new()));

    state.program_create("p").unwrap();
    state.executable_create("e").unwrap();
    state.buffer_create("b", 10, None).unwrap();
    state.dispatch_create("d", "e", Some("k")).unwrap();
    state.dispatch_arg("d", DispatchArgType::Buffer, "b").unwrap();
    state.dispatch_execute("d").unwrap();
    state.queue_create("q", 0).unwrap();
    assert!(state.is_detect_supported());
    assert!(state.is_break_supported());
    assert_eq!(state.status(), TestStatus::Passed);
    drop(state);
}

#[test]
fn scenario_on_none_runtime_passes() {
    let context = create_runtime(&none_options()).unwrap();
    let store = Arc::new(ValueStore::new());
    store.put("expected", vec![Value::U32(1), Value::U32(2)]);
    let state = context.new_state(store);

    let scenario: Scenario = vec![
        Command::ProgramCreate {
            program_id: "p".into(),
        },
        Command::ExecutableCreate {
            executable_id: "e".into(),
        },
        Command::BufferCreate {
            buffer_id: "b".into(),
            size: 10,
            init_values_id: None,
        },
        Command::DispatchCreate {
            dispatch_id: "d".into(),
            executable_id: "e".into(),
            kernel_name: Some("k".into()),
        },
        Command::DispatchExecute {
            dispatch_id: "d".into(),
        },
        Command::BufferValidate {
            buffer_id: "b".into(),
            expected_values_id: "expected".into(),
            memory_type: ValueType::U32,
            method: Comparison::Ulps(0),
        },
        Command::StartThread {
            id: 0,
            commands: vec![Command::SignalSend {
                signal_id: "s".into(),
                value: 1,
            }],
        },
        Command::WaitThreads,
    ]
    .into_iter()
    .collect();

    assert!(scenario.execute(state.clone()));
    assert_eq!(state.status(), TestStatus::Passed);
}

#[test]
fn store_keeps_typed_entries() {
    let store = ValueStore::new();
    store.put("x", Value::F32(1.5));
    assert_eq!(store.get::<Value>("x").unwrap(), Value::F32(1.5));
    assert!(store.get::<Vec<Value>>("x").is_err());
    store.move_entry("x", "y").unwrap();
    assert!(!store.contains("x"));
    assert!(store.delete("y").is_some());
    assert!(store.is_empty());
}
