//! End-to-end tests: a real component calling exported host functions

use hostlink::runtime::HandleError;
use hostlink::{
    define_exports, export_table, CallDiagnostic, HostContext, InterfaceInfo, MemberInfo,
    MemberVisitor,
};
use std::sync::{Arc, Mutex};
use wasmtime::component::{Component, Linker};
use wasmtime::{Config, Engine, Store};

#[derive(Debug, Default)]
struct Counter {
    value: i32,
}

impl Counter {
    fn increment(&mut self, amount: i32) -> i32 {
        self.value += amount;
        self.value
    }

    fn reset(&mut self) {
        self.value = 0;
    }
}

impl InterfaceInfo for Counter {
    const MEMBER_FUNCTION_COUNT: usize = 2;

    fn interface_name() -> String {
        "counter:demo/counter".to_string()
    }

    fn interface_id() -> u64 {
        0x11
    }

    fn interface_checksum() -> u64 {
        0xc0ffee
    }

    fn visit_member_functions(visitor: &mut MemberVisitor<'_, Self>) {
        visitor
            .member(
                Counter::increment,
                MemberInfo::new("Counter::increment", "increment", 0x1101, 0xa1),
            )
            .member(
                Counter::reset,
                MemberInfo::new("Counter::reset", "reset", 0x1102, 0xa2),
            );
    }
}

/// Imports `counter:demo/counter` and re-exports thin wrappers around it.
const COUNTER_COMPONENT: &str = r#"
(component
    (import "counter:demo/counter" (instance $counter
        (export "increment" (func (param "handle" u64) (param "amount" s32) (result s32)))
        (export "reset" (func (param "handle" u64)))
    ))

    (core func $increment (canon lower (func $counter "increment")))
    (core func $reset (canon lower (func $counter "reset")))

    (core module $m
        (import "host" "increment" (func $increment (param i64 i32) (result i32)))
        (import "host" "reset" (func $reset (param i64)))

        (func (export "bump") (param i64 i32) (result i32)
            local.get 0
            local.get 1
            call $increment
        )

        (func (export "clear") (param i64)
            local.get 0
            call $reset
        )
    )

    (core instance $host
        (export "increment" (func $increment))
        (export "reset" (func $reset))
    )
    (core instance $i (instantiate $m (with "host" (instance $host))))

    (func (export "bump") (param "handle" u64) (param "amount" s32) (result s32)
        (canon lift (core func $i "bump"))
    )
    (func (export "clear") (param "handle" u64)
        (canon lift (core func $i "clear"))
    )
)
"#;

fn engine() -> Engine {
    let mut config = Config::new();
    config.wasm_component_model(true);
    Engine::new(&config).expect("engine")
}

fn linker(engine: &Engine) -> Linker<HostContext> {
    let mut linker = Linker::new(engine);
    let table = export_table::<(Counter,)>().expect("export table");
    define_exports(&mut linker, table).expect("define exports");
    linker
}

#[test]
fn test_component_calls_increment() -> anyhow::Result<()> {
    let engine = engine();
    let component = Component::new(&engine, wat::parse_str(COUNTER_COMPONENT)?)?;
    let linker = linker(&engine);

    let mut store = Store::new(&engine, HostContext::new());
    let handle = store.data_mut().instances_mut().insert(Counter { value: 10 })?;

    let instance = linker.instantiate(&mut store, &component)?;
    let bump = instance.get_typed_func::<(u64, i32), (i32,)>(&mut store, "bump")?;

    let (value,) = bump.call(&mut store, (handle.to_bits(), 5))?;
    bump.post_return(&mut store)?;

    assert_eq!(value, 15);
    assert_eq!(store.data().instances().get::<Counter>(handle)?.value, 15);
    Ok(())
}

#[test]
fn test_component_calls_void_function() -> anyhow::Result<()> {
    let engine = engine();
    let component = Component::new(&engine, wat::parse_str(COUNTER_COMPONENT)?)?;
    let linker = linker(&engine);

    let mut store = Store::new(&engine, HostContext::new());
    let handle = store.data_mut().instances_mut().insert(Counter { value: 42 })?;

    let instance = linker.instantiate(&mut store, &component)?;
    let clear = instance.get_typed_func::<(u64,), ()>(&mut store, "clear")?;
    clear.call(&mut store, (handle.to_bits(),))?;
    clear.post_return(&mut store)?;

    assert_eq!(store.data().instances().get::<Counter>(handle)?.value, 0);
    Ok(())
}

#[test]
fn test_component_null_handle_is_absorbed() -> anyhow::Result<()> {
    let engine = engine();
    let component = Component::new(&engine, wat::parse_str(COUNTER_COMPONENT)?)?;
    let linker = linker(&engine);

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let ctx = HostContext::new().with_error_handler(move |d| {
        sink.lock().unwrap().push(d.clone());
    });
    let mut store = Store::new(&engine, ctx);
    let handle = store.data_mut().instances_mut().insert(Counter { value: 42 })?;

    let instance = linker.instantiate(&mut store, &component)?;
    let clear = instance.get_typed_func::<(u64,), ()>(&mut store, "clear")?;
    clear.call(&mut store, (0,))?;
    clear.post_return(&mut store)?;

    assert_eq!(store.data().instances().get::<Counter>(handle)?.value, 42);
    assert_eq!(*reported.lock().unwrap(), vec![CallDiagnostic::NullHandle]);
    Ok(())
}

#[test]
fn test_component_absorbed_call_returns_zero() -> anyhow::Result<()> {
    let engine = engine();
    let component = Component::new(&engine, wat::parse_str(COUNTER_COMPONENT)?)?;
    let linker = linker(&engine);

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let ctx = HostContext::new().with_error_handler(move |d| {
        sink.lock().unwrap().push(d.clone());
    });
    let mut store = Store::new(&engine, ctx);
    let handle = store.data_mut().instances_mut().insert(Counter { value: 10 })?;

    let instance = linker.instantiate(&mut store, &component)?;
    let bump = instance.get_typed_func::<(u64, i32), (i32,)>(&mut store, "bump")?;

    let (value,) = bump.call(&mut store, (0, 5))?;
    bump.post_return(&mut store)?;
    assert_eq!(value, 0);

    store.data_mut().instances_mut().remove::<Counter>(handle)?;
    let (value,) = bump.call(&mut store, (handle.to_bits(), 5))?;
    bump.post_return(&mut store)?;
    assert_eq!(value, 0);

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 2);
    assert_eq!(reported[0], CallDiagnostic::NullHandle);
    assert!(matches!(
        reported[1],
        CallDiagnostic::UnresolvedHandle { error: HandleError::Stale(_), .. }
    ));
    Ok(())
}
