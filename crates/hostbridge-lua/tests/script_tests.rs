/// Integration tests for binding host structures into Lua

use hostbridge_lua::{run_add, RuntimeRegistry, ScriptError, ScriptHost, ADD_SCRIPT};
use hostbridge_table::FlattenError;
use rand::Rng;
use serde::Serialize;

#[derive(Serialize)]
struct Limits {
    #[serde(rename = "max")]
    max: u32,
}

#[derive(Serialize)]
struct Config {
    #[serde(rename = "limits")]
    limits: Limits,
    #[serde(rename = "scale")]
    scale: f32,
}

#[derive(Serialize)]
struct Settings {
    #[serde(rename = "limits")]
    limits: Limits,
}

#[test]
fn test_add_returns_n_plus_100() {
    assert_eq!(run_add(&RuntimeRegistry::new(7)).unwrap(), 107);
}

#[test]
fn test_lua_reads_bound_integer() {
    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let n: i64 = rng.gen_range(-1_000_000..1_000_000);
        let host = ScriptHost::new();
        host.bind_global("runtime", &RuntimeRegistry::new(n)).unwrap();

        let read: i64 = host.eval("return runtime.variables.n").unwrap();
        assert_eq!(read, n);
    }
}

#[test]
fn test_nested_table_is_lua_table() {
    let host = ScriptHost::new();
    host.bind_global("runtime", &RuntimeRegistry::new(1)).unwrap();

    let outer: String = host.eval("return type(runtime)").unwrap();
    let inner: String = host.eval("return type(runtime.variables)").unwrap();
    let leaf: String = host.eval("return math.type(runtime.variables.n)").unwrap();
    assert_eq!(outer, "table");
    assert_eq!(inner, "table");
    assert_eq!(leaf, "integer");
}

#[test]
fn test_script_defined_against_host_table() {
    let host = ScriptHost::new();
    host.bind_global("runtime", &RuntimeRegistry::new(23)).unwrap();
    host.exec("add", ADD_SCRIPT).unwrap();

    let result: i64 = host.call("add", ()).unwrap();
    assert_eq!(result, 123);
}

#[test]
fn test_bind_serialized() {
    let host = ScriptHost::new();
    host.bind_serialized("settings", &Settings { limits: Limits { max: 8 } }).unwrap();

    let max: i64 = host.eval("return settings.limits.max").unwrap();
    assert_eq!(max, 8);
}

#[test]
fn test_bind_serialized_rejects_float() {
    let host = ScriptHost::new();
    let err = host
        .bind_serialized(
            "config",
            &Config {
                limits: Limits { max: 1 },
                scale: 1.5,
            },
        )
        .unwrap_err();

    match err {
        ScriptError::Flatten(FlattenError::UnsupportedField { key, kind }) => {
            assert_eq!(key, "scale");
            assert_eq!(kind, "float");
        }
        other => panic!("unexpected error: {}", other),
    }

    // Nothing was bound
    let config: mlua::Value = host.global("config").unwrap();
    assert!(config.is_nil());
}

#[test]
fn test_script_runtime_error_surfaces() {
    let host = ScriptHost::new();
    // `runtime` was never bound, so indexing it fails inside Lua
    host.exec("add", ADD_SCRIPT).unwrap();
    let err = host.call::<i64>("add", ()).unwrap_err();
    assert!(matches!(err, ScriptError::Lua(_)));
}
