//! The Lua state wrapper and table conversion.

use hostbridge_table::{Flatten, Table, Value};
use mlua::{FromLua, FromLuaMulti, IntoLuaMulti, Lua, Table as LuaTable};
use serde::Serialize;

use crate::error::ScriptError;
use crate::Result;

/// Copy every binding of `source` into the Lua table `target`.
///
/// Integers become Lua integers and nested tables become fresh Lua tables.
/// Keys already present in `target` are overwritten.
pub fn populate_lua_table(lua: &Lua, source: &Table, target: &LuaTable) -> mlua::Result<()> {
    for (key, value) in source {
        match value {
            Value::Integer(n) => target.set(key.as_str(), *n)?,
            Value::Table(nested) => target.set(key.as_str(), to_lua_table(lua, nested)?)?,
        }
    }
    Ok(())
}

/// Build a new Lua table holding the bindings of `source`.
pub fn to_lua_table(lua: &Lua, source: &Table) -> mlua::Result<LuaTable> {
    let table = lua.create_table()?;
    populate_lua_table(lua, source, &table)?;
    Ok(table)
}

/// An embedded Lua interpreter with helpers for exposing host structures.
pub struct ScriptHost {
    lua: Lua,
}

impl ScriptHost {
    /// Open a fresh interpreter with the standard libraries loaded.
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }

    /// Access the underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Flatten `value` and bind it as the global table `name`.
    pub fn bind_global<T: Flatten>(&self, name: &str, value: &T) -> Result<()> {
        let table = value.to_table()?;
        self.bind_table(name, &table)
    }

    /// Flatten a `Serialize` structure and bind it as the global table `name`.
    pub fn bind_serialized<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let table = hostbridge_table::to_table(value)?;
        self.bind_table(name, &table)
    }

    /// Bind an already flattened table as the global `name`.
    pub fn bind_table(&self, name: &str, table: &Table) -> Result<()> {
        let lua_table = to_lua_table(&self.lua, table)?;
        self.lua.globals().set(name, lua_table)?;
        tracing::debug!(global = name, %table, "bound host table");
        Ok(())
    }

    /// Run a chunk of Lua code; `name` shows up in Lua error messages.
    pub fn exec(&self, name: &str, chunk: &str) -> Result<()> {
        tracing::debug!(chunk = name, "executing Lua chunk");
        self.lua.load(chunk).set_name(name).exec()?;
        Ok(())
    }

    /// Evaluate a Lua expression or chunk and convert its result.
    pub fn eval<R: FromLuaMulti>(&self, chunk: &str) -> Result<R> {
        Ok(self.lua.load(chunk).eval()?)
    }

    /// Read a global variable.
    pub fn global<R: FromLua>(&self, name: &str) -> Result<R> {
        Ok(self.lua.globals().get(name)?)
    }

    /// Call the global function `function` with `args`.
    pub fn call<R: FromLuaMulti>(&self, function: &str, args: impl IntoLuaMulti) -> Result<R> {
        let func = match self.lua.globals().get::<mlua::Value>(function)? {
            mlua::Value::Function(func) => func,
            other => {
                return Err(ScriptError::MissingFunction {
                    name: function.to_string(),
                    found: other.type_name(),
                })
            }
        };
        tracing::debug!(function, "calling Lua function");
        Ok(func.call(args)?)
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_nested() {
        let lua = Lua::new();
        let mut inner = Table::new();
        inner.set("n", 5);
        let mut outer = Table::new();
        outer.set("inner", inner);

        let lua_table = to_lua_table(&lua, &outer).unwrap();
        let nested: LuaTable = lua_table.get("inner").unwrap();
        let n: i64 = nested.get("n").unwrap();
        assert_eq!(n, 5);
    }

    #[test]
    fn test_populate_keeps_existing_keys() {
        let lua = Lua::new();
        let target = lua.create_table().unwrap();
        target.set("kept", 1).unwrap();
        target.set("n", 0).unwrap();

        let mut source = Table::new();
        source.set("n", 9);
        populate_lua_table(&lua, &source, &target).unwrap();

        assert_eq!(target.get::<i64>("kept").unwrap(), 1);
        assert_eq!(target.get::<i64>("n").unwrap(), 9);
    }

    #[test]
    fn test_call_missing_function() {
        let host = ScriptHost::new();
        let err = host.call::<i64>("nope", ()).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MissingFunction { ref name, found: "nil" } if name == "nope"
        ));
    }

    #[test]
    fn test_call_non_function_global() {
        let host = ScriptHost::new();
        host.exec("setup", "answer = 42").unwrap();
        let err = host.call::<i64>("answer", ()).unwrap_err();
        assert!(matches!(err, ScriptError::MissingFunction { found: "integer", .. }));
    }

    #[test]
    fn test_exec_syntax_error() {
        let host = ScriptHost::new();
        let err = host.exec("broken", "function (").unwrap_err();
        assert!(matches!(err, ScriptError::Lua(_)));
    }
}
