//! The `runtime` registry exposed to scripts and the `add` script that reads it.

use hostbridge_table::table_struct;

use crate::host::ScriptHost;
use crate::Result;

/// Name of the global table the registry is bound to.
pub const RUNTIME_GLOBAL: &str = "runtime";

/// Defines `add()`, which reads `runtime.variables.n` and adds 100.
pub const ADD_SCRIPT: &str = r#"
function add()
    return runtime.variables.n + 100
end
"#;

table_struct! {
    /// Variables visible to scripts as `runtime.variables`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Variables {
        pub n: i64 => "n",
    }
}

table_struct! {
    /// Host state visible to scripts as the `runtime` global.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RuntimeRegistry {
        pub variables: Variables => "variables",
    }
}

impl RuntimeRegistry {
    pub fn new(n: i64) -> Self {
        Self {
            variables: Variables { n },
        }
    }
}

/// Bind `registry` as `runtime`, load [`ADD_SCRIPT`] and return `add()`.
pub fn run_add(registry: &RuntimeRegistry) -> Result<i64> {
    let host = ScriptHost::new();
    host.bind_global(RUNTIME_GLOBAL, registry)?;
    host.exec("add", ADD_SCRIPT)?;
    let result: i64 = host.call("add", ())?;
    tracing::info!(n = registry.variables.n, result, "add() completed");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_add() {
        assert_eq!(run_add(&RuntimeRegistry::new(7)).unwrap(), 107);
    }

    #[test]
    fn test_run_add_negative() {
        assert_eq!(run_add(&RuntimeRegistry::new(-100)).unwrap(), 0);
    }
}
