//! Embedded Lua host for flattened host structures.
//!
//! [`ScriptHost`] owns a Lua state for its whole lifetime. Host structures are
//! flattened into [`hostbridge_table::Table`]s, copied into Lua tables and
//! bound as globals, after which script functions can read them.

mod error;
mod host;
pub mod runtime;

pub use error::ScriptError;
pub use host::{populate_lua_table, to_lua_table, ScriptHost};
pub use runtime::{run_add, RuntimeRegistry, Variables, ADD_SCRIPT};

/// Result type for script host operations.
pub type Result<T> = std::result::Result<T, ScriptError>;
