//! Error types for the script host.

use hostbridge_table::FlattenError;
use thiserror::Error;

/// Errors that can occur while binding values or running scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The host structure could not be flattened.
    #[error("flatten error: {0}")]
    Flatten(#[from] FlattenError),

    /// The interpreter rejected a chunk or a call failed inside Lua.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// A called global is missing or is not a function.
    #[error("global `{name}` is not a function (found {found})")]
    MissingFunction { name: String, found: &'static str },
}
