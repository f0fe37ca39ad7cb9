/// Error types for the plugin pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while rendering, compiling, loading or calling plugins
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("template error at byte {offset}: {message}")]
    Template { offset: usize, message: String },

    #[error("template references `{0}` but no value was bound")]
    MissingBinding(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run `{program}`: {source}")]
    ToolchainSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation failed ({status}):\n{stderr}")]
    CompileFailed { status: String, stderr: String },

    #[error("failed to load {}: {message}", .path.display())]
    LibraryLoad { path: PathBuf, message: String },

    #[error("symbol `{symbol}` not found: {message}")]
    SymbolNotFound { symbol: String, message: String },

    #[error("`{0}` is not a valid module name")]
    InvalidModuleName(String),

    #[error("no plugin named `{0}`")]
    UnknownPlugin(String),
}

impl PluginError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PluginError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;
