/// Runtime-compiled plugins and a statically linked plugin registry
///
/// The pipeline renders plugin source from a template, compiles it into a
/// loadable module with the Rust toolchain, loads it, calls its exported
/// function and removes every intermediate file. The registry offers the
/// same `i64 -> i64` extension point without any compilation step.

pub mod error;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod template;
pub mod toolchain;

pub use error::{PluginError, Result};
pub use loader::{ExportedFn, LoadedModule};
pub use pipeline::{BuildDir, Pipeline, PipelineOptions, PipelineOutput};
pub use registry::{DynamicPlugin, Offset, Plugin, PluginRegistry};
pub use template::{render_add_plugin, Bindings, Template, ADD_SYMBOL, ADD_TEMPLATE};
pub use toolchain::Toolchain;
