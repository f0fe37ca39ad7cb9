/// Statically linked plugin registry
///
/// Plugins are resolved by name from a table filled at startup. Builtins are
/// plain Rust types linked into the binary; modules compiled by the pipeline
/// can be registered alongside them through [`DynamicPlugin`].

use std::collections::HashMap;

use crate::error::{PluginError, Result};
use crate::loader::{ExportedFn, LoadedModule};

/// An `i64 -> i64` extension point
pub trait Plugin {
    /// Name the plugin is registered under
    fn name(&self) -> &str;

    fn call(&self, arg: i64) -> i64;
}

/// Builtin plugin adding a fixed offset to its argument
#[derive(Debug, Clone)]
pub struct Offset {
    name: String,
    offset: i64,
}

impl Offset {
    pub fn new(name: impl Into<String>, offset: i64) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

impl Plugin for Offset {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, arg: i64) -> i64 {
        arg.wrapping_add(self.offset)
    }
}

/// A function exported by a loaded module, usable as a [`Plugin`]
#[derive(Debug)]
pub struct DynamicPlugin {
    name: String,
    func: ExportedFn,
    // Keeps `func` valid; must outlive every call
    module: LoadedModule,
}

impl DynamicPlugin {
    /// Resolve `symbol` in `module` once, up front
    pub fn new(name: impl Into<String>, module: LoadedModule, symbol: &str) -> Result<Self> {
        let func = module.symbol(symbol)?;
        Ok(Self {
            name: name.into(),
            func,
            module,
        })
    }

    /// Release the function and unload its module
    pub fn unload(self) -> Result<()> {
        self.module.close()
    }
}

impl Plugin for DynamicPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, arg: i64) -> i64 {
        // Safety: `self.module` is still loaded, so `func` points into mapped code
        unsafe { (self.func)(arg) }
    }
}

/// Plugins indexed by name
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Box<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the builtin plugins registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register all builtin plugins
    pub fn register_builtins(&mut self) {
        self.register(Box::new(Offset::new("add100", 100)));
        self.register(Box::new(Offset::new("identity", 0)));
    }

    /// Register a plugin, replacing and returning any plugin of the same name
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Option<Box<dyn Plugin>> {
        let name = plugin.name().to_string();
        tracing::debug!(plugin = %name, "registering plugin");
        self.plugins.insert(name, plugin)
    }

    /// Remove a plugin from the registry
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Plugin>> {
        self.plugins.remove(name)
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins.get(name).map(|p| p.as_ref())
    }

    /// Call the plugin registered as `name`
    pub fn call(&self, name: &str, arg: i64) -> Result<i64> {
        self.get(name)
            .map(|plugin| plugin.call(arg))
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))
    }

    /// List registered plugin names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
