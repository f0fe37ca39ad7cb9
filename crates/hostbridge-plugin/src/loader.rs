/// Loading compiled plugin modules

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::error::{PluginError, Result};

/// Signature of the functions plugins export
pub type ExportedFn = unsafe extern "C" fn(i64) -> i64;

/// A dynamic library loaded into the current process
pub struct LoadedModule {
    library: Library,
    path: PathBuf,
}

impl LoadedModule {
    /// Load the dynamic library at `path`
    pub fn load(path: &Path) -> Result<Self> {
        // Safety: loading runs the library's initializers; plugins are built by us from a known template
        let library = unsafe { Library::new(path) }.map_err(|e| PluginError::LibraryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "loaded module");

        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve an exported `i64 -> i64` function
    ///
    /// The returned pointer is only valid while this module stays loaded.
    pub fn symbol(&self, name: &str) -> Result<ExportedFn> {
        // Safety: the caller-facing signature matches what the template exports
        let symbol: Symbol<ExportedFn> = unsafe { self.library.get(name.as_bytes()) }.map_err(|e| {
            PluginError::SymbolNotFound {
                symbol: name.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(*symbol)
    }

    /// Look up `name` and call it with `arg`
    pub fn call_i64(&self, name: &str, arg: i64) -> Result<i64> {
        let func = self.symbol(name)?;
        // Safety: the module is still loaded for the duration of the call
        Ok(unsafe { func(arg) })
    }

    /// Unload the library, reporting any error from the platform loader
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.library
            .close()
            .map_err(|e| PluginError::LibraryLoad { path, message: e.to_string() })
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(libloading::library_filename("missing"));
        let err = LoadedModule::load(&path).unwrap_err();
        assert!(matches!(err, PluginError::LibraryLoad { .. }));
    }
}
