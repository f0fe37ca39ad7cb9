/// The render, compile, load, call, cleanup pipeline

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{PluginError, Result};
use crate::loader::LoadedModule;
use crate::registry::DynamicPlugin;
use crate::template::{render_add_plugin, ADD_SYMBOL};
use crate::toolchain::Toolchain;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Compiler used to build plugin modules
    pub toolchain: Toolchain,
    /// Parent directory for the scratch build directory; system temp dir if unset
    pub work_dir: Option<PathBuf>,
    /// Crate and file stem of the generated module
    pub module_name: String,
    /// Function called after loading
    pub symbol: String,
    /// Leave the generated files on disk instead of deleting them
    pub keep_artifacts: bool,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self {
            toolchain: Toolchain::from_env(),
            work_dir: None,
            module_name: "plugin".to_string(),
            symbol: ADD_SYMBOL.to_string(),
            keep_artifacts: false,
        }
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Value returned by the plugin function
    pub result: i64,
    /// Generated plugin source
    pub source: String,
    /// Files produced during the run
    pub artifacts: Vec<PathBuf>,
    /// Scratch directory the artifacts were written to
    pub build_dir: PathBuf,
    /// Whether the artifacts were left on disk
    pub kept: bool,
}

/// Scratch directory holding a generated source file and its compiled module
#[derive(Debug)]
pub struct BuildDir {
    dir: TempDir,
    crate_name: String,
    source_path: PathBuf,
    library_path: PathBuf,
}

impl BuildDir {
    fn create(parent: Option<&Path>, module_name: &str) -> Result<Self> {
        let crate_name = crate_name(module_name)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("hostbridge-plugin-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent).map_err(|e| PluginError::io(parent, e))?,
            None => builder.tempdir().map_err(|e| PluginError::io(std::env::temp_dir(), e))?,
        };

        let source_path = dir.path().join(format!("{}.rs", module_name));
        let library_path = dir.path().join(libloading::library_filename(module_name));

        Ok(Self {
            dir,
            crate_name,
            source_path,
            library_path,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Name passed to the compiler as `--crate-name`
    pub fn crate_name(&self) -> &str {
        &self.crate_name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// The generated files, source first
    pub fn artifacts(&self) -> Vec<PathBuf> {
        vec![self.source_path.clone(), self.library_path.clone()]
    }

    /// Load the compiled module
    pub fn load(&self) -> Result<LoadedModule> {
        LoadedModule::load(&self.library_path)
    }

    /// Load the compiled module and wrap `symbol` as a named plugin
    pub fn load_plugin(&self, name: impl Into<String>, symbol: &str) -> Result<DynamicPlugin> {
        DynamicPlugin::new(name, self.load()?, symbol)
    }

    /// Delete the generated files and the scratch directory
    ///
    /// Modules loaded from this directory should be unloaded first.
    pub fn cleanup(self) -> Result<()> {
        for artifact in self.artifacts() {
            match fs::remove_file(&artifact) {
                Ok(()) => tracing::debug!(path = %artifact.display(), "removed artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PluginError::io(artifact, e)),
            }
        }
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| PluginError::io(path, e))
    }

    /// Keep the directory and its files on disk, returning its path
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

/// Crate name rustc accepts for `module_name`
///
/// Hyphens map to underscores, as Cargo does for package names. Anything
/// else outside `[A-Za-z0-9_]`, or a leading digit, is rejected.
fn crate_name(module_name: &str) -> Result<String> {
    let name = module_name.replace('-', "_");
    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PluginError::InvalidModuleName(module_name.to_string()));
    }
    Ok(name)
}

/// Merge the call and cleanup outcomes; when both fail the call error wins
/// and the cleanup error is only logged
fn settle(called: Result<i64>, cleaned: Result<()>) -> Result<i64> {
    match (called, cleaned) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(call_err), Ok(())) => Err(call_err),
        (Err(call_err), Err(cleanup_err)) => {
            tracing::warn!(error = %cleanup_err, "failed to remove plugin artifacts");
            Err(call_err)
        }
    }
}

/// Generates, builds and runs template plugins
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Render the add template with `number`, write it and compile it
    pub fn build(&self, number: i64) -> Result<BuildDir> {
        let source = render_add_plugin(number)?;
        self.build_source(&source)
    }

    /// Write `source` to a fresh scratch directory and compile it
    pub fn build_source(&self, source: &str) -> Result<BuildDir> {
        let build = BuildDir::create(self.options.work_dir.as_deref(), &self.options.module_name)?;

        fs::write(build.source_path(), source).map_err(|e| PluginError::io(build.source_path(), e))?;
        tracing::debug!(path = %build.source_path().display(), "wrote plugin source");

        self.options
            .toolchain
            .compile(build.crate_name(), build.source_path(), build.library_path())?;

        Ok(build)
    }

    /// Run the whole pipeline: build a plugin adding `number`, call it with
    /// `arg`, unload it and remove the generated files
    ///
    /// The files are removed even when loading or calling fails.
    pub fn run(&self, number: i64, arg: i64) -> Result<PipelineOutput> {
        let source = render_add_plugin(number)?;
        let build = self.build_source(&source)?;

        let called = self.call(&build, arg);

        let artifacts = build.artifacts();
        let build_dir = build.path().to_path_buf();
        let cleaned = if self.options.keep_artifacts {
            build.keep();
            Ok(())
        } else {
            build.cleanup()
        };

        let result = settle(called, cleaned)?;
        tracing::info!(number, arg, result, "plugin pipeline completed");

        Ok(PipelineOutput {
            result,
            source,
            artifacts,
            build_dir,
            kept: self.options.keep_artifacts,
        })
    }

    fn call(&self, build: &BuildDir, arg: i64) -> Result<i64> {
        let module = build.load()?;
        let result = module.call_i64(&self.options.symbol, arg);
        module.close()?;
        result
    }
}
