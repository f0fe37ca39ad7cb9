/// Invocation of the Rust compiler for plugin sources

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PluginError, Result};

/// The compiler used to turn plugin sources into loadable modules
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Path or name of the `rustc` executable
    rustc: PathBuf,
    /// Value passed as `-C opt-level`
    opt_level: u8,
    edition: String,
}

impl Toolchain {
    /// Use the given `rustc` executable
    pub fn new(rustc: impl Into<PathBuf>) -> Self {
        Self {
            rustc: rustc.into(),
            opt_level: 0,
            edition: "2021".to_string(),
        }
    }

    /// Use `$RUSTC` if set and non-empty, otherwise `rustc` from `PATH`
    pub fn from_env() -> Self {
        Self::new(resolve_rustc(std::env::var_os("RUSTC")))
    }

    pub fn opt_level(mut self, level: u8) -> Self {
        self.opt_level = level;
        self
    }

    pub fn edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }

    pub fn rustc(&self) -> &Path {
        &self.rustc
    }

    /// Compile `source` into the dynamic library `output`
    pub fn compile(&self, crate_name: &str, source: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.rustc);
        cmd.arg("--crate-type")
            .arg("cdylib")
            .arg("--crate-name")
            .arg(crate_name)
            .arg("--edition")
            .arg(&self.edition)
            .arg("-C")
            .arg(format!("opt-level={}", self.opt_level))
            .arg("-o")
            .arg(output)
            .arg(source);

        tracing::debug!(command = ?cmd, "invoking compiler");

        let result = cmd.output().map_err(|e| PluginError::ToolchainSpawn {
            program: self.rustc.display().to_string(),
            source: e,
        })?;

        if !result.status.success() {
            return Err(PluginError::CompileFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        tracing::info!(output = %output.display(), "compiled plugin");
        Ok(())
    }
}

fn resolve_rustc(var: Option<OsString>) -> PathBuf {
    match var {
        Some(rustc) if !rustc.is_empty() => PathBuf::from(rustc),
        _ => PathBuf::from("rustc"),
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_compiler() {
        let toolchain = Toolchain::new("/nonexistent/hostbridge-rustc");
        let err = toolchain
            .compile("plugin", Path::new("plugin.rs"), Path::new("libplugin.so"))
            .unwrap_err();
        assert!(matches!(err, PluginError::ToolchainSpawn { .. }));
    }

    #[test]
    fn test_resolve_rustc() {
        assert_eq!(resolve_rustc(None), PathBuf::from("rustc"));
        assert_eq!(resolve_rustc(Some(OsString::new())), PathBuf::from("rustc"));
        assert_eq!(
            resolve_rustc(Some(OsString::from("/opt/rust/bin/rustc"))),
            PathBuf::from("/opt/rust/bin/rustc")
        );
    }

    #[test]
    fn test_from_env_honors_rustc_override() {
        let previous = std::env::var_os("RUSTC");
        std::env::set_var("RUSTC", "/opt/custom/rustc");
        let toolchain = Toolchain::from_env();
        match previous {
            Some(value) => std::env::set_var("RUSTC", value),
            None => std::env::remove_var("RUSTC"),
        }
        assert_eq!(toolchain.rustc(), Path::new("/opt/custom/rustc"));
    }

    #[test]
    fn test_builder() {
        let toolchain = Toolchain::new("rustc").opt_level(2).edition("2018");
        assert_eq!(toolchain.rustc(), Path::new("rustc"));
        assert_eq!(toolchain.opt_level, 2);
        assert_eq!(toolchain.edition, "2018");
    }
}
