/// hostbridge CLI
///
/// Runs the Lua table demo and the runtime plugin pipeline.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing_subscriber::EnvFilter;

use hostbridge_lua::{run_add, RuntimeRegistry, ScriptHost};
use hostbridge_lua::runtime::RUNTIME_GLOBAL;
use hostbridge_plugin::{Pipeline, PipelineOptions, PluginRegistry, Toolchain, ADD_SYMBOL};
use hostbridge_table::Flatten;

#[derive(Parser, Debug)]
#[command(name = "hostbridge")]
#[command(about = "Expose host structures to Lua and run template-generated plugins")]
#[command(version)]
struct Args {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bind the runtime registry as a Lua table and call `add()`
    Lua {
        /// Value of `runtime.variables.n` (random in 0..100 if omitted)
        #[arg(short, long)]
        n: Option<i64>,

        /// Lua file defining `add()` to use instead of the builtin script
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Print the flattened table as JSON before running the script
        #[arg(long)]
        dump: bool,
    },

    /// Generate, compile and load a plugin, then call its `add` function
    Plugin {
        /// Constant substituted into the plugin template (random in 0..100 if omitted)
        #[arg(short, long)]
        number: Option<i64>,

        /// Argument passed to the plugin function
        #[arg(short, long, default_value_t = 100)]
        arg: i64,

        /// Path to the rustc executable (defaults to $RUSTC, then rustc)
        #[arg(long, value_name = "PATH")]
        rustc: Option<PathBuf>,

        /// Optimization level passed to rustc
        #[arg(long, default_value_t = 0)]
        opt_level: u8,

        /// Directory in which the scratch build directory is created
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        /// Keep the generated source and module instead of deleting them
        #[arg(long)]
        keep: bool,

        /// Print the generated source
        #[arg(long)]
        show_source: bool,
    },

    /// List the statically linked plugins, or call one
    Registry {
        /// Plugin to call
        name: Option<String>,

        /// Argument passed to the plugin
        #[arg(short, long, default_value_t = 100)]
        arg: i64,
    },
}

fn random_number() -> i64 {
    rand::thread_rng().gen_range(0..100)
}

fn run_lua(n: Option<i64>, script: Option<PathBuf>, dump: bool) -> anyhow::Result<()> {
    let registry = RuntimeRegistry::new(n.unwrap_or_else(random_number));

    if dump {
        let table = registry.to_table().context("failed to flatten runtime registry")?;
        println!("{}", serde_json::to_string_pretty(&table)?);
    }

    let result = evaluate_add(&registry, script.as_deref())?;
    println!("add() result: {}", result);
    Ok(())
}

/// Call `add()` from the builtin script, or from `script` when given
fn evaluate_add(registry: &RuntimeRegistry, script: Option<&Path>) -> anyhow::Result<i64> {
    let Some(path) = script else {
        return run_add(registry).context("add() failed");
    };

    let code = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let host = ScriptHost::new();
    host.bind_global(RUNTIME_GLOBAL, registry)
        .context("failed to bind runtime registry")?;
    host.exec(&path.display().to_string(), &code)
        .context("failed to load script")?;
    host.call::<i64>("add", ()).context("add() failed")
}

struct PluginArgs {
    number: Option<i64>,
    arg: i64,
    rustc: Option<PathBuf>,
    opt_level: u8,
    work_dir: Option<PathBuf>,
    keep: bool,
    show_source: bool,
}

fn run_plugin(args: PluginArgs) -> anyhow::Result<()> {
    let toolchain = match args.rustc {
        Some(rustc) => Toolchain::new(rustc),
        None => Toolchain::from_env(),
    }
    .opt_level(args.opt_level);

    let mut options = PipelineOptions::new()
        .toolchain(toolchain)
        .symbol(ADD_SYMBOL)
        .keep_artifacts(args.keep);
    if let Some(dir) = args.work_dir {
        options = options.work_dir(dir);
    }

    let number = args.number.unwrap_or_else(random_number);
    let output = Pipeline::new(options)
        .run(number, args.arg)
        .context("plugin pipeline failed")?;

    if args.show_source {
        println!("{}", output.source);
    }
    if output.kept {
        println!("Artifacts kept in: {}", output.build_dir.display());
    }
    println!("{}({}) result: {}", ADD_SYMBOL, args.arg, output.result);
    Ok(())
}

fn run_registry(name: Option<String>, arg: i64) -> anyhow::Result<()> {
    for line in registry_lines(&PluginRegistry::with_builtins(), name.as_deref(), arg)? {
        println!("{}", line);
    }
    Ok(())
}

/// Output of the `registry` command: the plugin names, or one call result
fn registry_lines(registry: &PluginRegistry, name: Option<&str>, arg: i64) -> anyhow::Result<Vec<String>> {
    match name {
        Some(name) => {
            let result = registry.call(name, arg)?;
            Ok(vec![format!("{}({}) result: {}", name, arg, result)])
        }
        None => Ok(registry.names().into_iter().map(String::from).collect()),
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Lua { n, script, dump } => run_lua(n, script, dump),
        Command::Plugin {
            number,
            arg,
            rustc,
            opt_level,
            work_dir,
            keep,
            show_source,
        } => run_plugin(PluginArgs {
            number,
            arg,
            rustc,
            opt_level,
            work_dir,
            keep,
            show_source,
        }),
        Command::Registry { name, arg } => run_registry(name, arg),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        process::exit(1);
    }
}
