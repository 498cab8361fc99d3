use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use qs_core::ScriptError;
use qs_runtime::{CommandRegistry, EngineOptions};
use tracing_subscriber::EnvFilter;

mod boundary_runner;
mod checker;
mod cli_args;
mod error_map;
mod models;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{emit_run_report, run_headless};
pub(crate) use checker::{check_scripts, emit_check_report};
pub(crate) use cli_args::{CheckArgs, Cli, Mode, RunArgs};
pub(crate) use error_map::{emit_error, map_vars_invalid, map_walk_error, CliStage};
pub(crate) use models::{
    CheckReport, DiagnosticRecord, RunEvent, RunPlan, RunReport, RUN_REPORT_SCHEMA,
};
pub(crate) use source_loader::load_scripts;
pub(crate) use state_store::{load_variables, save_run_report};

/// Installs a stderr subscriber filtered by `RUST_LOG` (default `warn`), so
/// stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, ScriptError> {
    match cli.command {
        Mode::Run(args) => run_mode(args),
        Mode::Check(args) => check_mode(args),
    }
}

fn run_mode(args: RunArgs) -> Result<i32, ScriptError> {
    let scripts = load_scripts(&args.scripts_dir)?;
    let variables = match args.vars.as_deref() {
        Some(path) => load_variables(Path::new(path))?,
        None => Default::default(),
    };
    let options = EngineOptions {
        random_seed: args.seed,
        ..EngineOptions::default()
    };
    let report = run_headless(
        scripts,
        variables,
        options,
        RunPlan {
            entry: args.entry,
            choices: args.choices,
            max_frames: args.max_frames,
            frame_ms: args.frame_ms,
        },
    )?;

    if let Some(path) = args.state_out.as_deref() {
        save_run_report(Path::new(path), &report)?;
    }
    emit_run_report(&report, args.state_out.as_deref());
    Ok(0)
}

fn check_mode(args: CheckArgs) -> Result<i32, ScriptError> {
    let scripts = load_scripts(&args.scripts_dir)?;
    let report = check_scripts(&scripts, &CommandRegistry::with_builtins());
    Ok(emit_check_report(&report))
}

#[cfg(test)]
pub(crate) mod cli_test_support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("questscript-cli-{}-{}", name, nanos))
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    pub(crate) fn demo_dir(name: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("demos")
            .join(name)
            .to_string_lossy()
            .to_string()
    }
}
