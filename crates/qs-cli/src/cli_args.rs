use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "qs-cli")]
#[command(about = "Headless runner and checker for quest scripts")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Run a script directory until every chain finishes.
    Run(RunArgs),
    /// Parse every script and validate commands against the registry.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry", default_value = "main.txt")]
    pub(crate) entry: String,
    /// Answers for selection prompts, consumed in order; 0 once exhausted.
    #[arg(long = "choice")]
    pub(crate) choices: Vec<i32>,
    /// JSON object of initial integer variables.
    #[arg(long = "vars")]
    pub(crate) vars: Option<String>,
    #[arg(long = "max-frames", default_value_t = 600)]
    pub(crate) max_frames: u32,
    #[arg(long = "frame-ms", default_value_t = 16)]
    pub(crate) frame_ms: i64,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
    #[arg(long = "state-out")]
    pub(crate) state_out: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
}
