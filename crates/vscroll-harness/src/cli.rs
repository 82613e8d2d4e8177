#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use vscroll_core::ControllerConfig;

use crate::error::Result;
use crate::logging;
use crate::replay::{format_step_text, load_trace, replay_trace, verify_digest};

#[derive(Debug, Parser)]
#[command(
    name = "vscroll-harness",
    about = "Replay vscroll op traces and check controller invariants",
    version
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a trace and print one step per op.
    Replay(ReplayArgs),

    /// Replay a trace and print only its digest.
    Digest(DigestArgs),

    /// Load and validate a controller config (TOML or JSON).
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSONL op trace.
    pub trace: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// Skip the per-step invariant checks.
    #[arg(long)]
    pub no_check: bool,

    /// Fail with exit code 3 unless the step digest matches.
    #[arg(long, value_name = "HEX")]
    pub expect_digest: Option<String>,
}

#[derive(Debug, Args)]
pub struct DigestArgs {
    pub trace: PathBuf,
}

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// `.json` files are parsed as JSON, anything else as TOML.
    pub file: PathBuf,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    match cli.command {
        Commands::Replay(args) => run_replay(&args, &mut out, &mut err),
        Commands::Digest(args) => run_digest(&args, &mut out),
        Commands::CheckConfig(args) => run_check_config(&args, &mut out),
    }
}

pub fn run_replay(args: &ReplayArgs, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    let trace = load_trace(&args.trace)?;
    let outcome = replay_trace(&trace, !args.no_check)?;

    match args.format {
        OutputFormat::Jsonl => {
            for line in &outcome.lines {
                writeln!(out, "{line}")?;
            }
        }
        OutputFormat::Text => {
            for step in &outcome.steps {
                writeln!(out, "{}", format_step_text(step))?;
            }
        }
    }
    out.flush()?;
    writeln!(err, "digest: {}", outcome.digest)?;

    if let Some(expected) = &args.expect_digest {
        verify_digest(expected, &outcome.digest)?;
    }
    Ok(())
}

pub fn run_digest(args: &DigestArgs, out: &mut impl Write) -> Result<()> {
    let trace = load_trace(&args.trace)?;
    let outcome = replay_trace(&trace, false)?;
    writeln!(out, "{}", outcome.digest)?;
    Ok(())
}

pub fn run_check_config(args: &CheckConfigArgs, out: &mut impl Write) -> Result<()> {
    let config = load_config(&args.file)?;
    let errors = config.validate();
    if !errors.is_empty() {
        tracing::warn!(
            message = "harness.config_invalid",
            path = %args.file.display(),
            count = errors.len()
        );
        return Err(vscroll_core::ConfigError::Validation(errors).into());
    }
    writeln!(out, "{}", config.to_toml_string()?.trim_end())?;
    Ok(())
}

fn load_config(path: &Path) -> Result<ControllerConfig> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        ControllerConfig::from_json_file(path)?
    } else {
        ControllerConfig::from_toml_file(path)?
    };
    Ok(config)
}
