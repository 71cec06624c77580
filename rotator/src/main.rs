//! Timestamped folder rotation CLI.
//!
//! Creates `{prefix}{timestamp}` under a base directory after pruning the
//! oldest matching folders beyond the retention count. Prints the created
//! path so scripts can download into it.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rotator::FolderRotator;
use rotator::exit_codes;
use rotator::io::config::{RotatorConfig, load_config, write_config};
use rotator::logging;

#[derive(Parser)]
#[command(
    name = "rotator",
    version,
    about = "Create a timestamped folder and prune the oldest ones"
)]
struct Cli {
    /// TOML config file. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete folders beyond the retention count, then create a new one.
    Rotate(RotateArgs),
    /// Print what `rotate` would delete and create without changing anything.
    Plan(RotateArgs),
    /// Write the effective settings (config file plus flags) as TOML.
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    /// Where to write the config.
    #[arg(long)]
    output: PathBuf,

    /// Replace an existing file.
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    settings: RotateArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct RotateArgs {
    /// Existing directory that holds the rotated folders.
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Literal prefix, including any separator (e.g. `erap_`).
    #[arg(long)]
    prefix: Option<String>,

    /// strftime format for the timestamp.
    #[arg(long)]
    date_format: Option<String>,

    /// Regex for earlier folders; derived from the date format if omitted.
    #[arg(long)]
    pattern: Option<String>,

    /// Existing folders to keep, not counting the new one.
    #[arg(long)]
    max_folder_count: Option<usize>,

    /// Reuse the new folder if it already exists.
    #[arg(long)]
    exist_ok: bool,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::for_error(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) if !path.exists() => bail!("config {} not found", path.display()),
        Some(path) => load_config(path)?,
        None => RotatorConfig::default(),
    };
    match cli.command {
        Command::Rotate(args) => cmd_rotate(&apply_args(cfg, &args)),
        Command::Plan(args) => cmd_plan(&apply_args(cfg, &args)),
        Command::InitConfig(args) => cmd_init_config(&apply_args(cfg, &args.settings), &args),
    }
}

/// Overlay command-line flags on the loaded config.
fn apply_args(mut cfg: RotatorConfig, args: &RotateArgs) -> RotatorConfig {
    if let Some(base_dir) = &args.base_dir {
        cfg.base_dir = Some(base_dir.clone());
    }
    if let Some(prefix) = &args.prefix {
        cfg.naming.prefix = prefix.clone();
    }
    if let Some(date_format) = &args.date_format {
        cfg.naming.date_format = date_format.clone();
        // A new format invalidates the configured pattern unless one is given.
        cfg.naming.pattern = None;
    }
    if let Some(pattern) = &args.pattern {
        cfg.naming.pattern = Some(pattern.clone());
    }
    if let Some(max_folder_count) = args.max_folder_count {
        cfg.max_folder_count = max_folder_count;
    }
    if args.exist_ok {
        cfg.exist_ok = true;
    }
    cfg
}

fn base_dir(cfg: &RotatorConfig) -> Result<PathBuf> {
    cfg.base_dir
        .clone()
        .context("no base directory: pass --base-dir or set base_dir in the config")
}

fn cmd_rotate(cfg: &RotatorConfig) -> Result<()> {
    let base_dir = base_dir(cfg)?;
    let options = cfg.to_options()?;
    let rotation = FolderRotator::new(&base_dir)
        .rotate(&options)
        .with_context(|| format!("rotate {}", base_dir.display()))?;
    for failure in &rotation.report.failed {
        eprintln!("warning: {}", failure);
    }
    println!("{}", rotation.directory.display());
    Ok(())
}

fn cmd_plan(cfg: &RotatorConfig) -> Result<()> {
    let base_dir = base_dir(cfg)?;
    let options = cfg.to_options()?;
    let plan = FolderRotator::new(&base_dir)
        .plan(&options)
        .with_context(|| format!("plan rotation in {}", base_dir.display()))?;
    for path in &plan.to_delete {
        println!("delete {}", path.display());
    }
    println!("create {}", plan.next_directory.display());
    Ok(())
}

fn cmd_init_config(cfg: &RotatorConfig, args: &InitConfigArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!("{} already exists (pass --force to replace it)", args.output.display());
    }
    write_config(&args.output, cfg)?;
    println!("{}", args.output.display());
    Ok(())
}
