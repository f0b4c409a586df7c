//! # elm-overlay CLI
//!
//! Runs a build tool with `elm-package.json` reads redirected to a substitute.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use elm_overlay_config::logging::{init_logging, LogLevel};
use elm_overlay_config::LauncherConfig;
use elm_overlay_fs::TARGET_FILENAME;

mod launcher;
mod shim;

/// Substitute a package's elm-package.json for the duration of one command
#[derive(Parser)]
#[command(name = "elm-overlay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Launcher config file with an [overlay] table
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Rule and shim location; each falls back to the environment, then the config file
#[derive(Args, Debug, Default)]
pub struct RuleArgs {
    /// Manifest to read instead
    #[arg(long = "use", value_name = "PATH")]
    pub use_path: Option<PathBuf>,

    /// Manifest to replace
    #[arg(long, value_name = "PATH")]
    pub instead_of: Option<PathBuf>,

    /// Shim library to preload
    #[arg(long, value_name = "LIB")]
    pub shim: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a command with the overlay preloaded
    Run {
        #[command(flatten)]
        rule: RuleArgs,

        /// Working directory for the command
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Output shell exports for eval
    Env {
        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Show which file a request would actually open
    Resolve {
        #[command(flatten)]
        rule: RuleArgs,

        /// Directory the request is made from (default: current directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        #[arg(default_value = TARGET_FILENAME)]
        path: PathBuf,
    },

    /// Print the effective launcher configuration as TOML
    Config,
}

fn main() -> Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    init_logging(LogLevel::Warn);

    let cli = Cli::parse();
    let config = LauncherConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { rule, cwd, command } => {
            let merged = launcher::merge(&config, &rule);
            let overlay = launcher::require_rule(&merged)?;
            let shim_path = shim::find_shim_library(merged.overlay.shim.as_deref())?;
            let code = launcher::cmd_run(&overlay, &shim_path, cwd.as_deref(), &command)?;
            std::process::exit(code);
        }
        Commands::Env { rule } => {
            let merged = launcher::merge(&config, &rule);
            let overlay = launcher::require_rule(&merged)?;
            let shim_path = shim::find_shim_library(merged.overlay.shim.as_deref())?;
            std::io::stdout().write_all(&launcher::cmd_env(&overlay, &shim_path))?;
        }
        Commands::Resolve { rule, dir, path } => {
            let merged = launcher::merge(&config, &rule);
            let effective = launcher::cmd_resolve(&merged, dir.as_deref(), &path);
            println!("{}", effective.display());
        }
        Commands::Config => {
            let merged = launcher::merge(&config, &RuleArgs::default());
            print!("{}", merged.to_toml()?);
        }
    }

    Ok(())
}
