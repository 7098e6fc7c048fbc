//! fragcheck CLI
//!
//! Generates a random file, splits it into fragments, uploads every
//! fragment to a content-addressed store, downloads each one back by its
//! content handle and verifies the bytes before and after reassembly.
//!
//! # Commands
//! - `run` - Execute the fragment round trip
//! - `address` - Show the address of the configured private key
//! - `config` - Show or initialize configuration
//!
//! # Configuration
//! Config file: ./fragcheck.toml (override with --config or FRAGCHECK_CONFIG)

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use fragcheck_cli::commands::{self, run::RunOptions};
use fragcheck_cli::config::{Backend, FragcheckConfig};
use fragcheck_cli::symbols;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fragcheck")]
#[command(about = "Fragment, upload, download and verify a random file")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, env = "FRAGCHECK_CONFIG", default_value = "fragcheck.toml")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fragment round trip
    Run {
        /// Storage backend
        #[arg(short, long, value_enum)]
        backend: Option<Backend>,

        /// Size of the generated file in bytes
        #[arg(short, long)]
        total_size: Option<u64>,

        /// Fragment size in bytes
        #[arg(short, long)]
        fragment_size: Option<u64>,

        /// Replicas requested from node selection
        #[arg(short, long)]
        replicas: Option<usize>,

        /// Directory for temporary files (must be empty or absent)
        #[arg(short, long)]
        work_dir: Option<PathBuf>,

        /// Skip the store's integrity proof check on download
        #[arg(long)]
        no_verify_proof: bool,

        /// Leave the work directory on disk afterwards
        #[arg(long)]
        keep_work_dir: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the address controlled by the configured private key
    Address,

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging (stderr keeps --json output clean)
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if cli.verbose {
        filter = filter
            .add_directive("fragcheck_core=debug".parse()?)
            .add_directive("fragcheck_cli=debug".parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = FragcheckConfig::load_or_default(&cli.config).with_env_overrides();

    match cli.command {
        Commands::Run {
            backend,
            total_size,
            fragment_size,
            replicas,
            work_dir,
            no_verify_proof,
            keep_work_dir,
            json,
        } => {
            // CLI args override config file and environment
            if let Some(backend) = backend {
                cfg.store.backend = backend;
            }
            if let Some(total_size) = total_size {
                cfg.run.total_size = total_size;
            }
            if let Some(fragment_size) = fragment_size {
                cfg.run.fragment_size = fragment_size;
            }
            if let Some(replicas) = replicas {
                cfg.run.replicas = replicas;
            }
            if let Some(work_dir) = work_dir {
                cfg.run.work_dir = work_dir;
            }
            if no_verify_proof {
                cfg.run.verify_proof = false;
            }
            if keep_work_dir {
                cfg.run.keep_work_dir = true;
            }
            cfg.validate()?;

            let success = commands::run(&cfg, RunOptions { json }).await?;
            if !success {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Address => {
            commands::address(&cfg.wallet)?;
        }

        Commands::Config { command } => {
            handle_config_command(command, &cli.config, &cfg)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Handle config subcommands
fn handle_config_command(
    command: Option<ConfigCommands>,
    path: &Path,
    cfg: &FragcheckConfig,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let mut shown = cfg.clone();
            if shown.wallet.private_key.is_some() {
                shown.wallet.private_key = Some("[REDACTED]".to_string());
            }

            println!();
            println!("{}", style("fragcheck Configuration").bold().underlined());
            println!();
            print!("{}", toml::to_string_pretty(&shown)?);
            println!();

            println!("{} {}", style("Config file:").dim(), path.display());
            if !path.exists() {
                println!(
                    "{} Run '{}' to create it",
                    style("(not created yet)").yellow(),
                    style("fragcheck config init").green()
                );
            }
        }

        Some(ConfigCommands::Path) => {
            println!("{}", path.display());
        }

        Some(ConfigCommands::Init { force }) => {
            if path.exists() && !force {
                println!(
                    "{} Config file already exists at {}",
                    style(symbols::WARN).yellow(),
                    path.display()
                );
                println!("Use --force to overwrite");
                return Ok(());
            }

            FragcheckConfig::default().save(path)?;
            println!(
                "{} Config file created at {}",
                style(symbols::CHECK).green(),
                path.display()
            );
        }
    }

    Ok(())
}
