//! Run Command
//!
//! Generates a random file, pushes its fragments through the configured
//! store and reports what came back.

use crate::config::{Backend, FragcheckConfig, WalletConfig};
use crate::identity::{check_key, AddressCheck};
use crate::pipeline::{Pipeline, PipelineConfig, RunReport};
use crate::store::{HttpStore, IndexerClient, LocalStore, NodeSelector, RemoteStore};
use crate::symbols;
use anyhow::{Context, Result};
use console::style;
use fragcheck_core::WorkDir;
use tracing::{info, warn};

/// Run configuration
pub struct RunOptions {
    /// Print the report as JSON instead of the console summary
    pub json: bool,
}

/// Run the demo, returning whether every fragment and the merged file verified
pub async fn run(config: &FragcheckConfig, options: RunOptions) -> Result<bool> {
    check_wallet(&config.wallet, options.json);

    let work = WorkDir::create(&config.run.work_dir)
        .with_context(|| format!("Failed to prepare work directory {}", config.run.work_dir.display()))?
        .keep_on_drop(config.run.keep_work_dir);

    let (store, selector) = build_backend(config).await?;
    let pipeline = Pipeline::new(store.as_ref(), selector.as_ref(), PipelineConfig::from(config));

    let report = pipeline.run(&work).await.context("Run failed")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        if config.run.keep_work_dir {
            println!(
                "{} Work directory kept at {}",
                style(symbols::WARN).yellow(),
                work.path().display()
            );
        }
    }

    Ok(report.is_success())
}

async fn build_backend(
    config: &FragcheckConfig,
) -> Result<(Box<dyn RemoteStore>, Box<dyn NodeSelector>)> {
    let timeout = config.store.request_timeout();

    match config.store.backend {
        Backend::Local => {
            let store = LocalStore::open(config.local_store_dir())
                .await
                .context("Failed to open local store")?;
            info!(root = %store.root().display(), "Using local store");
            let selector: Box<dyn NodeSelector> = Box::new(store.clone());
            let store: Box<dyn RemoteStore> = Box::new(store);
            Ok((store, selector))
        }
        Backend::Http => {
            let selector: Box<dyn NodeSelector> = Box::new(
                IndexerClient::new(&config.network.indexer_rpc, timeout)
                    .context("Failed to create indexer client")?,
            );
            let store: Box<dyn RemoteStore> =
                Box::new(HttpStore::new(timeout).context("Failed to create storage client")?);
            info!(
                indexer = %config.network.indexer_rpc,
                evm_rpc = %config.network.evm_rpc,
                "Using storage network"
            );
            Ok((store, selector))
        }
    }
}

/// Address check before a run. Problems are reported, never fatal.
///
/// Returns `None` when no private key is configured.
fn check_wallet(wallet: &WalletConfig, quiet: bool) -> Option<AddressCheck> {
    let Some(key) = &wallet.private_key else {
        info!("No private key configured, skipping address check");
        return None;
    };

    let check = check_key(key, wallet.expected_address.as_deref());
    match &check {
        AddressCheck::Unchecked { derived } => {
            info!(address = %derived, "No expected address configured");
        }
        AddressCheck::Match { derived } => {
            info!(address = %derived, "Private key matches expected address");
        }
        AddressCheck::Mismatch { derived, expected } => {
            warn!(derived = %derived, expected = %expected, "Private key does not match expected address");
            if !quiet {
                println!(
                    "{} Private key controls {}, expected {}",
                    style(symbols::WARN).yellow(),
                    derived,
                    expected
                );
            }
        }
        AddressCheck::InvalidKey(e) => {
            warn!(error = %e, "Cannot derive address from private key");
            if !quiet {
                println!("{} {}", style(symbols::WARN).yellow(), e);
            }
        }
    }

    Some(check)
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", style("fragcheck run").bold().underlined());
    println!();
    println!(
        "  Source:     {} ({} bytes)",
        style(report.source.display()).cyan(),
        report.total_size
    );
    println!(
        "  Fragments:  {} of up to {} bytes",
        style(report.fragments.len()).cyan(),
        report.fragment_size
    );

    match &report.selection {
        Some(selection) => println!(
            "  Nodes:      {} trusted, {} discovered ({}, attempt {})",
            selection.trusted, selection.discovered, selection.strategy, selection.attempt
        ),
        None => println!("  Nodes:      {}", style("not selected").dim()),
    }

    if !report.fragments.is_empty() {
        println!();
        println!("{}", style(symbols::HLINE).dim());
    }

    for fragment in &report.fragments {
        let line = format!("part {:>3}  {:>6} bytes", fragment.index, fragment.size);

        match fragment.verified {
            Some(true) => println!("  {} {}", style(symbols::CHECK).green(), line),
            Some(false) => println!(
                "  {} {}  {}",
                style(symbols::CROSS).red(),
                line,
                style("content mismatch").red()
            ),
            None => println!(
                "  {} {}  {}",
                style(symbols::CROSS).red(),
                line,
                style(fragment.error.as_deref().unwrap_or("not transferred")).red()
            ),
        }

        if let Some(handle) = &fragment.handle {
            println!("        root {}", style(handle).dim());
        }
        if let Some(tx) = &fragment.tx_hash {
            println!("        tx   {}", style(tx).dim());
        }
    }

    if !report.fragments.is_empty() {
        println!("{}", style(symbols::HLINE).dim());
    }
    println!();

    match &report.merged {
        Some(merged) => {
            let summary = format!(
                "{} {} bytes from {} of {} fragments",
                symbols::status(merged.verified),
                merged.bytes,
                merged.fragments,
                report.fragments.len()
            );
            if merged.verified {
                println!("  Merged:     {}, matches source", style(summary).green());
            } else {
                println!("  Merged:     {}, differs from source", style(summary).red());
            }
        }
        None => println!("  Merged:     {} nothing to merge", symbols::SKIP),
    }

    println!(
        "  Verified:   {}/{} fragments in {} ms",
        report.verified_count(),
        report.fragments.len(),
        report.duration_ms()
    );
    println!();

    if report.is_success() {
        println!("{}", style("All data verified").green().bold());
    } else {
        println!("{}", style("Verification failed").red().bold());
    }
}
