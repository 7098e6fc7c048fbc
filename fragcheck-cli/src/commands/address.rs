//! Address Command
//!
//! Shows the address controlled by the configured private key.

use crate::config::WalletConfig;
use crate::identity::{check_key, AddressCheck};
use crate::symbols;
use anyhow::{Context, Result};
use console::style;

/// Run address command
pub fn run(wallet: &WalletConfig) -> Result<()> {
    let key = wallet
        .private_key
        .as_deref()
        .context("No private key configured. Set FRAGCHECK_PRIVATE_KEY or [wallet].private_key")?;

    match check_key(key, wallet.expected_address.as_deref()) {
        AddressCheck::InvalidKey(e) => return Err(e.into()),
        AddressCheck::Unchecked { derived } => {
            println!("{}", derived);
        }
        AddressCheck::Match { derived } => {
            println!("{}", derived);
            println!("{} Matches expected address", style(symbols::CHECK).green());
        }
        AddressCheck::Mismatch { derived, expected } => {
            println!("{}", derived);
            println!(
                "{} Does not match expected address {}",
                style(symbols::WARN).yellow(),
                expected
            );
        }
    }

    Ok(())
}
