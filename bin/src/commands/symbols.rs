//! Symbols command implementation.

use anyhow::Result;
use std::path::Path;

use crate::display::load_config;

/// Prints the configured instrument universe.
pub(crate) fn list_symbols(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = config.universe()?;

    println!("{:<10} {:<6} {:<6} {:>8}", "SYMBOL", "BASE", "QUOTE", "DIVISOR");
    println!("{}", "-".repeat(33));

    for instrument in universe.all() {
        println!(
            "{:<10} {:<6} {:<6} {:>8}",
            instrument.symbol(),
            instrument.base_currency(),
            instrument.quote_currency(),
            instrument.decimal_factor()
        );
    }

    println!();
    println!("Total: {} instruments", universe.len());

    Ok(())
}
