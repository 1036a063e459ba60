//! `repairdesk init` command - Create or upgrade the inventory database

use console::style;
use miette::Result;

use crate::cli::helpers::{database_path, open_store};
use crate::cli::GlobalOpts;
use crate::core::config::Config;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let path = database_path(global, &config);
    let existed = path.exists();

    let store = open_store(global, &config)?;
    let version = store.schema_version()?;

    if global.quiet {
        return Ok(());
    }

    let verb = if existed { "Opened" } else { "Created" };
    println!(
        "{} {} inventory database at {}",
        style("✓").green(),
        verb,
        style(store.path().unwrap_or(path.as_path()).display()).cyan()
    );
    println!("  Schema version: {}", version);

    Ok(())
}
