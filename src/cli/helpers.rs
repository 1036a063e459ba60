//! Shared helper functions for CLI commands
//!
//! Settings resolution, store access and the table/json/csv renderers used by
//! every command module.

use clap::ValueEnum;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::status::ItemStatus;
use crate::core::store::InventoryStore;

/// Output format: `--format`, then config / `REPAIRDESK_FORMAT`, then table
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|s| <OutputFormat as ValueEnum>::from_str(s.trim(), true).ok())
        })
        .unwrap_or_default()
}

/// Database path: `--db`, then config / `REPAIRDESK_DB`, then the data dir
pub fn database_path(global: &GlobalOpts, config: &Config) -> PathBuf {
    global
        .db
        .clone()
        .unwrap_or_else(|| config.database_path())
}

/// Open the configured database and bring it to the current schema
pub fn open_store(global: &GlobalOpts, config: &Config) -> Result<InventoryStore> {
    let path = database_path(global, config);
    tracing::debug!(path = %path.display(), "opening inventory database");
    Ok(InventoryStore::open(path)?)
}

/// Ask before a destructive change unless `--yes` was given
///
/// Returns false when stdin is not interactive.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !console::user_attended() {
        eprintln!(
            "{} Refusing to continue without a terminal; pass --yes to confirm",
            style("!").yellow()
        );
        return Ok(false);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print rows in the requested format
///
/// `value` is what gets serialized for JSON; tables and CSV use `headers` and
/// `rows`.
pub fn print_records<T: Serialize + ?Sized>(
    format: OutputFormat,
    headers: &[&str],
    rows: &[Vec<String>],
    value: &T,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Csv => print_csv(headers, rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", style("(none)").dim());
            } else {
                println!("{}", render_table(headers, rows));
            }
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

pub fn print_csv(headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(headers).into_diagnostic()?;
    for row in rows {
        writer.write_record(row).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Two-place money formatting
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Status label colored by urgency, for non-table output
pub fn styled_status(status: ItemStatus) -> String {
    let label = status.as_str();
    match status {
        ItemStatus::Overdue => style(label).red().bold().to_string(),
        ItemStatus::DueToday => style(label).yellow().to_string(),
        ItemStatus::Upcoming => style(label).green().to_string(),
        ItemStatus::NonRepairable => style(label).dim().to_string(),
        ItemStatus::HandedOver => style(label).cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(350)), "350.00");
        assert_eq!(format_amount(dec!(80.5)), "80.50");
    }

    #[test]
    fn test_output_format_precedence() {
        let config = Config {
            default_format: Some("JSON".to_string()),
            ..Default::default()
        };
        let mut global = GlobalOpts::default();
        assert_eq!(output_format(&global, &config), OutputFormat::Json);
        assert_eq!(output_format(&global, &Config::default()), OutputFormat::Table);

        global.format = Some(OutputFormat::Csv);
        assert_eq!(output_format(&global, &config), OutputFormat::Csv);
    }

    #[test]
    fn test_unknown_configured_format_falls_back_to_table() {
        let config = Config {
            default_format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert_eq!(
            output_format(&GlobalOpts::default(), &config),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_database_flag_wins() {
        let config = Config {
            database: Some(PathBuf::from("config.db")),
            ..Default::default()
        };
        let global = GlobalOpts {
            db: Some(PathBuf::from("flag.db")),
            ..Default::default()
        };
        assert_eq!(database_path(&global, &config), PathBuf::from("flag.db"));
        assert_eq!(
            database_path(&GlobalOpts::default(), &config),
            PathBuf::from("config.db")
        );
    }

    #[test]
    fn test_render_table_contains_cells() {
        let table = render_table(
            &["ID", "Name"],
            &[vec!["1".to_string(), "Asha".to_string()]],
        );
        assert!(table.contains("Name"));
        assert!(table.contains("Asha"));
    }
}
