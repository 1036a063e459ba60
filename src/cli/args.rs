//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    entity::{NamedCommands, PersonCommands},
    finance::FinanceCommands,
    item::ItemCommands,
};

#[derive(Parser)]
#[command(name = "repairdesk")]
#[command(author, version, about = "Repair shop inventory tracker")]
#[command(long_about = "Track repair items, the people who brought them in, due dates and payments in a local SQLite database.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Output format (default: from config, else table)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Inventory database file (overrides REPAIRDESK_DB and config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database or upgrade it to the current schema
    Init,

    /// Repair items: add, list, due board and status changes
    #[command(subcommand)]
    Item(ItemCommands),

    /// People who bring items in
    #[command(subcommand)]
    Person(PersonCommands),

    /// Item types (AC, washing machine, ...)
    #[command(subcommand)]
    Type(NamedCommands),

    /// PCB models
    #[command(subcommand)]
    Pcb(NamedCommands),

    /// Revenue and payment summaries
    #[command(subcommand)]
    Finance(FinanceCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
}
