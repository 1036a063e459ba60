//! `repairdesk item` command - Repair item management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;
use rust_decimal::Decimal;

use crate::cli::helpers::{
    confirm, format_amount, open_store, output_format, print_json, print_records, styled_status,
    truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::status::ItemStatus;
use crate::core::store::{sort_for_board, Item};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Register a new repair item
    Add {
        /// Item type ID
        #[arg(long = "type")]
        item_type: i64,

        /// Person ID
        #[arg(long)]
        person: i64,

        /// PCB model ID
        #[arg(long)]
        pcb: i64,

        /// Estimated repair time in days
        #[arg(long)]
        days: i64,
    },

    /// List all items, newest first
    List,

    /// Show the due board (items not yet handed over or written off)
    Due {
        /// Order by due date instead of person priority
        #[arg(long)]
        by_date: bool,
    },

    /// Show one item
    Show {
        /// Item ID
        id: i64,
    },

    /// Change the status of an active item
    Status {
        /// Item ID
        id: i64,

        /// New status
        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Hand an item back to its owner
    HandOver {
        /// Item ID
        id: i64,

        /// Amount charged for the repair
        #[arg(long)]
        amount: Decimal,

        /// The customer has already paid
        #[arg(long)]
        paid: bool,
    },

    /// Record payment for a handed-over item
    Paid {
        /// Item ID
        id: i64,
    },

    /// Permanently delete an item
    Delete {
        /// Item ID
        id: i64,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Statuses that can be set directly
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusArg {
    /// The item cannot be repaired
    NonRepairable,
    /// Back on the due board
    Upcoming,
}

impl From<StatusArg> for ItemStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::NonRepairable => ItemStatus::NonRepairable,
            StatusArg::Upcoming => ItemStatus::Upcoming,
        }
    }
}

const ITEM_HEADERS: &[&str] = &[
    "ID", "Serial", "Type", "Person", "PCB", "Created", "Due", "Status", "Amount", "Paid",
];

pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = output_format(global, &config);
    let mut store = open_store(global, &config)?;

    match cmd {
        ItemCommands::Add {
            item_type,
            person,
            pcb,
            days,
        } => {
            let id = store.add_item(item_type, person, pcb, days)?;
            let item = store.get_item(id)?;
            match format {
                OutputFormat::Json => print_json(&item)?,
                _ if global.quiet => println!("{}", id),
                _ => println!(
                    "{} Added item {} ({}) due {}",
                    style("✓").green(),
                    style(id).cyan(),
                    item.serial_number.as_deref().unwrap_or("-"),
                    item.due_date
                ),
            }
        }

        ItemCommands::List => {
            let items = store.list_items()?;
            print_items(format, &items)?;
        }

        ItemCommands::Due { by_date } => {
            let mut items = store.list_due_items()?;
            if by_date {
                sort_for_board(&mut items);
            }
            print_items(format, &items)?;
        }

        ItemCommands::Show { id } => {
            let item = store.get_item(id)?;
            match format {
                OutputFormat::Json => print_json(&item)?,
                _ => print_item_detail(&item),
            }
        }

        ItemCommands::Status { id, status } => {
            store.mark_status(id, status.into())?;
            if !global.quiet {
                let item = store.get_item(id)?;
                println!(
                    "{} Item {} is now {}",
                    style("✓").green(),
                    style(id).cyan(),
                    styled_status(item.status())
                );
            }
        }

        ItemCommands::HandOver { id, amount, paid } => {
            store.mark_handed_over(id, amount, paid)?;
            if !global.quiet {
                println!(
                    "{} Item {} handed over for {} ({})",
                    style("✓").green(),
                    style(id).cyan(),
                    format_amount(amount),
                    if paid { "paid" } else { "payment pending" }
                );
            }
        }

        ItemCommands::Paid { id } => {
            store.mark_paid(id)?;
            if !global.quiet {
                println!("{} Item {} marked paid", style("✓").green(), style(id).cyan());
            }
        }

        ItemCommands::Delete { id, yes } => {
            let item = store.get_item(id)?;
            let prompt = format!(
                "Delete item {} ({} for {})?",
                id, item.item_type, item.person_name
            );
            if !confirm(&prompt, yes)? {
                println!("Aborted.");
                return Ok(());
            }
            store.delete_item(id)?;
            if !global.quiet {
                println!("{} Deleted item {}", style("✓").green(), style(id).cyan());
            }
        }
    }

    Ok(())
}

fn print_items(format: OutputFormat, items: &[Item]) -> Result<()> {
    let rows: Vec<Vec<String>> = items.iter().map(item_row).collect();
    print_records(format, ITEM_HEADERS, &rows, items)
}

fn item_row(item: &Item) -> Vec<String> {
    let (amount, paid) = if item.status() == ItemStatus::HandedOver {
        (
            format_amount(item.repair_amount()),
            if item.is_paid() { "yes" } else { "no" }.to_string(),
        )
    } else {
        (String::new(), String::new())
    };

    vec![
        item.id.to_string(),
        item.serial_number.clone().unwrap_or_default(),
        truncate_str(&item.item_type, 20),
        truncate_str(&item.person_name, 20),
        truncate_str(&item.pcb_model, 20),
        item.created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d")
            .to_string(),
        item.due_date.to_string(),
        item.status().to_string(),
        amount,
        paid,
    ]
}

fn print_item_detail(item: &Item) {
    println!("{}", style("─".repeat(50)).dim());
    println!("{}: {}", style("ID").bold(), style(item.id).cyan());
    println!(
        "{}: {}",
        style("Serial").bold(),
        item.serial_number.as_deref().unwrap_or("-")
    );
    println!("{}: {}", style("Type").bold(), item.item_type);
    println!(
        "{}: {} (priority {})",
        style("Person").bold(),
        item.person_name,
        item.person_priority
    );
    println!("{}: {}", style("PCB").bold(), item.pcb_model);
    println!(
        "{}: {}",
        style("Created").bold(),
        item.created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    println!(
        "{}: {} ({} days)",
        style("Due").bold(),
        item.due_date,
        item.estimated_days
    );
    println!("{}: {}", style("Status").bold(), styled_status(item.status()));
    if item.status() == ItemStatus::HandedOver {
        println!(
            "{}: {} ({})",
            style("Amount").bold(),
            format_amount(item.repair_amount()),
            if item.is_paid() { "paid" } else { "unpaid" }
        );
    }
    if let Some(updated) = item.updated_at {
        println!(
            "{}: {}",
            style("Updated").bold(),
            updated.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }
    println!("{}", style("─".repeat(50)).dim());
}
