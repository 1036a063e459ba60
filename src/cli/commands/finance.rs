//! `repairdesk finance` command - Revenue and pending payments

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{format_amount, open_store, output_format, print_json, print_records};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::store::{Transaction, TransactionFilter};

#[derive(Subcommand, Debug)]
pub enum FinanceCommands {
    /// Totals plus the list of handed-over items
    Summary {
        /// Only transactions for this person name
        #[arg(long)]
        person: Option<String>,

        /// Only transactions for this item type name
        #[arg(long = "type")]
        item_type: Option<String>,

        /// Only transactions for this pcb model name
        #[arg(long)]
        pcb: Option<String>,

        /// Only paid transactions
        #[arg(long, conflicts_with = "unpaid")]
        paid: bool,

        /// Only unpaid transactions
        #[arg(long)]
        unpaid: bool,
    },

    /// Names usable as summary filters
    Filters,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilteredSummary<'a> {
    #[serde(flatten)]
    totals: Totals,
    filter: &'a TransactionFilter,
    filtered_total: rust_decimal::Decimal,
    transactions: &'a [Transaction],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Totals {
    total_revenue: rust_decimal::Decimal,
    pending_payments: rust_decimal::Decimal,
    monthly_revenue: rust_decimal::Decimal,
}

pub fn run(cmd: FinanceCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = output_format(global, &config);
    let store = open_store(global, &config)?;

    match cmd {
        FinanceCommands::Summary {
            person,
            item_type,
            pcb,
            paid,
            unpaid,
        } => {
            let filter = TransactionFilter {
                person_name: person,
                item_type,
                pcb_model: pcb,
                is_paid: match (paid, unpaid) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };

            let summary = store.finance_summary()?;
            let filtered_total = filter.total(&summary.transactions);
            let transactions = filter.apply(summary.transactions);

            match format {
                OutputFormat::Json => print_json(&FilteredSummary {
                    totals: Totals {
                        total_revenue: summary.total_revenue,
                        pending_payments: summary.pending_payments,
                        monthly_revenue: summary.monthly_revenue,
                    },
                    filter: &filter,
                    filtered_total,
                    transactions: &transactions,
                })?,
                _ => {
                    let rows: Vec<Vec<String>> = transactions.iter().map(transaction_row).collect();
                    if format == OutputFormat::Table && !global.quiet {
                        println!(
                            "{}  {}",
                            style("Total revenue:").bold(),
                            style(format_amount(summary.total_revenue)).green()
                        );
                        println!(
                            "{}  {}",
                            style("This month:   ").bold(),
                            format_amount(summary.monthly_revenue)
                        );
                        println!(
                            "{}  {}",
                            style("Pending:      ").bold(),
                            style(format_amount(summary.pending_payments)).yellow()
                        );
                        println!();
                    }
                    print_records(
                        format,
                        &["Item", "Serial", "Person", "Type", "PCB", "Amount", "Paid", "Updated"],
                        &rows,
                        &transactions,
                    )?;
                    if format == OutputFormat::Table && !global.quiet {
                        println!(
                            "{} transaction(s), {} total",
                            transactions.len(),
                            format_amount(filtered_total)
                        );
                    }
                }
            }
        }

        FinanceCommands::Filters => {
            let options = store.filter_options()?;
            match format {
                OutputFormat::Json => print_json(&options)?,
                _ => {
                    let mut rows = Vec::new();
                    for (kind, names) in [
                        ("person", &options.person_names),
                        ("type", &options.item_types),
                        ("pcb", &options.pcb_models),
                    ] {
                        rows.extend(names.iter().map(|n| vec![kind.to_string(), n.clone()]));
                    }
                    print_records(format, &["Filter", "Value"], &rows, &options)?;
                }
            }
        }
    }

    Ok(())
}

fn transaction_row(tx: &Transaction) -> Vec<String> {
    vec![
        tx.item_id.to_string(),
        tx.serial_number.clone().unwrap_or_default(),
        tx.person_name.clone(),
        tx.item_type.clone(),
        tx.pcb_model.clone(),
        format_amount(tx.repair_amount),
        if tx.is_paid { "yes" } else { "no" }.to_string(),
        tx.updated_at
            .map(|ts| ts.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    ]
}
