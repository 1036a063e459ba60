//! `repairdesk person|type|pcb` commands - Reference entity management
//!
//! Removing an entity moves its items to the first remaining entity of the
//! same kind; the last one can never be removed.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, open_store, output_format, print_json, print_records};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::store::{EntityKind, InventoryStore, Reassignment};

#[derive(Subcommand, Debug)]
pub enum PersonCommands {
    /// Add a person
    Add {
        /// Name (must be unique)
        name: String,

        /// Phone number (10 digits)
        #[arg(long)]
        phone: String,

        /// Priority from 1 (lowest) to 5 (highest)
        #[arg(long, default_value_t = 1)]
        priority: u8,
    },

    /// List persons with their item counts
    List,

    /// Remove a person, reassigning their items
    Remove {
        /// Person ID
        id: i64,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NamedCommands {
    /// Add an entry
    Add {
        /// Name (must be unique)
        name: String,
    },

    /// List entries with their item counts
    List,

    /// Remove an entry, reassigning its items
    Remove {
        /// Entry ID
        id: i64,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn run_person(cmd: PersonCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = output_format(global, &config);
    let mut store = open_store(global, &config)?;

    match cmd {
        PersonCommands::Add {
            name,
            phone,
            priority,
        } => {
            let id = store.add_person(&name, &phone, priority)?;
            report_added(global, EntityKind::Person, id, &name);
        }

        PersonCommands::List => {
            let persons = store.list_persons()?;
            let rows: Vec<Vec<String>> = persons
                .iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        p.name.clone(),
                        p.phone_number.clone(),
                        p.priority.to_string(),
                        p.item_count.to_string(),
                    ]
                })
                .collect();
            print_records(
                format,
                &["ID", "Name", "Phone", "Priority", "Items"],
                &rows,
                &persons,
            )?;
        }

        PersonCommands::Remove { id, yes } => {
            remove(&mut store, global, format, EntityKind::Person, id, yes)?;
        }
    }

    Ok(())
}

pub fn run_named(kind: EntityKind, cmd: NamedCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = output_format(global, &config);
    let mut store = open_store(global, &config)?;

    match cmd {
        NamedCommands::Add { name } => {
            let id = match kind {
                EntityKind::PcbModel => store.add_pcb_model(&name)?,
                _ => store.add_item_type(&name)?,
            };
            report_added(global, kind, id, &name);
        }

        NamedCommands::List => {
            let entries = match kind {
                EntityKind::PcbModel => store.list_pcb_models()?,
                _ => store.list_item_types()?,
            };
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| vec![e.id.to_string(), e.name.clone(), e.item_count.to_string()])
                .collect();
            print_records(format, &["ID", "Name", "Items"], &rows, &entries)?;
        }

        NamedCommands::Remove { id, yes } => {
            remove(&mut store, global, format, kind, id, yes)?;
        }
    }

    Ok(())
}

fn report_added(global: &GlobalOpts, kind: EntityKind, id: i64, name: &str) {
    if global.quiet {
        println!("{}", id);
    } else {
        println!(
            "{} Added {} {} ({})",
            style("✓").green(),
            kind,
            style(name.trim()).cyan(),
            id
        );
    }
}

fn remove(
    store: &mut InventoryStore,
    global: &GlobalOpts,
    format: OutputFormat,
    kind: EntityKind,
    id: i64,
    yes: bool,
) -> Result<()> {
    let prompt = format!("Remove {} {}? Its items move to another {}", kind, id, kind);
    if !confirm(&prompt, yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let result: Reassignment = store.remove_entity(kind, id)?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        _ if global.quiet => {}
        _ => println!(
            "{} Removed {} {}; {} item(s) moved to {}",
            style("✓").green(),
            kind,
            id,
            result.items_moved,
            result.target_id
        ),
    }
    Ok(())
}
