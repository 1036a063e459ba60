//! repairdesk: repair shop inventory tracking
//!
//! Items brought in for repair are tracked against the person who brought
//! them, their item type and PCB model, in a local SQLite database. The
//! [`core::store::InventoryStore`] owns the database; the `cli` module is a
//! thin front end over it.

pub mod cli;
pub mod core;
