//! Core module - domain types and the inventory store

pub mod config;
pub mod error;
pub mod serial;
pub mod status;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use serial::{SerialNumber, SerialParseError};
pub use status::{DueStatus, ItemState, ItemStatus, TerminalState};
pub use store::InventoryStore;
