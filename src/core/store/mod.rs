//! SQLite-backed inventory store
//!
//! The store owns the single connection to the inventory database and is the
//! only component that talks SQL. It provides:
//! - Schema lifecycle: versioned, idempotent migrations on `initialize()`
//! - Item CRUD with serial numbers and computed due status
//! - Person / item type / PCB model management with reassign-on-delete
//! - Read-only finance aggregation
//!
//! Every data operation fails with `StoreError::NotInitialized` until
//! `initialize()` has succeeded.

mod entities;
mod finance;
mod items;
mod schema;
mod types;

pub use finance::TransactionFilter;
pub use items::sort_for_board;
pub use schema::{Migration, MIGRATIONS, SCHEMA_VERSION};
pub use types::*;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::error::{StoreError, StoreResult};

/// Default database file name
pub const DATABASE_FILE: &str = "inventory.db";

/// The inventory store backed by SQLite
pub struct InventoryStore {
    /// `None` for an in-memory database
    path: Option<PathBuf>,
    conn: Option<Connection>,
}

impl InventoryStore {
    /// Create a store for the database file at `path`
    ///
    /// Nothing is opened until `initialize()` is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            conn: None,
        }
    }

    /// Create a store backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: None,
            conn: None,
        }
    }

    /// Create and initialize a store in one step
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    /// Open the database and bring its schema to `SCHEMA_VERSION`
    ///
    /// Safe to call repeatedly: once the schema is current this performs no
    /// changes. If a migration fails the transaction is rolled back, the
    /// connection is dropped and the store stays uninitialized.
    pub fn initialize(&mut self) -> StoreResult<()> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open_connection()?,
        };

        let applied = schema::migrate(&mut conn)?;
        debug!(applied, version = SCHEMA_VERSION, "inventory store initialized");

        self.conn = Some(conn);
        Ok(())
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        let conn = match &self.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode=WAL;")?;
                conn
            }
            None => Connection::open_in_memory()?,
        };

        // Must be set outside any transaction
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Whether `initialize()` has completed
    pub fn is_initialized(&self) -> bool {
        self.conn.is_some()
    }

    /// Location of the database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version recorded in the database
    pub fn schema_version(&self) -> StoreResult<u32> {
        schema::recorded_version(self.conn()?)
    }

    pub(crate) fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::NotInitialized)
    }

    pub(crate) fn conn_mut(&mut self) -> StoreResult<&mut Connection> {
        self.conn.as_mut().ok_or(StoreError::NotInitialized)
    }
}

/// Format a timestamp for storage (fixed width, so text order is time order)
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 as well as SQLite's `CURRENT_TIMESTAMP` format, which
/// older databases used as a column default. Anything else is logged and
/// read as the Unix epoch so one damaged row does not hide the rest.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!(value = s, error = %e, "unparseable stored timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
}

/// Convert a stored REAL amount to a two-place decimal
pub(crate) fn amount_from_sql(value: Option<f64>) -> Decimal {
    value
        .and_then(Decimal::from_f64)
        .unwrap_or_default()
        .round_dp(2)
}

/// Convert a decimal amount for storage
pub(crate) fn amount_to_sql(amount: Decimal) -> StoreResult<f64> {
    amount
        .round_dp(2)
        .to_f64()
        .ok_or_else(|| StoreError::Validation(format!("amount {} cannot be stored", amount)))
}
