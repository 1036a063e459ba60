//! Error taxonomy for the inventory store

use miette::Diagnostic;
use rusqlite::ffi;
use thiserror::Error;

use crate::core::status::ItemStatus;

/// Errors surfaced by every store operation
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("inventory store used before initialize() completed")]
    #[diagnostic(
        code(repairdesk::store::not_initialized),
        help("call InventoryStore::initialize() once at startup")
    )]
    NotInitialized,

    #[error("{kind} '{name}' already exists")]
    #[diagnostic(code(repairdesk::store::uniqueness))]
    UniquenessViolation { kind: &'static str, name: String },

    #[error("referential integrity: {0}")]
    #[diagnostic(code(repairdesk::store::referential_integrity))]
    ReferentialIntegrity(String),

    #[error("{kind} {id} not found")]
    #[diagnostic(code(repairdesk::store::not_found))]
    NotFound { kind: &'static str, id: i64 },

    #[error("invalid status transition: {from} -> {to}")]
    #[diagnostic(code(repairdesk::store::invalid_transition))]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("invalid input: {0}")]
    #[diagnostic(code(repairdesk::store::validation))]
    Validation(String),

    #[error("serial numbers exhausted (ZZ999 already issued)")]
    #[diagnostic(code(repairdesk::store::serial_exhausted))]
    SerialExhausted,

    #[error("database schema version {found} is newer than this build supports ({supported})")]
    #[diagnostic(code(repairdesk::store::unsupported_schema))]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("migration to schema version {version} failed")]
    #[diagnostic(
        code(repairdesk::store::migration),
        help("the database was left at its previous version; no partial changes were kept")
    )]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error("storage I/O error: {0}")]
    #[diagnostic(code(repairdesk::store::io))]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    #[diagnostic(code(repairdesk::store::storage))]
    Storage(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Check whether a SQLite error is a constraint failure with the given extended code
pub(crate) fn is_constraint(err: &rusqlite::Error, extended_code: std::os::raw::c_int) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.extended_code == extended_code)
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    is_constraint(err, ffi::SQLITE_CONSTRAINT_UNIQUE)
        || is_constraint(err, ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    is_constraint(err, ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_violation_is_detected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));
    }

    #[test]
    fn test_foreign_key_violation_is_detected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE p (id INTEGER PRIMARY KEY);
             CREATE TABLE c (pid INTEGER NOT NULL REFERENCES p(id));",
        )
        .unwrap();
        let err = conn.execute("INSERT INTO c VALUES (42)", []).unwrap_err();
        assert!(is_foreign_key_violation(&err));
    }

    #[test]
    fn test_error_messages() {
        let err = StoreError::UniquenessViolation {
            kind: "person",
            name: "Asha".to_string(),
        };
        assert_eq!(err.to_string(), "person 'Asha' already exists");

        let err = StoreError::InvalidTransition {
            from: ItemStatus::HandedOver,
            to: ItemStatus::NonRepairable,
        };
        assert_eq!(
            err.to_string(),
            "invalid status transition: handedOver -> nonRepairable"
        );
    }
}
