//! Database schema lifecycle
//!
//! The schema evolves through an ordered list of migration steps. Every step
//! is idempotent: it inspects the database before changing it, so a database
//! written by any earlier release (with or without a recorded version)
//! converges on the current shape. Applied versions are recorded in
//! `schema_version`, and a database at `SCHEMA_VERSION` is left untouched.

use chrono::Utc;
use rusqlite::{ffi, params, Connection, OptionalExtension, Transaction};
use tracing::info;

use super::format_timestamp;
use super::types::EntityKind;
use crate::core::error::{StoreError, StoreResult};

/// Current schema version
pub const SCHEMA_VERSION: u32 = 5;

/// One versioned schema change
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    apply: fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

/// All migrations, in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "reference tables for persons, item types and pcb models",
        apply: create_reference_tables,
    },
    Migration {
        version: 2,
        description: "normalized items table (converts flat-string items)",
        apply: normalize_items,
    },
    Migration {
        version: 3,
        description: "repair amount, payment flag and update timestamp",
        apply: add_payment_columns,
    },
    Migration {
        version: 4,
        description: "persisted item status",
        apply: add_status_column,
    },
    Migration {
        version: 5,
        description: "unique serial numbers",
        apply: add_serial_numbers,
    },
];

/// Current shape of the items table
const ITEMS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        itemTypeId INTEGER NOT NULL REFERENCES itemTypes(id),
        personId INTEGER NOT NULL REFERENCES persons(id),
        pcbModelId INTEGER NOT NULL REFERENCES pcbModels(id),
        estimatedTime INTEGER NOT NULL,
        createdAt TEXT NOT NULL,
        updatedAt TEXT,
        status TEXT NOT NULL DEFAULT 'upcoming',
        repairAmount REAL NOT NULL DEFAULT 0,
        isPaid INTEGER NOT NULL DEFAULT 0,
        serialNumber TEXT
    );
"#;

/// Bring the database to `SCHEMA_VERSION`, returning the number of steps applied
///
/// All pending steps run in one transaction; on any failure nothing is kept.
pub(super) fn migrate(conn: &mut Connection) -> StoreResult<usize> {
    let tx = conn.transaction()?;

    tx.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);")?;

    let current = recorded_version(&tx)?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        (migration.apply)(&tx).map_err(|source| StoreError::Migration {
            version: migration.version,
            source,
        })?;
        tx.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![migration.version],
        )?;
        info!(
            version = migration.version,
            description = migration.description,
            "applied schema migration"
        );
        applied += 1;
    }

    tx.commit()?;
    Ok(applied)
}

/// Highest applied version, 0 when nothing has been recorded
pub(super) fn recorded_version(conn: &Connection) -> StoreResult<u32> {
    if !table_exists(conn, "schema_version")? {
        return Ok(0);
    }
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count > 0)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count > 0)
}

/// Add a column unless it is already present
///
/// Identifiers are interpolated, so callers only pass compile-time constants.
fn add_column_if_missing(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
    definition: &'static str,
) -> rusqlite::Result<bool> {
    if column_exists(conn, table, column)? {
        return Ok(false);
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        table, column, definition
    ))?;
    Ok(true)
}

fn create_reference_tables(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            phoneNumber TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS itemTypes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS pcbModels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )?;

    // Early person tables had neither contact details nor priorities
    add_column_if_missing(tx, "persons", "phoneNumber", "TEXT NOT NULL DEFAULT ''")?;
    add_column_if_missing(tx, "persons", "priority", "INTEGER NOT NULL DEFAULT 1")?;
    Ok(())
}

fn normalize_items(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let now = format_timestamp(Utc::now());

    if !table_exists(tx, "items")? {
        tx.execute_batch(ITEMS_TABLE)?;
    } else if column_exists(tx, "items", "personName")? {
        convert_flat_items(tx, &now)?;
    } else {
        if add_column_if_missing(tx, "items", "createdAt", "TEXT")? {
            tx.execute(
                "UPDATE items SET createdAt = ?1 WHERE createdAt IS NULL",
                params![now],
            )?;
        }
        if !has_item_foreign_keys(tx)? {
            rebuild_unconstrained_items(tx, &now)?;
        }
    }

    tx.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_items_person ON items(personId);
        CREATE INDEX IF NOT EXISTS idx_items_item_type ON items(itemTypeId);
        CREATE INDEX IF NOT EXISTS idx_items_pcb_model ON items(pcbModelId);
        "#,
    )?;
    Ok(())
}

/// Replace the first-release flat items table (names stored as text) with the
/// normalized one, creating or reusing reference rows for every name
fn convert_flat_items(tx: &Transaction<'_>, now: &str) -> rusqlite::Result<()> {
    let legacy_count: i64 = tx.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;

    tx.execute_batch("ALTER TABLE items RENAME TO items_legacy;")?;
    tx.execute_batch(ITEMS_TABLE)?;

    tx.execute_batch(
        r#"
        INSERT OR IGNORE INTO persons (name, phoneNumber, priority)
            SELECT DISTINCT COALESCE(NULLIF(TRIM(personName), ''), 'Unknown'), '', 1
            FROM items_legacy;

        INSERT OR IGNORE INTO itemTypes (name)
            SELECT DISTINCT COALESCE(NULLIF(TRIM(itemType), ''), 'Unknown')
            FROM items_legacy;

        INSERT OR IGNORE INTO pcbModels (name)
            SELECT DISTINCT COALESCE(NULLIF(TRIM(pcbModel), ''), 'Unknown')
            FROM items_legacy;
        "#,
    )?;

    // CAST keeps the leading integer of free text like "2 days"
    let copied = tx.execute(
        r#"
        INSERT INTO items (id, itemTypeId, personId, pcbModelId, estimatedTime, createdAt, status)
        SELECT l.id, t.id, p.id, m.id,
               MAX(COALESCE(CAST(l.estimatedTime AS INTEGER), 0), 0),
               ?1, 'upcoming'
        FROM items_legacy l
        JOIN itemTypes t ON t.name = COALESCE(NULLIF(TRIM(l.itemType), ''), 'Unknown')
        JOIN persons p ON p.name = COALESCE(NULLIF(TRIM(l.personName), ''), 'Unknown')
        JOIN pcbModels m ON m.name = COALESCE(NULLIF(TRIM(l.pcbModel), ''), 'Unknown')
        "#,
        params![now],
    )?;

    if copied as i64 != legacy_count {
        // Aborts the surrounding transaction
        return Err(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_ABORT),
            Some(format!(
                "converted {} of {} legacy items",
                copied, legacy_count
            )),
        ));
    }

    tx.execute_batch("DROP TABLE items_legacy;")?;
    info!(items = copied, "converted flat-string items to normalized schema");
    Ok(())
}

/// Whether `items` declares a foreign key for every reference column
fn has_item_foreign_keys(conn: &Connection) -> rusqlite::Result<bool> {
    for kind in EntityKind::all() {
        let declared: i64 = conn.query_row(
            r#"SELECT COUNT(*) FROM pragma_foreign_key_list('items')
               WHERE "from" = ?1 AND "table" = ?2"#,
            params![kind.item_column(), kind.table()],
            |row| row.get(0),
        )?;
        if declared == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Optional columns carried over when rebuilding `items`, with the
/// expression that reads them from the old table
const CARRIED_COLUMNS: &[(&str, &str)] = &[
    ("updatedAt", "l.updatedAt"),
    ("status", "COALESCE(l.status, 'upcoming')"),
    ("repairAmount", "COALESCE(l.repairAmount, 0)"),
    ("isPaid", "COALESCE(l.isPaid, 0)"),
    ("serialNumber", "l.serialNumber"),
];

/// Recreate an id-based items table that was created without foreign keys
///
/// Rows keep their ids and columns. References to rows that no longer exist
/// are moved to an `Unknown` entry of the same kind.
fn rebuild_unconstrained_items(tx: &Transaction<'_>, now: &str) -> rusqlite::Result<()> {
    let old_count: i64 = tx.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;

    tx.execute_batch("ALTER TABLE items RENAME TO items_unconstrained;")?;
    tx.execute_batch(ITEMS_TABLE)?;

    let mut columns = vec!["id", "estimatedTime", "createdAt"];
    let mut values = vec![
        "l.id".to_string(),
        "MAX(COALESCE(CAST(l.estimatedTime AS INTEGER), 0), 0)".to_string(),
        "COALESCE(l.createdAt, ?1)".to_string(),
    ];

    for kind in EntityKind::all() {
        let (table, column) = (kind.table(), kind.item_column());

        let dangling: bool = tx.query_row(
            &format!(
                "SELECT EXISTS (SELECT 1 FROM items_unconstrained l
                                LEFT JOIN {table} e ON e.id = l.{column}
                                WHERE e.id IS NULL)"
            ),
            [],
            |row| row.get(0),
        )?;
        if dangling {
            let insert = match kind {
                EntityKind::Person => {
                    "INSERT OR IGNORE INTO persons (name, phoneNumber, priority) VALUES ('Unknown', '', 1)"
                        .to_string()
                }
                _ => format!("INSERT OR IGNORE INTO {table} (name) VALUES ('Unknown')"),
            };
            tx.execute_batch(&insert)?;
        }

        columns.push(column);
        values.push(format!(
            "COALESCE((SELECT e.id FROM {table} e WHERE e.id = l.{column}),
                      (SELECT e.id FROM {table} e WHERE e.name = 'Unknown'))"
        ));
    }

    for (column, expr) in CARRIED_COLUMNS {
        if column_exists(tx, "items_unconstrained", column)? {
            columns.push(*column);
            values.push(expr.to_string());
        }
    }

    let copied = tx.execute(
        &format!(
            "INSERT INTO items ({}) SELECT {} FROM items_unconstrained l",
            columns.join(", "),
            values.join(", ")
        ),
        params![now],
    )?;

    if copied as i64 != old_count {
        return Err(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_ABORT),
            Some(format!("rebuilt {} of {} items", copied, old_count)),
        ));
    }

    tx.execute_batch("DROP TABLE items_unconstrained;")?;
    info!(items = copied, "added foreign keys to items table");
    Ok(())
}

fn add_payment_columns(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    add_column_if_missing(tx, "items", "repairAmount", "REAL NOT NULL DEFAULT 0")?;
    add_column_if_missing(tx, "items", "isPaid", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(tx, "items", "updatedAt", "TEXT")?;
    Ok(())
}

fn add_status_column(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    add_column_if_missing(tx, "items", "status", "TEXT NOT NULL DEFAULT 'upcoming'")?;
    Ok(())
}

fn add_serial_numbers(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    add_column_if_missing(tx, "items", "serialNumber", "TEXT")?;
    tx.execute_batch(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_items_serial ON items(serialNumber);

        -- Last serial handed out; survives deletion of the newest item
        CREATE TABLE IF NOT EXISTS serial_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_serial TEXT NOT NULL
        );

        INSERT OR IGNORE INTO serial_state (id, last_serial)
            SELECT 1, MAX(serialNumber) FROM items
            WHERE serialNumber GLOB '[A-Z][A-Z][0-9][0-9][0-9]'
            HAVING MAX(serialNumber) IS NOT NULL;
        "#,
    )?;
    Ok(())
}
