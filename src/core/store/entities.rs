//! Reference entities: persons, item types and PCB models

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::types::{EntityId, EntityKind, NamedEntity, Person, Reassignment};
use super::InventoryStore;
use crate::core::error::{is_unique_violation, StoreError, StoreResult};

impl InventoryStore {
    /// Add a person; the phone number must be 10 digits and priority 1-5
    pub fn add_person(&mut self, name: &str, phone_number: &str, priority: u8) -> StoreResult<EntityId> {
        let name = validate_name(EntityKind::Person, name)?;
        let phone_number = phone_number.trim();
        if phone_number.len() != 10 || !phone_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StoreError::Validation(format!(
                "phone number must be exactly 10 digits, got '{}'",
                phone_number
            )));
        }
        if !(1..=5).contains(&priority) {
            return Err(StoreError::Validation(format!(
                "priority must be between 1 and 5, got {}",
                priority
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO persons (name, phoneNumber, priority) VALUES (?1, ?2, ?3)",
            params![name, phone_number, priority],
        )
        .map_err(|e| unique_error(e, EntityKind::Person, &name))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_item_type(&mut self, name: &str) -> StoreResult<EntityId> {
        self.add_named(EntityKind::ItemType, name)
    }

    pub fn add_pcb_model(&mut self, name: &str) -> StoreResult<EntityId> {
        self.add_named(EntityKind::PcbModel, name)
    }

    fn add_named(&mut self, kind: EntityKind, name: &str) -> StoreResult<EntityId> {
        let name = validate_name(kind, name)?;
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO {} (name) VALUES (?1)", kind.table()),
            params![name],
        )
        .map_err(|e| unique_error(e, kind, &name))?;
        Ok(conn.last_insert_rowid())
    }

    /// All persons ordered by name, with the number of items assigned to each
    pub fn list_persons(&self) -> StoreResult<Vec<Person>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT p.id, p.name, p.phoneNumber, p.priority, COUNT(i.id)
               FROM persons p
               LEFT JOIN items i ON i.personId = p.id
               GROUP BY p.id
               ORDER BY p.name, p.id"#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Person {
                id: row.get(0)?,
                name: row.get(1)?,
                phone_number: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                priority: row.get::<_, Option<i64>>(3)?.unwrap_or(1).clamp(1, 5) as u8,
                item_count: row.get::<_, i64>(4)? as usize,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn list_item_types(&self) -> StoreResult<Vec<NamedEntity>> {
        self.list_named(EntityKind::ItemType)
    }

    pub fn list_pcb_models(&self) -> StoreResult<Vec<NamedEntity>> {
        self.list_named(EntityKind::PcbModel)
    }

    fn list_named(&self, kind: EntityKind) -> StoreResult<Vec<NamedEntity>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"SELECT e.id, e.name, COUNT(i.id)
               FROM {table} e
               LEFT JOIN items i ON i.{column} = e.id
               GROUP BY e.id
               ORDER BY e.name, e.id"#,
            table = kind.table(),
            column = kind.item_column()
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map([], |row| {
            Ok(NamedEntity {
                id: row.get(0)?,
                name: row.get(1)?,
                item_count: row.get::<_, i64>(2)? as usize,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn remove_person(&mut self, id: EntityId) -> StoreResult<Reassignment> {
        self.remove_entity(EntityKind::Person, id)
    }

    pub fn remove_item_type(&mut self, id: EntityId) -> StoreResult<Reassignment> {
        self.remove_entity(EntityKind::ItemType, id)
    }

    pub fn remove_pcb_model(&mut self, id: EntityId) -> StoreResult<Reassignment> {
        self.remove_entity(EntityKind::PcbModel, id)
    }

    /// Delete a reference row after moving its items to the first surviving row
    ///
    /// Fails without changes if the row is the last of its kind.
    pub fn remove_entity(&mut self, kind: EntityKind, id: EntityId) -> StoreResult<Reassignment> {
        let table = kind.table();
        let column = kind.item_column();

        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", table),
                params![id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound {
                kind: kind.label(),
                id,
            });
        }

        let target: EntityId = tx
            .query_row(
                &format!("SELECT id FROM {} WHERE id != ?1 ORDER BY id LIMIT 1", table),
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                StoreError::ReferentialIntegrity(format!(
                    "cannot remove the last {}: items need one to reference",
                    kind.label()
                ))
            })?;

        let items_moved = tx.execute(
            &format!("UPDATE items SET {col} = ?1 WHERE {col} = ?2", col = column),
            params![target, id],
        )?;
        tx.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;
        tx.commit()?;

        info!(
            kind = kind.label(),
            removed = id,
            target,
            items_moved,
            "removed reference entity"
        );

        Ok(Reassignment {
            kind,
            removed_id: id,
            target_id: target,
            items_moved,
        })
    }
}

fn validate_name(kind: EntityKind, name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation(format!(
            "{} name cannot be empty",
            kind.label()
        )));
    }
    Ok(name.to_string())
}

fn unique_error(err: rusqlite::Error, kind: EntityKind, name: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::UniquenessViolation {
            kind: kind.label(),
            name: name.to_string(),
        }
    } else {
        StoreError::Storage(err)
    }
}
