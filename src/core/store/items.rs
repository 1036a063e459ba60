//! Item operations: creation, listing, due board and status transitions

use chrono::{Local, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::debug;

use super::types::{EntityId, Item, ItemId};
use super::{amount_from_sql, amount_to_sql, format_timestamp, parse_timestamp, InventoryStore};
use crate::core::error::{is_foreign_key_violation, StoreError, StoreResult};
use crate::core::serial::SerialNumber;
use crate::core::status::{due_date, ItemState, ItemStatus};

/// Columns read by every item query, in the order `item_from_row` expects
const ITEM_SELECT: &str = r#"
    SELECT i.id, i.serialNumber,
           i.itemTypeId, t.name,
           i.personId, p.name, p.priority,
           i.pcbModelId, m.name,
           CAST(i.estimatedTime AS INTEGER), i.createdAt, i.updatedAt,
           i.status, i.repairAmount, i.isPaid
    FROM items i
    JOIN itemTypes t ON t.id = i.itemTypeId
    JOIN persons p ON p.id = i.personId
    JOIN pcbModels m ON m.id = i.pcbModelId
"#;

const TERMINAL_FILTER: &str = "i.status NOT IN ('nonRepairable', 'handedOver')";

impl InventoryStore {
    /// Register a new repair item and return its id
    ///
    /// The next serial number is computed and stored in the same transaction
    /// as the insert.
    pub fn add_item(
        &mut self,
        item_type_id: EntityId,
        person_id: EntityId,
        pcb_model_id: EntityId,
        estimated_days: i64,
    ) -> StoreResult<ItemId> {
        if estimated_days < 0 {
            return Err(StoreError::Validation(format!(
                "estimated time must be zero or more days, got {}",
                estimated_days
            )));
        }

        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        let last: Option<String> = tx
            .query_row(
                r#"SELECT MAX(serial) FROM (
                       SELECT last_serial AS serial FROM serial_state
                       UNION ALL
                       SELECT serialNumber FROM items
                       WHERE serialNumber GLOB '[A-Z][A-Z][0-9][0-9][0-9]'
                   )"#,
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let serial = match last {
            None => SerialNumber::FIRST,
            Some(last) => SerialNumber::parse(&last)
                .map_err(|e| StoreError::Validation(format!("stored serial: {}", e)))?
                .next()
                .ok_or(StoreError::SerialExhausted)?,
        };
        let serial_str = serial.to_string();

        tx.execute(
            r#"INSERT INTO items
                   (itemTypeId, personId, pcbModelId, estimatedTime, createdAt, status, serialNumber)
               VALUES (?1, ?2, ?3, ?4, ?5, 'upcoming', ?6)"#,
            params![
                item_type_id,
                person_id,
                pcb_model_id,
                estimated_days,
                format_timestamp(Utc::now()),
                serial_str
            ],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::ReferentialIntegrity(format!(
                    "item type {}, person {} or pcb model {} does not exist",
                    item_type_id, person_id, pcb_model_id
                ))
            } else {
                StoreError::Storage(e)
            }
        })?;
        let id = tx.last_insert_rowid();

        tx.execute(
            r#"INSERT INTO serial_state (id, last_serial) VALUES (1, ?1)
               ON CONFLICT(id) DO UPDATE SET last_serial = excluded.last_serial"#,
            params![serial_str],
        )?;

        tx.commit()?;
        debug!(id, serial = %serial, "added item");
        Ok(id)
    }

    /// Fetch one item with its computed state
    pub fn get_item(&self, item_id: ItemId) -> StoreResult<Item> {
        let today = Local::now().date_naive();
        let sql = format!("{} WHERE i.id = ?1", ITEM_SELECT);
        self.conn()?
            .query_row(&sql, params![item_id], |row| item_from_row(row, today))
            .optional()?
            .ok_or(StoreError::NotFound {
                kind: "item",
                id: item_id,
            })
    }

    /// All items, newest first
    pub fn list_items(&self) -> StoreResult<Vec<Item>> {
        let sql = format!("{} ORDER BY i.createdAt DESC, i.id DESC", ITEM_SELECT);
        self.query_items(&sql, Local::now().date_naive())
    }

    /// Non-terminal items for the due board, as of today
    pub fn list_due_items(&self) -> StoreResult<Vec<Item>> {
        self.list_due_items_on(Local::now().date_naive())
    }

    /// Non-terminal items with status computed against `today`
    ///
    /// Ordered by person priority (highest first), then oldest first.
    pub fn list_due_items_on(&self, today: NaiveDate) -> StoreResult<Vec<Item>> {
        let sql = format!(
            "{} WHERE {} ORDER BY p.priority DESC, i.createdAt ASC, i.id ASC",
            ITEM_SELECT, TERMINAL_FILTER
        );
        self.query_items(&sql, today)
    }

    fn query_items(&self, sql: &str, today: NaiveDate) -> StoreResult<Vec<Item>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| item_from_row(row, today))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Set an item's status and stamp `updatedAt`
    ///
    /// Accepts `NonRepairable` or an active status; active statuses are
    /// computed on read, so they are all stored as `upcoming`. Handing over
    /// must go through `mark_handed_over`.
    pub fn mark_status(&mut self, item_id: ItemId, status: ItemStatus) -> StoreResult<()> {
        let current = self.get_item(item_id)?;
        if current.is_terminal() || status == ItemStatus::HandedOver {
            return Err(StoreError::InvalidTransition {
                from: current.status(),
                to: status,
            });
        }

        let stored = match status {
            ItemStatus::NonRepairable => ItemStatus::NonRepairable,
            _ => ItemStatus::Upcoming,
        };

        self.conn()?.execute(
            "UPDATE items SET status = ?1, updatedAt = ?2 WHERE id = ?3",
            params![stored.as_str(), format_timestamp(Utc::now()), item_id],
        )?;
        debug!(id = item_id, status = %stored, "updated item status");
        Ok(())
    }

    /// Hand an item back to its owner, recording the charge
    ///
    /// Amount, paid flag, status and `updatedAt` change in one statement.
    pub fn mark_handed_over(
        &mut self,
        item_id: ItemId,
        repair_amount: Decimal,
        is_paid: bool,
    ) -> StoreResult<()> {
        if repair_amount < Decimal::ZERO {
            return Err(StoreError::Validation(format!(
                "repair amount cannot be negative, got {}",
                repair_amount
            )));
        }

        let current = self.get_item(item_id)?;
        if current.is_terminal() {
            return Err(StoreError::InvalidTransition {
                from: current.status(),
                to: ItemStatus::HandedOver,
            });
        }

        self.conn()?.execute(
            r#"UPDATE items
               SET repairAmount = ?1, isPaid = ?2, status = 'handedOver', updatedAt = ?3
               WHERE id = ?4"#,
            params![
                amount_to_sql(repair_amount)?,
                is_paid,
                format_timestamp(Utc::now()),
                item_id
            ],
        )?;
        debug!(id = item_id, amount = %repair_amount, is_paid, "item handed over");
        Ok(())
    }

    /// Record payment for a handed-over item
    ///
    /// Amount and status are unchanged. Marking an already paid item is a no-op.
    pub fn mark_paid(&mut self, item_id: ItemId) -> StoreResult<()> {
        let current = self.get_item(item_id)?;
        if current.status() != ItemStatus::HandedOver {
            return Err(StoreError::InvalidTransition {
                from: current.status(),
                to: ItemStatus::HandedOver,
            });
        }
        if current.is_paid() {
            return Ok(());
        }

        self.conn()?.execute(
            "UPDATE items SET isPaid = 1, updatedAt = ?1 WHERE id = ?2",
            params![format_timestamp(Utc::now()), item_id],
        )?;
        debug!(id = item_id, "item marked paid");
        Ok(())
    }

    /// Hard-delete an item (kept for older workflows)
    pub fn delete_item(&mut self, item_id: ItemId) -> StoreResult<()> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM items WHERE id = ?1", params![item_id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                kind: "item",
                id: item_id,
            });
        }
        debug!(id = item_id, "deleted item");
        Ok(())
    }
}

/// Sort due-board items by due date, then by person priority (highest first)
///
/// Applied by callers on top of the store's priority/age ordering; the sort
/// is stable, so ties keep that order.
pub fn sort_for_board(items: &mut [Item]) {
    items.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.person_priority.cmp(&a.person_priority))
    });
}

fn item_from_row(row: &Row<'_>, today: NaiveDate) -> rusqlite::Result<Item> {
    let estimated_days: i64 = row.get::<_, Option<i64>>(9)?.unwrap_or(0);
    let created_at = parse_timestamp(&row.get::<_, Option<String>>(10)?.unwrap_or_default());
    let updated_at = row
        .get::<_, Option<String>>(11)?
        .map(|s| parse_timestamp(&s));
    let stored_status: String = row.get::<_, Option<String>>(12)?.unwrap_or_default();
    let repair_amount = amount_from_sql(row.get(13)?);
    let is_paid = row.get::<_, Option<bool>>(14)?.unwrap_or(false);

    let due = due_date(created_at, estimated_days);
    let state = ItemState::resolve(&stored_status, repair_amount, is_paid, due, today);

    Ok(Item {
        id: row.get(0)?,
        serial_number: row.get(1)?,
        item_type_id: row.get(2)?,
        item_type: row.get(3)?,
        person_id: row.get(4)?,
        person_name: row.get(5)?,
        person_priority: row.get::<_, Option<i64>>(6)?.unwrap_or(1).clamp(1, 5) as u8,
        pcb_model_id: row.get(7)?,
        pcb_model: row.get(8)?,
        estimated_days,
        created_at,
        updated_at,
        due_date: due,
        state,
    })
}
