//! Store type definitions
//!
//! Row types returned by store queries and the reference-entity kinds.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::status::{ItemState, ItemStatus, TerminalState};

/// Row id of an item
pub type ItemId = i64;

/// Row id of a person, item type or PCB model
pub type EntityId = i64;

// =========================================================================
// Reference Entities
// =========================================================================

/// The three lookup tables items point to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Person,
    ItemType,
    PcbModel,
}

impl EntityKind {
    /// Table holding rows of this kind
    pub(crate) fn table(&self) -> &'static str {
        match self {
            EntityKind::Person => "persons",
            EntityKind::ItemType => "itemTypes",
            EntityKind::PcbModel => "pcbModels",
        }
    }

    /// Column of `items` referencing this kind
    pub(crate) fn item_column(&self) -> &'static str {
        match self {
            EntityKind::Person => "personId",
            EntityKind::ItemType => "itemTypeId",
            EntityKind::PcbModel => "pcbModelId",
        }
    }

    /// Human-readable name used in messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::ItemType => "item type",
            EntityKind::PcbModel => "pcb model",
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::Person, EntityKind::ItemType, EntityKind::PcbModel]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A customer or technician items are assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: EntityId,
    pub name: String,
    pub phone_number: String,
    pub priority: u8,
    pub item_count: usize,
}

/// An item type or PCB model (name-only lookup rows)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedEntity {
    pub id: EntityId,
    pub name: String,
    pub item_count: usize,
}

/// Outcome of removing a reference entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassignment {
    pub kind: EntityKind,
    pub removed_id: EntityId,
    pub target_id: EntityId,
    pub items_moved: usize,
}

// =========================================================================
// Items
// =========================================================================

/// A repair item joined with its reference names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// `None` for rows created before serial numbers existed
    pub serial_number: Option<String>,
    pub item_type_id: EntityId,
    pub item_type: String,
    pub person_id: EntityId,
    pub person_name: String,
    pub person_priority: u8,
    pub pcb_model_id: EntityId,
    pub pcb_model: String,
    pub estimated_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub due_date: NaiveDate,
    pub state: ItemState,
}

impl Item {
    pub fn status(&self) -> ItemStatus {
        self.state.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Amount charged, zero unless handed over
    pub fn repair_amount(&self) -> Decimal {
        match self.state {
            ItemState::Terminal(TerminalState::HandedOver { amount, .. }) => amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(
            self.state,
            ItemState::Terminal(TerminalState::HandedOver { paid: true, .. })
        )
    }
}

// =========================================================================
// Finance
// =========================================================================

/// A handed-over item as seen by the finance view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub item_id: ItemId,
    pub serial_number: Option<String>,
    pub person_name: String,
    pub item_type: String,
    pub pcb_model: String,
    pub repair_amount: Decimal,
    pub is_paid: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Revenue totals plus every handed-over transaction, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub total_revenue: Decimal,
    pub pending_payments: Decimal,
    pub monthly_revenue: Decimal,
    pub transactions: Vec<Transaction>,
}

/// Distinct reference names currently used by items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub person_names: Vec<String>,
    pub item_types: Vec<String>,
    pub pcb_models: Vec<String>,
}
