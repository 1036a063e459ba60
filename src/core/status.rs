//! Item status model
//!
//! Only the terminal statuses are stored as ground truth. While an item is
//! active its status is derived from the due date every time it is read.

use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status value as exposed to callers and stored in the `status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemStatus {
    Upcoming,
    DueToday,
    Overdue,
    NonRepairable,
    HandedOver,
}

impl ItemStatus {
    /// Get the stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Upcoming => "upcoming",
            ItemStatus::DueToday => "dueToday",
            ItemStatus::Overdue => "overdue",
            ItemStatus::NonRepairable => "nonRepairable",
            ItemStatus::HandedOver => "handedOver",
        }
    }

    /// Whether the status ends due-board processing
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::NonRepairable | ItemStatus::HandedOver)
    }

    pub fn all() -> &'static [ItemStatus] {
        &[
            ItemStatus::Upcoming,
            ItemStatus::DueToday,
            ItemStatus::Overdue,
            ItemStatus::NonRepairable,
            ItemStatus::HandedOver,
        ]
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::all()
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown item status: '{}'", s))
    }
}

/// Computed status of an active item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DueStatus {
    Upcoming,
    DueToday,
    Overdue,
}

impl DueStatus {
    /// Classify a due date relative to `today`
    pub fn compute(due_date: NaiveDate, today: NaiveDate) -> Self {
        match due_date.cmp(&today) {
            std::cmp::Ordering::Less => DueStatus::Overdue,
            std::cmp::Ordering::Equal => DueStatus::DueToday,
            std::cmp::Ordering::Greater => DueStatus::Upcoming,
        }
    }

    pub fn status(&self) -> ItemStatus {
        match self {
            DueStatus::Upcoming => ItemStatus::Upcoming,
            DueStatus::DueToday => ItemStatus::DueToday,
            DueStatus::Overdue => ItemStatus::Overdue,
        }
    }
}

/// Persisted end state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminalState {
    NonRepairable,
    HandedOver { amount: Decimal, paid: bool },
}

/// Full state of an item: computed while active, stored once terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum ItemState {
    Active(DueStatus),
    Terminal(TerminalState),
}

impl ItemState {
    /// Resolve the state of a row from its stored columns
    ///
    /// Stored strings other than the two terminal ones (including legacy
    /// `dueToday` / `overdue` values) are treated as active and recomputed.
    pub fn resolve(
        stored: &str,
        repair_amount: Decimal,
        is_paid: bool,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        match stored {
            "nonRepairable" => ItemState::Terminal(TerminalState::NonRepairable),
            "handedOver" => ItemState::Terminal(TerminalState::HandedOver {
                amount: repair_amount,
                paid: is_paid,
            }),
            _ => ItemState::Active(DueStatus::compute(due_date, today)),
        }
    }

    pub fn status(&self) -> ItemStatus {
        match self {
            ItemState::Active(due) => due.status(),
            ItemState::Terminal(TerminalState::NonRepairable) => ItemStatus::NonRepairable,
            ItemState::Terminal(TerminalState::HandedOver { .. }) => ItemStatus::HandedOver,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Terminal(_))
    }
}

/// Due date of an item: the local calendar date of creation plus the estimate
pub fn due_date(created_at: DateTime<Utc>, estimated_days: i64) -> NaiveDate {
    let created = created_at.with_timezone(&Local).date_naive();
    TimeDelta::try_days(estimated_days.max(0))
        .and_then(|delta| created.checked_add_signed(delta))
        .unwrap_or(NaiveDate::MAX)
}
