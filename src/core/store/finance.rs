//! Read-only finance aggregation

use chrono::{DateTime, Datelike, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{EntityKind, FilterOptions, FinanceSummary, Transaction};
use super::{amount_from_sql, parse_timestamp, InventoryStore};
use crate::core::error::{StoreError, StoreResult};

impl InventoryStore {
    /// Revenue totals and handed-over transactions as of now
    pub fn finance_summary(&self) -> StoreResult<FinanceSummary> {
        self.finance_summary_at(Local::now())
    }

    /// Revenue totals with the "current month" taken from `now`
    ///
    /// Every handed-over item is a transaction. Paid ones count towards total
    /// revenue (and monthly revenue when last updated in `now`'s calendar
    /// month), unpaid ones towards pending payments.
    pub fn finance_summary_at(&self, now: DateTime<Local>) -> StoreResult<FinanceSummary> {
        let transactions = self.transactions()?;

        let mut summary = FinanceSummary::default();
        for tx in &transactions {
            if !tx.is_paid {
                summary.pending_payments += tx.repair_amount;
                continue;
            }

            summary.total_revenue += tx.repair_amount;
            let in_month = tx
                .updated_at
                .map(|ts| ts.with_timezone(&Local))
                .is_some_and(|ts| ts.year() == now.year() && ts.month() == now.month());
            if in_month {
                summary.monthly_revenue += tx.repair_amount;
            }
        }

        summary.transactions = transactions;
        Ok(summary)
    }

    /// Every handed-over item, most recently updated first
    pub fn transactions(&self) -> StoreResult<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT i.id, i.serialNumber, p.name, t.name, m.name,
                      i.repairAmount, i.isPaid, i.updatedAt
               FROM items i
               JOIN persons p ON p.id = i.personId
               JOIN itemTypes t ON t.id = i.itemTypeId
               JOIN pcbModels m ON m.id = i.pcbModelId
               WHERE i.status = 'handedOver'
               ORDER BY i.updatedAt DESC, i.id DESC"#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Transaction {
                item_id: row.get(0)?,
                serial_number: row.get(1)?,
                person_name: row.get(2)?,
                item_type: row.get(3)?,
                pcb_model: row.get(4)?,
                repair_amount: amount_from_sql(row.get(5)?),
                is_paid: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
                updated_at: row
                    .get::<_, Option<String>>(7)?
                    .map(|s| parse_timestamp(&s)),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Distinct person, item-type and pcb-model names referenced by items
    pub fn filter_options(&self) -> StoreResult<FilterOptions> {
        Ok(FilterOptions {
            person_names: self.distinct_names(EntityKind::Person)?,
            item_types: self.distinct_names(EntityKind::ItemType)?,
            pcb_models: self.distinct_names(EntityKind::PcbModel)?,
        })
    }

    fn distinct_names(&self, kind: EntityKind) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT DISTINCT e.name FROM items i JOIN {} e ON e.id = i.{} ORDER BY e.name",
            kind.table(),
            kind.item_column()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

/// Client-side filter over finance transactions
///
/// Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub person_name: Option<String>,
    pub item_type: Option<String>,
    pub pcb_model: Option<String>,
    pub is_paid: Option<bool>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        let field = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().map_or(true, |w| w == actual)
        };

        field(&self.person_name, &tx.person_name)
            && field(&self.item_type, &tx.item_type)
            && field(&self.pcb_model, &tx.pcb_model)
            && self.is_paid.map_or(true, |paid| paid == tx.is_paid)
    }

    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        transactions.into_iter().filter(|tx| self.matches(tx)).collect()
    }

    /// Sum of repair amounts over matching transactions
    pub fn total(&self, transactions: &[Transaction]) -> Decimal {
        transactions
            .iter()
            .filter(|tx| self.matches(tx))
            .map(|tx| tx.repair_amount)
            .sum()
    }
}
