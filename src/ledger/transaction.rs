use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded expense or income entry. Transactions are immutable once
/// recorded; the only lifecycle operation after creation is deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    /// Id of the category this entry belongs to. Referential validity is
    /// enforced at category deletion, not here.
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn new(draft: NewTransaction) -> Self {
        Self {
            id: fresh_id(),
            amount: draft.amount,
            category: draft.category,
            date: draft.date,
            note: draft.note,
            kind: draft.kind,
        }
    }
}

/// Transaction attributes as supplied by the caller; the container assigns
/// the id.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

/// Collision-resistant replacement for timestamp-derived ids.
pub(crate) fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}
