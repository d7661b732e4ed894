use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{dates::iso_date, kind::Kind};
use crate::transactions::repo_types::TransactionRow;

/// Body for creating or replacing a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD&type=income|expense`
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub category_id: Option<Uuid>,
    pub category_name: String,
}

impl From<TransactionRow> for TransactionView {
    fn from(row: TransactionRow) -> Self {
        let t = row.transaction;
        Self {
            id: t.id,
            amount: t.amount,
            kind: t.kind,
            description: t.description,
            date: t.occurred_on,
            category_id: t.category_id,
            category_name: row.category_name,
        }
    }
}
