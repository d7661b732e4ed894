use rust_decimal::Decimal;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::kind::Kind;

/// Transaction record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: Decimal, // always > 0, two fractional digits
    pub kind: Kind,
    pub description: String,
    pub occurred_on: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Transaction joined with its category's name ("" when it has none).
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    #[sqlx(flatten)]
    pub transaction: Transaction,
    pub category_name: String,
}

/// Validated values for an insert or a full update.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: Kind,
    pub description: String,
    pub occurred_on: Date,
}

/// Owner-scoped filter. Both date bounds are inclusive and independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub kind: Option<Kind>,
}

impl TransactionFilter {
    pub fn between(from: Option<Date>, to: Option<Date>) -> Self {
        Self {
            from,
            to,
            kind: None,
        }
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        self.from.map_or(true, |from| t.occurred_on >= from)
            && self.to.map_or(true, |to| t.occurred_on <= to)
            && self.kind.map_or(true, |kind| t.kind == kind)
    }
}
