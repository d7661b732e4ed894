use std::ops::Add;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::kind::Kind;
use crate::transactions::repo_types::Transaction;

/// Income, expense and their difference over one set of transactions.
///
/// Sums are exact decimals, so summarizing disjoint date ranges and adding
/// the results gives the same totals as summarizing the whole range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
}

impl FinancialSummary {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let (income, expense) = transactions.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), t| match t.kind {
                Kind::Income => (income + t.amount, expense),
                Kind::Expense => (income, expense + t.amount),
            },
        );
        Self::from_totals(income, expense)
    }

    fn from_totals(income: Decimal, expense: Decimal) -> Self {
        Self {
            total_income: money(income),
            total_expense: money(expense),
            balance: money(income - expense),
        }
    }
}

impl Add for FinancialSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_totals(
            self.total_income + rhs.total_income,
            self.total_expense + rhs.total_expense,
        )
    }
}

/// Two fractional digits on the way out, e.g. `0.00`.
fn money(mut value: Decimal) -> Decimal {
    value.rescale(2);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Date, OffsetDateTime};
    use uuid::Uuid;

    fn tx(kind: Kind, cents: i64, on: Date) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            category_id: None,
            amount: Decimal::new(cents, 2),
            kind,
            description: "t".into(),
            occurred_on: on,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_set_is_all_zero() {
        let s = FinancialSummary::from_transactions(&Vec::<Transaction>::new());
        assert_eq!(s, FinancialSummary::default());
        assert_eq!(s.balance.to_string(), "0.00");
    }

    #[test]
    fn income_adds_and_expense_subtracts() {
        let txs = vec![
            tx(Kind::Expense, 4250, date!(2024 - 01 - 10)),
            tx(Kind::Income, 100000, date!(2024 - 01 - 15)),
        ];
        let s = FinancialSummary::from_transactions(&txs);
        assert_eq!(s.total_income, Decimal::new(100000, 2));
        assert_eq!(s.total_expense, Decimal::new(4250, 2));
        assert_eq!(s.balance.to_string(), "957.50");
    }

    #[test]
    fn negative_balance_when_spending_more() {
        let txs = vec![
            tx(Kind::Income, 1000, date!(2024 - 03 - 01)),
            tx(Kind::Expense, 2500, date!(2024 - 03 - 02)),
        ];
        assert_eq!(FinancialSummary::from_transactions(&txs).balance, Decimal::new(-1500, 2));
    }

    #[test]
    fn ten_cent_amounts_do_not_drift() {
        let txs: Vec<_> = (0..1000)
            .map(|_| tx(Kind::Income, 10, date!(2024 - 01 - 01)))
            .collect();
        assert_eq!(
            FinancialSummary::from_transactions(&txs).total_income,
            Decimal::new(100, 0)
        );
    }

    #[test]
    fn sum_over_partition_equals_whole() {
        let txs = vec![
            tx(Kind::Income, 123456, date!(2024 - 01 - 01)),
            tx(Kind::Expense, 999, date!(2024 - 01 - 31)),
            tx(Kind::Expense, 1, date!(2024 - 02 - 01)),
            tx(Kind::Income, 33, date!(2024 - 02 - 14)),
            tx(Kind::Expense, 70001, date!(2024 - 12 - 31)),
        ];
        let whole = FinancialSummary::from_transactions(&txs);

        let cuts = [date!(2024 - 01 - 31), date!(2024 - 02 - 13), date!(2024 - 06 - 30)];
        let mut parts = FinancialSummary::default();
        let mut lower: Option<Date> = None;
        for upper in cuts.iter().copied().map(Some).chain([None]) {
            let slice = txs.iter().filter(|t| {
                lower.map_or(true, |l| t.occurred_on > l) && upper.map_or(true, |u| t.occurred_on <= u)
            });
            parts = parts + FinancialSummary::from_transactions(slice);
            lower = upper;
        }
        assert_eq!(parts, whole);
    }
}
