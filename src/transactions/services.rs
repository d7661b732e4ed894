use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    categories::services::visible_category,
    dates::{parse_bound, parse_date},
    error::{AppError, AppResult},
    kind::Kind,
    state::AppState,
    transactions::{
        dto::{FilterQuery, TransactionRequest, TransactionView},
        repo_types::{Transaction, TransactionFilter, TransactionInput},
        summary::FinancialSummary,
    },
};

const MAX_DESCRIPTION_LEN: usize = 500;

/// NUMERIC(15, 2) upper bound.
fn max_amount() -> Decimal {
    Decimal::new(10_i64.pow(13), 0)
}

/// Checks a request and resolves its category, returning the insertable
/// values and the category name to show.
async fn validate_request(
    state: &AppState,
    user_id: Uuid,
    req: TransactionRequest,
) -> AppResult<(TransactionInput, String)> {
    if req.amount <= Decimal::ZERO {
        return Err(AppError::validation("amount must be positive"));
    }
    if req.amount.normalize().scale() > 2 {
        return Err(AppError::validation("amount has more than two decimal places"));
    }
    if req.amount >= max_amount() {
        return Err(AppError::validation("amount is too large"));
    }
    let kind: Kind = req.kind.parse()?;
    let description = req.description.trim();
    if description.is_empty() {
        return Err(AppError::validation("description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation("description is too long"));
    }
    let occurred_on = parse_date(&req.date)?;

    let category_name = match req.category_id {
        None => String::new(),
        Some(id) => {
            let category = visible_category(state, user_id, id).await?;
            if category.kind != kind {
                return Err(AppError::validation(format!(
                    "category '{}' is for {} entries",
                    category.name, category.kind
                )));
            }
            category.name
        }
    };

    let mut amount = req.amount;
    amount.rescale(2);

    Ok((
        TransactionInput {
            category_id: req.category_id,
            amount,
            kind,
            description: description.to_string(),
            occurred_on,
        },
        category_name,
    ))
}

fn view(t: Transaction, category_name: String) -> TransactionView {
    TransactionView {
        id: t.id,
        amount: t.amount,
        kind: t.kind,
        description: t.description,
        date: t.occurred_on,
        category_id: t.category_id,
        category_name,
    }
}

/// Turns query-string values into a filter; `from` after `to` is refused.
pub fn parse_filter(q: &FilterQuery) -> AppResult<TransactionFilter> {
    let from = parse_bound(q.from.as_deref())?;
    let to = parse_bound(q.to.as_deref())?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::validation("'from' must not be after 'to'"));
        }
    }
    let kind = match q.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(k) => Some(k.parse::<Kind>()?),
        None => None,
    };
    Ok(TransactionFilter { from, to, kind })
}

#[instrument(skip(state, req))]
pub async fn create_transaction(
    state: &AppState,
    user_id: Uuid,
    req: TransactionRequest,
) -> AppResult<TransactionView> {
    let (input, category_name) = validate_request(state, user_id, req).await?;
    let created = state.transactions.create(user_id, input).await?;
    info!(transaction_id = %created.id, kind = %created.kind, "transaction created");
    Ok(view(created, category_name))
}

#[instrument(skip(state))]
pub async fn list_transactions(
    state: &AppState,
    user_id: Uuid,
    filter: TransactionFilter,
) -> AppResult<Vec<TransactionView>> {
    let rows = state.transactions.list(user_id, filter).await?;
    Ok(rows.into_iter().map(TransactionView::from).collect())
}

#[instrument(skip(state))]
pub async fn get_transaction(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<TransactionView> {
    match state.transactions.find_by_id(id).await? {
        Some(row) if row.transaction.user_id == user_id => Ok(row.into()),
        _ => Err(AppError::NotFound("transaction")),
    }
}

#[instrument(skip(state, req))]
pub async fn update_transaction(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    req: TransactionRequest,
) -> AppResult<TransactionView> {
    let (input, category_name) = validate_request(state, user_id, req).await?;
    let updated = state
        .transactions
        .update(user_id, id, input)
        .await?
        .ok_or(AppError::NotFound("transaction"))?;
    info!(transaction_id = %id, "transaction updated");
    Ok(view(updated, category_name))
}

/// Someone else's transaction answers `NotFound`, same as a missing one.
#[instrument(skip(state))]
pub async fn delete_transaction(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !state.transactions.delete(user_id, id).await? {
        warn!(transaction_id = %id, "delete of missing or foreign transaction");
        return Err(AppError::NotFound("transaction"));
    }
    info!(transaction_id = %id, "transaction deleted");
    Ok(())
}

/// Totals over the owner's transactions inside the (inclusive) date range.
#[instrument(skip(state))]
pub async fn summarize(state: &AppState, user_id: Uuid, filter: TransactionFilter) -> AppResult<FinancialSummary> {
    let filter = TransactionFilter::between(filter.from, filter.to);
    let rows = state.transactions.list(user_id, filter).await?;
    Ok(FinancialSummary::from_transactions(rows.iter().map(|r| &r.transaction)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{dto::CreateCategoryRequest, services::create_category};
    use time::macros::date;

    fn req(amount: Decimal, kind: &str, date: &str, category_id: Option<Uuid>) -> TransactionRequest {
        TransactionRequest {
            category_id,
            amount,
            kind: kind.into(),
            description: "entry".into(),
            date: date.into(),
        }
    }

    async fn groceries(state: &AppState, user: Uuid) -> Uuid {
        create_category(
            state,
            user,
            CreateCategoryRequest {
                name: "Groceries".into(),
                kind: "expense".into(),
                color: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        for amount in [Decimal::ZERO, Decimal::new(-100, 2)] {
            let err = create_transaction(&state, user, req(amount, "expense", "2024-01-10", None))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn rejects_sub_cent_amounts_and_bad_dates() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        let err = create_transaction(&state, user, req(Decimal::new(1005, 3), "income", "2024-01-10", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = create_transaction(&state, user, req(Decimal::ONE, "income", "yesterday", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn foreign_category_is_not_found() {
        let state = AppState::in_memory();
        let owner = Uuid::new_v4();
        let cat = groceries(&state, owner).await;
        let err = create_transaction(
            &state,
            Uuid::new_v4(),
            req(Decimal::ONE, "expense", "2024-01-10", Some(cat)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound("category")));
    }

    #[tokio::test]
    async fn category_kind_must_match() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        let cat = groceries(&state, user).await;
        let err = create_transaction(&state, user, req(Decimal::ONE, "income", "2024-01-10", Some(cat)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first_with_category_names() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        let cat = groceries(&state, user).await;
        create_transaction(&state, user, req(Decimal::new(4250, 2), "expense", "2024-01-10", Some(cat)))
            .await
            .unwrap();
        create_transaction(&state, user, req(Decimal::new(100000, 2), "income", "2024-01-15", None))
            .await
            .unwrap();
        create_transaction(&state, user, req(Decimal::new(500, 2), "expense", "2023-12-31", None))
            .await
            .unwrap();

        let all = list_transactions(&state, user, TransactionFilter::default()).await.unwrap();
        let dates: Vec<_> = all.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date!(2024 - 01 - 15), date!(2024 - 01 - 10), date!(2023 - 12 - 31)]);
        assert_eq!(all[0].category_name, "");
        assert_eq!(all[1].category_name, "Groceries");

        let january = TransactionFilter::between(Some(date!(2024 - 01 - 01)), Some(date!(2024 - 01 - 31)));
        assert_eq!(list_transactions(&state, user, january).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bounds_are_inclusive() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        create_transaction(&state, user, req(Decimal::ONE, "income", "2024-01-01", None))
            .await
            .unwrap();
        create_transaction(&state, user, req(Decimal::TWO, "income", "2024-01-31", None))
            .await
            .unwrap();
        let only_from = TransactionFilter::between(Some(date!(2024 - 01 - 31)), None);
        let only_to = TransactionFilter::between(None, Some(date!(2024 - 01 - 01)));
        assert_eq!(summarize(&state, user, only_from).await.unwrap().total_income, Decimal::TWO);
        assert_eq!(summarize(&state, user, only_to).await.unwrap().total_income, Decimal::ONE);
    }

    #[tokio::test]
    async fn summary_of_new_user_is_zero() {
        let state = AppState::in_memory();
        let s = summarize(&state, Uuid::new_v4(), TransactionFilter::default()).await.unwrap();
        assert_eq!(s, FinancialSummary::default());
    }

    #[tokio::test]
    async fn summaries_over_adjacent_ranges_add_up_to_the_whole() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        // entries sit on the range edges so an off-by-one bound would double count or drop them
        let entries = [
            ("12345.67", "income", "2024-01-01"),
            ("9.99", "expense", "2024-01-31"),
            ("0.01", "expense", "2024-02-01"),
            ("0.33", "income", "2024-02-29"),
            ("700.01", "expense", "2024-03-01"),
            ("50.00", "income", "2024-12-31"),
        ];
        for (amount, kind, on) in entries {
            create_transaction(&state, user, req(amount.parse().unwrap(), kind, on, None))
                .await
                .unwrap();
        }

        let whole = summarize(&state, user, TransactionFilter::default()).await.unwrap();
        let ranges = [
            (None, Some(date!(2024 - 01 - 31))),
            (Some(date!(2024 - 02 - 01)), Some(date!(2024 - 02 - 29))),
            (Some(date!(2024 - 03 - 01)), Some(date!(2024 - 12 - 30))),
            (Some(date!(2024 - 12 - 31)), None),
        ];
        let mut parts = FinancialSummary::default();
        for (from, to) in ranges {
            parts = parts + summarize(&state, user, TransactionFilter::between(from, to)).await.unwrap();
        }

        assert_eq!(parts, whole);
        assert_eq!(whole.total_income, Decimal::new(1239600, 2));
        assert_eq!(whole.total_expense, Decimal::new(71001, 2));
    }

    #[tokio::test]
    async fn summary_ignores_other_users() {
        let state = AppState::in_memory();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        create_transaction(&state, a, req(Decimal::TEN, "income", "2024-01-01", None))
            .await
            .unwrap();
        let s = summarize(&state, b, TransactionFilter::default()).await.unwrap();
        assert_eq!(s.total_income, Decimal::ZERO);
    }

    #[tokio::test]
    async fn foreign_transaction_cannot_be_read_changed_or_deleted() {
        let state = AppState::in_memory();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let t = create_transaction(&state, owner, req(Decimal::TEN, "income", "2024-01-01", None))
            .await
            .unwrap();

        let err = get_transaction(&state, intruder, t.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("transaction")));
        let err = update_transaction(&state, intruder, t.id, req(Decimal::ONE, "income", "2024-01-02", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("transaction")));
        let err = delete_transaction(&state, intruder, t.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("transaction")));

        assert_eq!(get_transaction(&state, owner, t.id).await.unwrap().amount, Decimal::TEN);
        delete_transaction(&state, owner, t.id).await.unwrap();
        assert!(get_transaction(&state, owner, t.id).await.is_err());
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let state = AppState::in_memory();
        let user = Uuid::new_v4();
        let t = create_transaction(&state, user, req(Decimal::TEN, "income", "2024-01-01", None))
            .await
            .unwrap();
        let updated = update_transaction(&state, user, t.id, req(Decimal::new(1999, 2), "expense", "2024-02-02", None))
            .await
            .unwrap();
        assert_eq!(updated.kind, Kind::Expense);
        assert_eq!(updated.amount.to_string(), "19.99");
        assert_eq!(updated.date, date!(2024 - 02 - 02));
    }

    #[test]
    fn filter_parsing() {
        let q = FilterQuery {
            from: Some("2024-01-01".into()),
            to: Some("2024-01-31".into()),
            kind: Some("expense".into()),
        };
        let f = parse_filter(&q).unwrap();
        assert_eq!(f.from, Some(date!(2024 - 01 - 01)));
        assert_eq!(f.kind, Some(Kind::Expense));

        let inverted = FilterQuery {
            from: Some("2024-02-01".into()),
            to: Some("2024-01-01".into()),
            kind: None,
        };
        assert!(matches!(parse_filter(&inverted), Err(AppError::Validation(_))));
        assert_eq!(parse_filter(&FilterQuery::default()).unwrap(), TransactionFilter::default());
    }
}
