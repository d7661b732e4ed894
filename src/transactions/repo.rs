use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{PgStore, StoreResult};
use crate::transactions::repo_types::{Transaction, TransactionFilter, TransactionInput, TransactionRow};

#[async_trait]
pub trait TransactionRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, input: TransactionInput) -> StoreResult<Transaction>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TransactionRow>>;
    /// Replaces the editable fields of a row owned by `user_id`.
    async fn update(&self, user_id: Uuid, id: Uuid, input: TransactionInput) -> StoreResult<Option<Transaction>>;
    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
    /// Most recent first; ties broken by creation time, newest first.
    async fn list(&self, user_id: Uuid, filter: TransactionFilter) -> StoreResult<Vec<TransactionRow>>;
}

const TX_COLUMNS: &str =
    "id, user_id, category_id, amount, kind, description, occurred_on, created_at, updated_at";

const TX_JOINED_COLUMNS: &str = r#"
    t.id, t.user_id, t.category_id, t.amount, t.kind, t.description, t.occurred_on,
    t.created_at, t.updated_at, COALESCE(c.name, '') AS category_name
"#;

#[async_trait]
impl TransactionRepo for PgStore {
    async fn create(&self, user_id: Uuid, input: TransactionInput) -> StoreResult<Transaction> {
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (id, user_id, category_id, amount, kind, description, occurred_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TX_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.category_id)
        .bind(input.amount)
        .bind(input.kind)
        .bind(&input.description)
        .bind(input.occurred_on)
        .fetch_one(&self.pool)
        .await?;
        Ok(tx)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TransactionRow>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {TX_JOINED_COLUMNS}
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, input: TransactionInput) -> StoreResult<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
               SET category_id = $3, amount = $4, kind = $5, description = $6,
                   occurred_on = $7, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {TX_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(input.category_id)
        .bind(input.amount)
        .bind(input.kind)
        .bind(&input.description)
        .bind(input.occurred_on)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tx)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list(&self, user_id: Uuid, filter: TransactionFilter) -> StoreResult<Vec<TransactionRow>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {TX_JOINED_COLUMNS}
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = $1
              AND ($2::date IS NULL OR t.occurred_on >= $2)
              AND ($3::date IS NULL OR t.occurred_on <= $3)
              AND ($4::entry_kind IS NULL OR t.kind = $4)
            ORDER BY t.occurred_on DESC, t.created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
