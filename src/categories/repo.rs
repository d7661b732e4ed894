use async_trait::async_trait;
use uuid::Uuid;

use crate::categories::repo_types::{Category, NewCategory};
use crate::db::{PgStore, StoreResult};

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    async fn create(&self, new: NewCategory) -> StoreResult<Category>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Category>>;
    /// The user's own categories plus the shared ones, ordered by name.
    async fn list_visible(&self, user_id: Uuid) -> StoreResult<Vec<Category>>;
    /// Deletes only when owned by `user_id`; returns whether a row went away.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, color, created_at, updated_at";

#[async_trait]
impl CategoryRepo for PgStore {
    async fn create(&self, new: NewCategory) -> StoreResult<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (id, user_id, name, kind, color)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.name)
        .bind(new.kind)
        .bind(&new.color)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_visible(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE user_id = $1 OR user_id IS NULL
            ORDER BY name ASC, created_at ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
