use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    categories::{
        repo::CategoryRepo,
        repo_types::{Category, NewCategory},
        services::DEFAULT_COLOR,
    },
    db::{StoreError, StoreResult},
    kind::Kind,
    transactions::{
        repo::TransactionRepo,
        repo_types::{Transaction, TransactionFilter, TransactionInput, TransactionRow},
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    // insertion sequence keeps same-day ordering stable
    transactions: HashMap<Uuid, (u64, Transaction)>,
    seq: u64,
}

impl Tables {
    fn joined(&self, t: &Transaction) -> TransactionRow {
        let category_name = t
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| c.name.clone())
            .unwrap_or_default();
        TransactionRow {
            transaction: t.clone(),
            category_name,
        }
    }
}

/// In-process store with the same uniqueness and ownership rules as Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category with no owner, visible to every user.
    pub async fn insert_shared_category(&self, name: &str, kind: Kind) -> Category {
        let now = OffsetDateTime::now_utc();
        let category = Category {
            id: Uuid::new_v4(),
            user_id: None,
            name: name.to_string(),
            kind,
            color: DEFAULT_COLOR.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        category
    }

    /// Flips the active flag; returns false for an unknown user.
    pub async fn set_user_active(&self, id: Uuid, active: bool) -> bool {
        match self.tables.write().await.users.get_mut(&id) {
            Some(u) => {
                u.is_active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        if let Some(u) = self.tables.write().await.users.get_mut(&id) {
            u.last_login = Some(at);
            u.updated_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn create(&self, new: NewCategory) -> StoreResult<Category> {
        let now = OffsetDateTime::now_utc();
        let category = Category {
            id: Uuid::new_v4(),
            user_id: Some(new.user_id),
            name: new.name,
            kind: new.kind,
            color: new.color,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list_visible(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut out: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.is_visible_to(user_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(out)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = matches!(tables.categories.get(&id), Some(c) if c.user_id == Some(user_id));
        if !owned {
            return Ok(false);
        }
        tables.categories.remove(&id);
        for (_, t) in tables.transactions.values_mut() {
            if t.category_id == Some(id) {
                t.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl TransactionRepo for MemoryStore {
    async fn create(&self, user_id: Uuid, input: TransactionInput) -> StoreResult<Transaction> {
        let mut tables = self.tables.write().await;
        let now = OffsetDateTime::now_utc();
        let t = Transaction {
            id: Uuid::new_v4(),
            user_id,
            category_id: input.category_id,
            amount: input.amount,
            kind: input.kind,
            description: input.description,
            occurred_on: input.occurred_on,
            created_at: now,
            updated_at: now,
        };
        tables.seq += 1;
        let seq = tables.seq;
        tables.transactions.insert(t.id, (seq, t.clone()));
        Ok(t)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TransactionRow>> {
        let tables = self.tables.read().await;
        Ok(tables.transactions.get(&id).map(|(_, t)| tables.joined(t)))
    }

    async fn update(&self, user_id: Uuid, id: Uuid, input: TransactionInput) -> StoreResult<Option<Transaction>> {
        let mut tables = self.tables.write().await;
        match tables.transactions.get_mut(&id) {
            Some((_, t)) if t.user_id == user_id => {
                t.category_id = input.category_id;
                t.amount = input.amount;
                t.kind = input.kind;
                t.description = input.description;
                t.occurred_on = input.occurred_on;
                t.updated_at = OffsetDateTime::now_utc();
                Ok(Some(t.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = matches!(tables.transactions.get(&id), Some((_, t)) if t.user_id == user_id);
        if owned {
            tables.transactions.remove(&id);
        }
        Ok(owned)
    }

    async fn list(&self, user_id: Uuid, filter: TransactionFilter) -> StoreResult<Vec<TransactionRow>> {
        let tables = self.tables.read().await;
        let mut hits: Vec<&(u64, Transaction)> = tables
            .transactions
            .values()
            .filter(|(_, t)| t.user_id == user_id && filter.matches(t))
            .collect();
        hits.sort_by(|(sa, a), (sb, b)| b.occurred_on.cmp(&a.occurred_on).then(sb.cmp(sa)));
        Ok(hits.into_iter().map(|(_, t)| tables.joined(t)).collect())
    }
}
