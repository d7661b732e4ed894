use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    categories::{
        dto::CreateCategoryRequest,
        repo_types::{Category, NewCategory},
    },
    error::{AppError, AppResult},
    kind::Kind,
    state::AppState,
};

pub const DEFAULT_COLOR: &str = "#6B7280";
const MAX_NAME_LEN: usize = 100;

fn normalize_color(color: Option<&str>) -> AppResult<String> {
    lazy_static! {
        static ref COLOR_RE: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
    }
    match color.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(DEFAULT_COLOR.to_string()),
        Some(c) if COLOR_RE.is_match(c) => Ok(c.to_uppercase()),
        Some(_) => Err(AppError::validation("color must look like #RRGGBB")),
    }
}

#[instrument(skip(state, req))]
pub async fn create_category(
    state: &AppState,
    user_id: Uuid,
    req: CreateCategoryRequest,
) -> AppResult<Category> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("name is too long"));
    }
    let kind: Kind = req.kind.parse()?;
    let color = normalize_color(req.color.as_deref())?;

    let category = state
        .categories
        .create(NewCategory {
            user_id,
            name: name.to_string(),
            kind,
            color,
        })
        .await?;
    info!(category_id = %category.id, %kind, "category created");
    Ok(category)
}

#[instrument(skip(state))]
pub async fn list_categories(state: &AppState, user_id: Uuid) -> AppResult<Vec<Category>> {
    Ok(state.categories.list_visible(user_id).await?)
}

/// Shared categories and other users' categories both answer `NotFound`.
#[instrument(skip(state))]
pub async fn delete_category(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !state.categories.delete(user_id, id).await? {
        warn!(category_id = %id, "delete of missing or foreign category");
        return Err(AppError::NotFound("category"));
    }
    info!(category_id = %id, "category deleted");
    Ok(())
}

/// Looks up a category the user is allowed to attach to a transaction.
pub async fn visible_category(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Category> {
    match state.categories.find_by_id(id).await? {
        Some(c) if c.is_visible_to(user_id) => Ok(c),
        _ => Err(AppError::NotFound("category")),
    }
}
