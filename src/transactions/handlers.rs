use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppResult,
    state::AppState,
    transactions::{
        dto::{FilterQuery, TransactionRequest, TransactionView},
        services,
        summary::FinancialSummary,
    },
};

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route("/summary", get(get_summary))
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<Vec<TransactionView>>> {
    let filter = services::parse_filter(&q)?;
    Ok(Json(services::list_transactions(&state, user_id, filter).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TransactionRequest>,
) -> AppResult<(StatusCode, Json<TransactionView>)> {
    let created = services::create_transaction(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransactionView>> {
    Ok(Json(services::get_transaction(&state, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionRequest>,
) -> AppResult<Json<TransactionView>> {
    Ok(Json(services::update_transaction(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_transaction(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<FinancialSummary>> {
    let filter = services::parse_filter(&q)?;
    Ok(Json(services::summarize(&state, user_id, filter).await?))
}
