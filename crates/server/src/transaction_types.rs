//! Income and expense types API endpoints.

use api_types::transaction_type::{TransactionTypeNew, TransactionTypeView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::TransactionTypeKind;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_type(value: engine::TransactionType) -> TransactionTypeView {
    TransactionTypeView {
        id: value.id,
        name: value.name,
    }
}

async fn list(
    state: &ServerState,
    kind: TransactionTypeKind,
) -> Result<Json<Vec<TransactionTypeView>>, ServerError> {
    let types = state.engine.transaction_types(kind).await?;
    Ok(Json(types.into_iter().map(map_type).collect()))
}

async fn create(
    state: &ServerState,
    kind: TransactionTypeKind,
    payload: TransactionTypeNew,
) -> Result<(StatusCode, Json<TransactionTypeView>), ServerError> {
    let created = state
        .engine
        .create_transaction_type(kind, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(map_type(created))))
}

async fn get(
    state: &ServerState,
    kind: TransactionTypeKind,
    id: Uuid,
) -> Result<Json<TransactionTypeView>, ServerError> {
    let found = state.engine.transaction_type(kind, id).await?;
    Ok(Json(map_type(found)))
}

async fn rename(
    state: &ServerState,
    kind: TransactionTypeKind,
    id: Uuid,
    payload: TransactionTypeNew,
) -> Result<Json<TransactionTypeView>, ServerError> {
    let renamed = state
        .engine
        .rename_transaction_type(kind, id, &payload.name)
        .await?;
    Ok(Json(map_type(renamed)))
}

async fn delete(
    state: &ServerState,
    kind: TransactionTypeKind,
    id: Uuid,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction_type(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_income(
    State(state): State<ServerState>,
) -> Result<Json<Vec<TransactionTypeView>>, ServerError> {
    list(&state, TransactionTypeKind::Income).await
}

pub async fn create_income(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionTypeNew>,
) -> Result<(StatusCode, Json<TransactionTypeView>), ServerError> {
    create(&state, TransactionTypeKind::Income, payload).await
}

pub async fn get_income(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionTypeView>, ServerError> {
    get(&state, TransactionTypeKind::Income, id).await
}

pub async fn rename_income(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionTypeNew>,
) -> Result<Json<TransactionTypeView>, ServerError> {
    rename(&state, TransactionTypeKind::Income, id, payload).await
}

pub async fn delete_income(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    delete(&state, TransactionTypeKind::Income, id).await
}

pub async fn list_expense(
    State(state): State<ServerState>,
) -> Result<Json<Vec<TransactionTypeView>>, ServerError> {
    list(&state, TransactionTypeKind::Expense).await
}

pub async fn create_expense(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionTypeNew>,
) -> Result<(StatusCode, Json<TransactionTypeView>), ServerError> {
    create(&state, TransactionTypeKind::Expense, payload).await
}

pub async fn get_expense(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionTypeView>, ServerError> {
    get(&state, TransactionTypeKind::Expense, id).await
}

pub async fn rename_expense(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionTypeNew>,
) -> Result<Json<TransactionTypeView>, ServerError> {
    rename(&state, TransactionTypeKind::Expense, id, payload).await
}

pub async fn delete_expense(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    delete(&state, TransactionTypeKind::Expense, id).await
}
