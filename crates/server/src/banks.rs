//! Bank accounts API endpoints.

use api_types::bank::{BankNew, BankRename, BankView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Money;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_bank(bank: engine::Bank) -> BankView {
    BankView {
        id: bank.id,
        name: bank.name,
        initial_balance_minor: bank.initial_balance.minor(),
        balance_minor: bank.balance.minor(),
        created_at: bank.created_at,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<BankView>>, ServerError> {
    let banks = state.engine.banks().await?;
    Ok(Json(banks.into_iter().map(map_bank).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BankView>, ServerError> {
    let bank = state.engine.bank(id).await?;
    Ok(Json(map_bank(bank)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BankNew>,
) -> Result<(StatusCode, Json<BankView>), ServerError> {
    let bank = state
        .engine
        .create_bank(&payload.name, Money::new(payload.initial_balance_minor))
        .await?;
    Ok((StatusCode::CREATED, Json(map_bank(bank))))
}

/// Banks only accept a new name; balances move through transactions.
pub async fn rename(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BankRename>,
) -> Result<Json<BankView>, ServerError> {
    let bank = state.engine.rename_bank(id, &payload.name).await?;
    Ok(Json(map_bank(bank)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_bank(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
