//! Transactions API endpoints

use api_types::transaction::{
    TransactionList, TransactionListResponse, TransactionNew, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreateTransactionCmd, Money, TransactionListFilter, UpdateTransactionCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{Actor, ServerState},
};

const DEFAULT_PAGE: u64 = 50;
const MAX_PAGE: u64 = 500;

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        bank_id: tx.bank_id,
        category_id: tx.category_id,
        income_type_id: tx.income_type_id,
        expense_type_id: tx.expense_type_id,
        date: tx.date,
        amount_minor: tx.amount.minor(),
        note: tx.note,
        created_by: tx.created_by,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

/// Merges a set id and its clear flag into the engine's patch shape.
fn type_patch(
    id: Option<Uuid>,
    clear: bool,
    label: &str,
) -> Result<Option<Option<Uuid>>, ServerError> {
    match (id, clear) {
        (Some(_), true) => Err(ServerError::Generic(format!(
            "{label}_id and clear_{label} are exclusive"
        ))),
        (Some(id), false) => Ok(Some(Some(id))),
        (None, true) => Ok(Some(None)),
        (None, false) => Ok(None),
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE);
    let filter = TransactionListFilter {
        bank_id: query.bank_id,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions_page(&filter, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(map_transaction).collect(),
        next_cursor,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(id).await?;
    Ok(Json(map_transaction(tx)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = CreateTransactionCmd::new(
        payload.bank_id,
        payload.category_id,
        Money::new(payload.amount_minor),
        payload.date,
        actor.0,
    );
    if let Some(id) = payload.income_type_id {
        cmd = cmd.income_type_id(id);
    }
    if let Some(id) = payload.expense_type_id {
        cmd = cmd.expense_type_id(id);
    }
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let tx = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let mut cmd = UpdateTransactionCmd::new(id, actor.0);
    cmd.amount = payload.amount_minor.map(Money::new);
    cmd.bank_id = payload.bank_id;
    cmd.category_id = payload.category_id;
    cmd.income_type_id = type_patch(
        payload.income_type_id,
        payload.clear_income_type,
        "income_type",
    )?;
    cmd.expense_type_id = type_patch(
        payload.expense_type_id,
        payload.clear_expense_type,
        "expense_type",
    )?;
    cmd.date = payload.date;
    cmd.note = payload.note;

    let tx = state.engine.update_transaction(cmd).await?;
    Ok(Json(map_transaction(tx)))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
