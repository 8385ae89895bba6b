//! Categories API endpoints.

use api_types::category::{
    CalculateMethod as ApiMethod, CategoryKind as ApiKind, CategoryNew, CategoryUpdate,
    CategoryView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn map_kind(kind: engine::CategoryKind) -> ApiKind {
    match kind {
        engine::CategoryKind::Income => ApiKind::Income,
        engine::CategoryKind::Expense => ApiKind::Expense,
    }
}

fn kind_from_api(kind: ApiKind) -> engine::CategoryKind {
    match kind {
        ApiKind::Income => engine::CategoryKind::Income,
        ApiKind::Expense => engine::CategoryKind::Expense,
    }
}

pub(crate) fn map_method(method: engine::CalculateMethod) -> ApiMethod {
    match method {
        engine::CalculateMethod::Credit => ApiMethod::Add,
        engine::CalculateMethod::Debit => ApiMethod::Subtract,
    }
}

fn method_from_api(method: ApiMethod) -> engine::CalculateMethod {
    match method {
        ApiMethod::Add => engine::CalculateMethod::Credit,
        ApiMethod::Subtract => engine::CalculateMethod::Debit,
    }
}

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: map_kind(category.kind),
        calculate_method: map_method(category.calculate_method),
        created_at: category.created_at,
    }
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.categories().await?;
    Ok(Json(categories.into_iter().map(map_category).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(id).await?;
    Ok(Json(map_category(category)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            &payload.name,
            kind_from_api(payload.kind),
            method_from_api(payload.calculate_method),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(
            id,
            payload.name.as_deref(),
            payload.kind.map(kind_from_api),
            payload.calculate_method.map(method_from_api),
        )
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
