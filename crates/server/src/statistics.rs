//! Statistics API endpoints

use api_types::stats::{BankStatistic, CategoryStatistic, Statistic, StatsQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use engine::StatsFilter;

use crate::{
    ServerError,
    categories::{map_kind, map_method},
    server::ServerState,
};

fn filter(query: StatsQuery) -> StatsFilter {
    StatsFilter {
        bank_id: query.bank_id,
        from: query.from,
        to: query.to,
    }
}

/// Handle requests for ledger totals
pub async fn totals(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Statistic>, ServerError> {
    let totals = state.engine.totals(&filter(query)).await?;
    Ok(Json(Statistic {
        transaction_count: totals.transaction_count,
        total_income_minor: totals.total_income.minor(),
        total_expense_minor: totals.total_expense.minor(),
        net_minor: totals.net.minor(),
    }))
}

pub async fn banks(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<BankStatistic>>, ServerError> {
    let rows = state.engine.bank_summaries(&filter(query)).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| BankStatistic {
                bank_id: row.bank_id,
                name: row.name,
                balance_minor: row.balance.minor(),
                transaction_count: row.transaction_count,
                credits_minor: row.credits.minor(),
                debits_minor: row.debits.minor(),
            })
            .collect(),
    ))
}

pub async fn categories(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<CategoryStatistic>>, ServerError> {
    let rows = state.engine.category_summaries(&filter(query)).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| CategoryStatistic {
                category_id: row.category_id,
                name: row.name,
                kind: map_kind(row.kind),
                calculate_method: map_method(row.calculate_method),
                transaction_count: row.transaction_count,
                total_minor: row.total.minor(),
            })
            .collect(),
    ))
}
