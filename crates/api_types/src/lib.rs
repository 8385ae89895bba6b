//! Wire types shared by the HTTP server and its clients.
//!
//! Amounts travel as integer minor units (`amount_minor`, two implied
//! decimals). Dates are `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Income,
        Expense,
    }

    /// Whether amounts posted under a category are added to or subtracted
    /// from the bank balance.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CalculateMethod {
        Add,
        Subtract,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub kind: CategoryKind,
        pub calculate_method: CalculateMethod,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub kind: Option<CategoryKind>,
        pub calculate_method: Option<CalculateMethod>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: CategoryKind,
        pub calculate_method: CalculateMethod,
        pub created_at: DateTime<Utc>,
    }
}

pub mod bank {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankNew {
        pub name: String,
        #[serde(default)]
        pub initial_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankView {
        pub id: Uuid,
        pub name: String,
        pub initial_balance_minor: i64,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transaction_type {
    use super::*;

    /// Income or expense sub-classification.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionTypeNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionTypeView {
        pub id: Uuid,
        pub name: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub bank_id: Uuid,
        pub category_id: Uuid,
        pub income_type_id: Option<Uuid>,
        pub expense_type_id: Option<Uuid>,
        pub date: NaiveDate,
        /// Positive amount; the category decides the sign.
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    /// Partial update. Missing fields keep their stored value.
    ///
    /// An empty `note` clears it; `clear_income_type` / `clear_expense_type`
    /// drop the sub-classification.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount_minor: Option<i64>,
        pub bank_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub income_type_id: Option<Uuid>,
        pub expense_type_id: Option<Uuid>,
        #[serde(default)]
        pub clear_income_type: bool,
        #[serde(default)]
        pub clear_expense_type: bool,
        pub date: Option<NaiveDate>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub bank_id: Uuid,
        pub category_id: Uuid,
        pub income_type_id: Option<Uuid>,
        pub expense_type_id: Option<Uuid>,
        pub date: NaiveDate,
        pub amount_minor: i64,
        pub note: Option<String>,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query string of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub bank_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        /// Inclusive lower bound.
        pub from: Option<NaiveDate>,
        /// Exclusive upper bound.
        pub to: Option<NaiveDate>,
        pub limit: Option<u64>,
        /// Opaque cursor returned by the previous page.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub next_cursor: Option<String>,
    }
}

pub mod stats {
    use super::*;
    use crate::category::{CalculateMethod, CategoryKind};

    /// Query string of the `/stats` endpoints. `[from, to)`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatsQuery {
        pub bank_id: Option<Uuid>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistic {
        pub transaction_count: u64,
        pub total_income_minor: i64,
        pub total_expense_minor: i64,
        pub net_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankStatistic {
        pub bank_id: Uuid,
        pub name: String,
        pub balance_minor: i64,
        pub transaction_count: u64,
        pub credits_minor: i64,
        pub debits_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryStatistic {
        pub category_id: Uuid,
        pub name: String,
        pub kind: CategoryKind,
        pub calculate_method: CalculateMethod,
        pub transaction_count: u64,
        pub total_minor: i64,
    }
}
