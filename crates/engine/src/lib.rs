//! Ledger engine.
//!
//! Keeps every bank balance consistent with the transactions posted to it.
//! All writes go through [`Engine`], which runs each operation inside a
//! single database transaction.

pub use banks::Bank;
pub use categories::Category;
pub use commands::{CreateTransactionCmd, UpdateTransactionCmd};
pub use error::EngineError;
pub use ledger::{CalculateMethod, CategoryKind, apply_delta, signed_delta};
pub use money::Money;
pub use ops::{
    BalanceDrift, BankSummary, CategorySummary, Engine, EngineBuilder, StatsFilter, Totals,
    TransactionListFilter,
};
pub use transaction_types::{TransactionType, TransactionTypeKind};
pub use transactions::Transaction;

mod banks;
mod categories;
mod commands;
mod error;
mod expense_types;
mod income_types;
mod ledger;
mod money;
mod ops;
mod transaction_types;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
