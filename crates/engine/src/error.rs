//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a category, bank or transaction id does not
//!   resolve.
//! - [`InsufficientFunds`] thrown when a bank balance would go negative.
//! - [`ReferentialConflict`] thrown when a delete is blocked by transactions
//!   still referencing the row.
//! - [`ExistingKey`] thrown when a name is already taken (case-insensitive).
//! - [`Validation`] thrown on malformed input.
//! - [`Conflict`] thrown when a concurrent writer changed a balance between
//!   read and write, or held the SQLite write lock. Nothing was applied and
//!   the call can be retried.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ReferentialConflict`]: EngineError::ReferentialConflict
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Validation`]: EngineError::Validation
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Referential conflict: {0}")]
    ReferentialConflict(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DbErr),
}

/// SQLite primary result codes for lock contention (`SQLITE_BUSY`,
/// `SQLITE_LOCKED`). Extended codes keep the primary code in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Whether `err` is another connection holding the SQLite write lock.
///
/// The failed statement changed nothing, so the scope can be retried.
fn is_lock_contention(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return false,
    };
    let RuntimeErr::SqlxError(sqlx_err) = runtime else {
        return false;
    };
    let Some(db_err) = sqlx_err.as_database_error() else {
        return false;
    };
    match db_err.code().and_then(|code| code.parse::<i32>().ok()) {
        Some(code) => matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED),
        None => {
            let message = db_err.message();
            message.contains("database is locked") || message.contains("table is locked")
        }
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            tracing::warn!(error = %err, "database locked by a concurrent writer");
            return Self::Conflict(format!("database busy: {err}"));
        }
        Self::Database(err)
    }
}

impl EngineError {
    /// Maps a failed insert/update of a named row, turning a unique index
    /// hit into [`EngineError::ExistingKey`].
    pub(crate) fn from_named_write(err: DbErr, name: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::ExistingKey(name.to_string()),
            _ => Self::from(err),
        }
    }

    /// Returns `true` when the same call may succeed if repeated unchanged.
    ///
    /// Every error leaves the store untouched; this only tells whether the
    /// caller has to change something before retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ReferentialConflict(a), Self::ReferentialConflict(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
