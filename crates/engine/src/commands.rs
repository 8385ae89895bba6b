//! Command structs for ledger write operations.
//!
//! These types group parameters for create/update, keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::Money;

/// Post a new transaction to a bank.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub bank_id: Uuid,
    pub category_id: Uuid,
    pub income_type_id: Option<Uuid>,
    pub expense_type_id: Option<Uuid>,
    pub date: NaiveDate,
    pub amount: Money,
    pub note: Option<String>,
    /// Acting user, recorded as `created_by`.
    pub actor_id: String,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        bank_id: Uuid,
        category_id: Uuid,
        amount: Money,
        date: NaiveDate,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            bank_id,
            category_id,
            income_type_id: None,
            expense_type_id: None,
            date,
            amount,
            note: None,
            actor_id: actor_id.into(),
        }
    }

    #[must_use]
    pub fn income_type_id(mut self, id: Uuid) -> Self {
        self.income_type_id = Some(id);
        self
    }

    #[must_use]
    pub fn expense_type_id(mut self, id: Uuid) -> Self {
        self.expense_type_id = Some(id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Patch an existing transaction.
///
/// `None` keeps the stored value. For `note`, an empty string clears it; for
/// the type ids, `Some(None)` clears them.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub actor_id: String,

    pub amount: Option<Money>,
    pub bank_id: Option<Uuid>,
    pub category_id: Option<Uuid>,

    pub income_type_id: Option<Option<Uuid>>,
    pub expense_type_id: Option<Option<Uuid>>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, actor_id: impl Into<String>) -> Self {
        Self {
            transaction_id,
            actor_id: actor_id.into(),
            amount: None,
            bank_id: None,
            category_id: None,
            income_type_id: None,
            expense_type_id: None,
            date: None,
            note: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn bank_id(mut self, bank_id: Uuid) -> Self {
        self.bank_id = Some(bank_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn income_type_id(mut self, id: Option<Uuid>) -> Self {
        self.income_type_id = Some(id);
        self
    }

    #[must_use]
    pub fn expense_type_id(mut self, id: Option<Uuid>) -> Self {
        self.expense_type_id = Some(id);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns `true` if the patch can change a bank balance.
    pub fn touches_balance(&self) -> bool {
        self.amount.is_some() || self.bank_id.is_some() || self.category_id.is_some()
    }
}
