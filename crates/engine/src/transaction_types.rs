//! Income and expense types.
//!
//! Optional sub-classification a transaction can carry next to its category
//! (e.g. "Tuition" under an income category). They never affect balances.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, expense_types, income_types, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionTypeKind {
    Income,
    Expense,
}

impl TransactionTypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income type",
            Self::Expense => "expense type",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionType {
    pub id: Uuid,
    pub kind: TransactionTypeKind,
    pub name: String,
}

impl TryFrom<income_types::Model> for TransactionType {
    type Error = EngineError;

    fn try_from(model: income_types::Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "income type")?,
            kind: TransactionTypeKind::Income,
            name: model.name,
        })
    }
}

impl TryFrom<expense_types::Model> for TransactionType {
    type Error = EngineError;

    fn try_from(model: expense_types::Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense type")?,
            kind: TransactionTypeKind::Expense,
            name: model.name,
        })
    }
}
