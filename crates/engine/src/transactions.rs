//! Transaction primitives.
//!
//! A `Transaction` posts a positive `amount` to one bank under one category.
//! The stored amount is never signed: the balance effect is derived from the
//! category's [`CalculateMethod`](crate::CalculateMethod) each time it is
//! applied or reversed.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub bank_id: Uuid,
    pub category_id: Uuid,
    pub income_type_id: Option<Uuid>,
    pub expense_type_id: Option<Uuid>,
    pub date: NaiveDate,
    pub amount: Money,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bank_id: String,
    pub category_id: String,
    pub income_type_id: Option<String>,
    pub expense_type_id: Option<String>,
    pub date: Date,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankId",
        to = "super::banks::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Banks,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::income_types::Entity",
        from = "Column::IncomeTypeId",
        to = "super::income_types::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    IncomeTypes,
    #[sea_orm(
        belongs_to = "super::expense_types::Entity",
        from = "Column::ExpenseTypeId",
        to = "super::expense_types::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    ExpenseTypes,
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banks.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::income_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomeTypes.def()
    }
}

impl Related<super::expense_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            bank_id: ActiveValue::Set(tx.bank_id.to_string()),
            category_id: ActiveValue::Set(tx.category_id.to_string()),
            income_type_id: ActiveValue::Set(tx.income_type_id.map(|id| id.to_string())),
            expense_type_id: ActiveValue::Set(tx.expense_type_id.map(|id| id.to_string())),
            date: ActiveValue::Set(tx.date),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            note: ActiveValue::Set(tx.note.clone()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            bank_id: parse_uuid(&model.bank_id, "bank")?,
            category_id: parse_uuid(&model.category_id, "category")?,
            income_type_id: model
                .income_type_id
                .as_deref()
                .map(|id| parse_uuid(id, "income type"))
                .transpose()?,
            expense_type_id: model
                .expense_type_id
                .as_deref()
                .map(|id| parse_uuid(id, "expense type"))
                .transpose()?,
            date: model.date,
            amount: Money::new(model.amount_minor),
            note: model.note,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
