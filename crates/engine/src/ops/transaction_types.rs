use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, ResultEngine, TransactionType, TransactionTypeKind, expense_types, income_types,
    transactions,
    util::{name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Checks that the optional sub-classifications of a transaction exist.
    pub(super) async fn require_transaction_types(
        &self,
        db_tx: &DatabaseTransaction,
        income_type_id: Option<Uuid>,
        expense_type_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        if let Some(id) = income_type_id {
            income_types::Entity::find_by_id(id.to_string())
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("income type not exists".to_string()))?;
        }
        if let Some(id) = expense_type_id {
            expense_types::Entity::find_by_id(id.to_string())
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense type not exists".to_string()))?;
        }
        Ok(())
    }

    pub async fn create_transaction_type(
        &self,
        kind: TransactionTypeKind,
        name: &str,
    ) -> ResultEngine<TransactionType> {
        let name = normalize_required_name(name, kind.as_str())?;
        let key = name_key(&name);
        let id = Uuid::new_v4().to_string();
        with_tx!(self, |db_tx| {
            let created = match kind {
                TransactionTypeKind::Income => {
                    let exists = income_types::Entity::find()
                        .filter(income_types::Column::NameNorm.eq(key.clone()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if exists {
                        return Err(EngineError::ExistingKey(name));
                    }
                    income_types::ActiveModel {
                        id: ActiveValue::Set(id),
                        name: ActiveValue::Set(name.clone()),
                        name_norm: ActiveValue::Set(key),
                    }
                    .insert(&db_tx)
                    .await
                    .map_err(|err| EngineError::from_named_write(err, &name))
                    .and_then(TransactionType::try_from)?
                }
                TransactionTypeKind::Expense => {
                    let exists = expense_types::Entity::find()
                        .filter(expense_types::Column::NameNorm.eq(key.clone()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if exists {
                        return Err(EngineError::ExistingKey(name));
                    }
                    expense_types::ActiveModel {
                        id: ActiveValue::Set(id),
                        name: ActiveValue::Set(name.clone()),
                        name_norm: ActiveValue::Set(key),
                    }
                    .insert(&db_tx)
                    .await
                    .map_err(|err| EngineError::from_named_write(err, &name))
                    .and_then(TransactionType::try_from)?
                }
            };
            tracing::info!(kind = kind.as_str(), name = %name, "transaction type created");
            Ok(created)
        })
    }

    pub async fn transaction_types(
        &self,
        kind: TransactionTypeKind,
    ) -> ResultEngine<Vec<TransactionType>> {
        match kind {
            TransactionTypeKind::Income => income_types::Entity::find()
                .order_by_asc(income_types::Column::NameNorm)
                .all(&self.database)
                .await?
                .into_iter()
                .map(TransactionType::try_from)
                .collect(),
            TransactionTypeKind::Expense => expense_types::Entity::find()
                .order_by_asc(expense_types::Column::NameNorm)
                .all(&self.database)
                .await?
                .into_iter()
                .map(TransactionType::try_from)
                .collect(),
        }
    }

    pub async fn transaction_type(
        &self,
        kind: TransactionTypeKind,
        type_id: Uuid,
    ) -> ResultEngine<TransactionType> {
        let id = type_id.to_string();
        let not_found = || EngineError::KeyNotFound(format!("{} not exists", kind.as_str()));
        match kind {
            TransactionTypeKind::Income => income_types::Entity::find_by_id(id)
                .one(&self.database)
                .await?
                .ok_or_else(not_found)
                .and_then(TransactionType::try_from),
            TransactionTypeKind::Expense => expense_types::Entity::find_by_id(id)
                .one(&self.database)
                .await?
                .ok_or_else(not_found)
                .and_then(TransactionType::try_from),
        }
    }

    pub async fn rename_transaction_type(
        &self,
        kind: TransactionTypeKind,
        type_id: Uuid,
        new_name: &str,
    ) -> ResultEngine<TransactionType> {
        let name = normalize_required_name(new_name, kind.as_str())?;
        let key = name_key(&name);
        let id = type_id.to_string();
        let not_found = || EngineError::KeyNotFound(format!("{} not exists", kind.as_str()));
        with_tx!(self, |db_tx| {
            let renamed = match kind {
                TransactionTypeKind::Income => {
                    let model = income_types::Entity::find_by_id(id.clone())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(not_found)?;
                    let taken = income_types::Entity::find()
                        .filter(income_types::Column::NameNorm.eq(key.clone()))
                        .filter(income_types::Column::Id.ne(id.clone()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if taken {
                        return Err(EngineError::ExistingKey(name));
                    }
                    let mut active: income_types::ActiveModel = model.into();
                    active.name = ActiveValue::Set(name.clone());
                    active.name_norm = ActiveValue::Set(key);
                    let model = active
                        .update(&db_tx)
                        .await
                        .map_err(|err| EngineError::from_named_write(err, &name))?;
                    TransactionType::try_from(model)?
                }
                TransactionTypeKind::Expense => {
                    let model = expense_types::Entity::find_by_id(id.clone())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(not_found)?;
                    let taken = expense_types::Entity::find()
                        .filter(expense_types::Column::NameNorm.eq(key.clone()))
                        .filter(expense_types::Column::Id.ne(id.clone()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if taken {
                        return Err(EngineError::ExistingKey(name));
                    }
                    let mut active: expense_types::ActiveModel = model.into();
                    active.name = ActiveValue::Set(name.clone());
                    active.name_norm = ActiveValue::Set(key);
                    let model = active
                        .update(&db_tx)
                        .await
                        .map_err(|err| EngineError::from_named_write(err, &name))?;
                    TransactionType::try_from(model)?
                }
            };
            tracing::info!(kind = kind.as_str(), name = %name, "transaction type renamed");
            Ok(renamed)
        })
    }

    /// Deletes a type no transaction is tagged with.
    pub async fn delete_transaction_type(
        &self,
        kind: TransactionTypeKind,
        type_id: Uuid,
    ) -> ResultEngine<()> {
        let not_found = || EngineError::KeyNotFound(format!("{} not exists", kind.as_str()));
        with_tx!(self, |db_tx| {
            let id = type_id.to_string();
            let (name, used) = match kind {
                TransactionTypeKind::Income => {
                    let model = income_types::Entity::find_by_id(id.clone())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(not_found)?;
                    let used = transactions::Entity::find()
                        .filter(transactions::Column::IncomeTypeId.eq(id.clone()))
                        .count(&db_tx)
                        .await?;
                    (model.name, used)
                }
                TransactionTypeKind::Expense => {
                    let model = expense_types::Entity::find_by_id(id.clone())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(not_found)?;
                    let used = transactions::Entity::find()
                        .filter(transactions::Column::ExpenseTypeId.eq(id.clone()))
                        .count(&db_tx)
                        .await?;
                    (model.name, used)
                }
            };
            if used > 0 {
                return Err(EngineError::ReferentialConflict(format!(
                    "{} {name} is used by {used} transactions",
                    kind.as_str()
                )));
            }

            match kind {
                TransactionTypeKind::Income => {
                    income_types::Entity::delete_by_id(id).exec(&db_tx).await?;
                }
                TransactionTypeKind::Expense => {
                    expense_types::Entity::delete_by_id(id).exec(&db_tx).await?;
                }
            }
            tracing::info!(kind = kind.as_str(), name = %name, "transaction type deleted");
            Ok(())
        })
    }
}
