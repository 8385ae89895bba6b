use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Bank, EngineError, Money, ResultEngine, banks, transactions,
    util::{name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_bank(
        &self,
        db_tx: &DatabaseTransaction,
        bank_id: Uuid,
    ) -> ResultEngine<banks::Model> {
        banks::Entity::find_by_id(bank_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bank not exists".to_string()))
    }

    /// Stores `new_balance` on `bank` iff its balance is still the one read
    /// into `bank`.
    ///
    /// A concurrent writer that committed in between makes the guard miss and
    /// the whole operation fails with [`EngineError::Conflict`].
    pub(super) async fn write_balance(
        &self,
        db_tx: &DatabaseTransaction,
        bank: &banks::Model,
        new_balance: Money,
    ) -> ResultEngine<()> {
        let res = banks::Entity::update_many()
            .col_expr(banks::Column::BalanceMinor, Expr::value(new_balance.minor()))
            .filter(banks::Column::Id.eq(bank.id.clone()))
            .filter(banks::Column::BalanceMinor.eq(bank.balance_minor))
            .exec(db_tx)
            .await?;
        if res.rows_affected == 0 {
            tracing::warn!(bank = %bank.name, "balance changed concurrently");
            return Err(EngineError::Conflict(format!(
                "balance of bank {} changed concurrently",
                bank.name
            )));
        }
        tracing::info!(bank = %bank.name, balance = %new_balance, "balance written");
        Ok(())
    }

    async fn ensure_bank_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = banks::Entity::find().filter(banks::Column::NameNorm.eq(name_key(name)));
        if let Some(id) = except {
            query = query.filter(banks::Column::Id.ne(id.to_string()));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Opens a bank account holding `initial_balance`.
    pub async fn create_bank(&self, name: &str, initial_balance: Money) -> ResultEngine<Bank> {
        let name = normalize_required_name(name, "bank")?;
        if initial_balance.is_negative() {
            return Err(EngineError::Validation(
                "initial balance must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.ensure_bank_name_free(&db_tx, &name, None).await?;

            let model = banks::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                name_norm: ActiveValue::Set(name_key(&name)),
                name: ActiveValue::Set(name.clone()),
                initial_balance_minor: ActiveValue::Set(initial_balance.minor()),
                balance_minor: ActiveValue::Set(initial_balance.minor()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| EngineError::from_named_write(err, &name))?;

            tracing::info!(bank = %name, balance = %initial_balance, "bank created");
            Bank::try_from(model)
        })
    }

    /// Return a bank snapshot from DB.
    pub async fn bank(&self, bank_id: Uuid) -> ResultEngine<Bank> {
        let model = banks::Entity::find_by_id(bank_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bank not exists".to_string()))?;
        Bank::try_from(model)
    }

    pub async fn banks(&self) -> ResultEngine<Vec<Bank>> {
        banks::Entity::find()
            .order_by_asc(banks::Column::NameNorm)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Bank::try_from)
            .collect()
    }

    /// Renames an existing bank. The balance is never touched.
    pub async fn rename_bank(&self, bank_id: Uuid, new_name: &str) -> ResultEngine<Bank> {
        let new_name = normalize_required_name(new_name, "bank")?;
        with_tx!(self, |db_tx| {
            self.require_bank(&db_tx, bank_id).await?;
            self.ensure_bank_name_free(&db_tx, &new_name, Some(bank_id))
                .await?;

            let active = banks::ActiveModel {
                id: ActiveValue::Set(bank_id.to_string()),
                name_norm: ActiveValue::Set(name_key(&new_name)),
                name: ActiveValue::Set(new_name.clone()),
                ..Default::default()
            };
            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_named_write(err, &new_name))?;
            Bank::try_from(model)
        })
    }

    /// Deletes a bank with no transactions posted to it.
    pub async fn delete_bank(&self, bank_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_bank(&db_tx, bank_id).await?;
            let used = transactions::Entity::find()
                .filter(transactions::Column::BankId.eq(bank_id.to_string()))
                .count(&db_tx)
                .await?;
            if used > 0 {
                return Err(EngineError::ReferentialConflict(format!(
                    "bank {} has {used} transactions",
                    current.name
                )));
            }

            banks::Entity::delete_by_id(current.id).exec(&db_tx).await?;
            tracing::info!(bank = %current.name, "bank deleted");
            Ok(())
        })
    }
}
