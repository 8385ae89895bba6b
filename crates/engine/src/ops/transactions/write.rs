use chrono::Utc;
use uuid::Uuid;

use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    CreateTransactionCmd, EngineError, Money, ResultEngine, Transaction, UpdateTransactionCmd,
    apply_delta,
    ledger::ensure_positive_amount,
    signed_delta, transactions,
    util::{normalize_optional_text, parse_uuid},
};

use super::super::{Engine, with_tx};

fn normalize_actor(actor_id: &str) -> ResultEngine<String> {
    let actor = actor_id.trim();
    if actor.is_empty() {
        return Err(EngineError::Validation(
            "actor id must not be empty".to_string(),
        ));
    }
    Ok(actor.to_string())
}

/// Outcome of a rejected write, for the log line.
fn log_rejected(op: &str, err: &EngineError) {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!(op, error = %db_err, "ledger write failed");
        }
        other => tracing::warn!(op, error = %other, "ledger write rejected"),
    }
}

impl Engine {
    /// Posts a new transaction and applies its signed amount to the bank.
    ///
    /// The row insert and the balance write commit together or not at all.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        ensure_positive_amount(cmd.amount)?;
        let actor_id = normalize_actor(&cmd.actor_id)?;
        let result = with_tx!(self, |db_tx| {
            self.post_transaction(&db_tx, &cmd, &actor_id).await
        });
        match &result {
            Ok(tx) => tracing::info!(
                transaction = %tx.id,
                bank = %tx.bank_id,
                amount = %tx.amount,
                actor = %actor_id,
                "transaction created"
            ),
            Err(err) => log_rejected("create_transaction", err),
        }
        result
    }

    async fn post_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &CreateTransactionCmd,
        actor_id: &str,
    ) -> ResultEngine<Transaction> {
        let category = self.require_category(db_tx, cmd.category_id).await?;
        let bank = self.require_bank(db_tx, cmd.bank_id).await?;
        self.require_transaction_types(db_tx, cmd.income_type_id, cmd.expense_type_id)
            .await?;

        let delta = signed_delta(cmd.amount, category.method()?);
        let new_balance = apply_delta(Money::new(bank.balance_minor), delta, &bank.name)?;

        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            bank_id: cmd.bank_id,
            category_id: cmd.category_id,
            income_type_id: cmd.income_type_id,
            expense_type_id: cmd.expense_type_id,
            date: cmd.date,
            amount: cmd.amount,
            note: normalize_optional_text(cmd.note.as_deref()),
            created_by: actor_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        transactions::ActiveModel::from(&tx).insert(db_tx).await?;
        self.write_balance(db_tx, &bank, new_balance).await?;
        Ok(tx)
    }

    /// Patches a transaction, moving its balance effect if needed.
    ///
    /// The stored effect is reversed from the persisted amount and category,
    /// never from the patch. When the bank changes, the original bank gets the
    /// reversal and the destination bank gets the new delta; both must stay
    /// non-negative.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        if let Some(amount) = cmd.amount {
            ensure_positive_amount(amount)?;
        }
        let actor_id = normalize_actor(&cmd.actor_id)?;
        let result = with_tx!(self, |db_tx| {
            self.repost_transaction(&db_tx, &cmd).await
        });
        match &result {
            Ok(tx) => tracing::info!(
                transaction = %tx.id,
                bank = %tx.bank_id,
                amount = %tx.amount,
                actor = %actor_id,
                "transaction updated"
            ),
            Err(err) => log_rejected("update_transaction", err),
        }
        result
    }

    async fn repost_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let stored = self.require_transaction(db_tx, cmd.transaction_id).await?;
        let stored_bank_id = parse_uuid(&stored.bank_id, "bank")?;
        let stored_category_id = parse_uuid(&stored.category_id, "category")?;

        let new_bank_id = cmd.bank_id.unwrap_or(stored_bank_id);
        let new_category_id = cmd.category_id.unwrap_or(stored_category_id);
        let new_amount = cmd.amount.unwrap_or(Money::new(stored.amount_minor));

        let income_type_id = match cmd.income_type_id {
            Some(patch) => patch,
            None => stored
                .income_type_id
                .as_deref()
                .map(|id| parse_uuid(id, "income type"))
                .transpose()?,
        };
        let expense_type_id = match cmd.expense_type_id {
            Some(patch) => patch,
            None => stored
                .expense_type_id
                .as_deref()
                .map(|id| parse_uuid(id, "expense type"))
                .transpose()?,
        };
        self.require_transaction_types(
            db_tx,
            cmd.income_type_id.flatten(),
            cmd.expense_type_id.flatten(),
        )
        .await?;

        if cmd.touches_balance() {
            let old_category = self.require_category(db_tx, stored_category_id).await?;
            let new_category = if new_category_id == stored_category_id {
                old_category.clone()
            } else {
                self.require_category(db_tx, new_category_id).await?
            };
            // Both banks are read before any balance is written.
            let old_bank = self.require_bank(db_tx, stored_bank_id).await?;
            let new_bank = if new_bank_id == stored_bank_id {
                None
            } else {
                Some(self.require_bank(db_tx, new_bank_id).await?)
            };

            let old_delta =
                signed_delta(Money::new(stored.amount_minor), old_category.method()?);
            let new_delta = signed_delta(new_amount, new_category.method()?);

            match new_bank {
                None => {
                    let net = new_delta.checked_sub(old_delta).ok_or_else(|| {
                        EngineError::Validation(format!(
                            "balance overflow on bank {}",
                            old_bank.name
                        ))
                    })?;
                    let balance =
                        apply_delta(Money::new(old_bank.balance_minor), net, &old_bank.name)?;
                    self.write_balance(db_tx, &old_bank, balance).await?;
                }
                Some(new_bank) => {
                    let reversed = apply_delta(
                        Money::new(old_bank.balance_minor),
                        -old_delta,
                        &old_bank.name,
                    )?;
                    let applied = apply_delta(
                        Money::new(new_bank.balance_minor),
                        new_delta,
                        &new_bank.name,
                    )?;
                    self.write_balance(db_tx, &old_bank, reversed).await?;
                    self.write_balance(db_tx, &new_bank, applied).await?;
                }
            }
        }

        let note = match cmd.note.as_deref() {
            Some(note) => normalize_optional_text(Some(note)),
            None => stored.note.clone(),
        };

        let mut active: transactions::ActiveModel = stored.into();
        active.bank_id = ActiveValue::Set(new_bank_id.to_string());
        active.category_id = ActiveValue::Set(new_category_id.to_string());
        active.amount_minor = ActiveValue::Set(new_amount.minor());
        active.income_type_id = ActiveValue::Set(income_type_id.map(|id| id.to_string()));
        active.expense_type_id = ActiveValue::Set(expense_type_id.map(|id| id.to_string()));
        if let Some(date) = cmd.date {
            active.date = ActiveValue::Set(date);
        }
        active.note = ActiveValue::Set(note);
        active.updated_at = ActiveValue::Set(Utc::now());

        let model = active.update(db_tx).await?;
        Transaction::try_from(model)
    }

    /// Deletes a transaction and reverses its effect on the bank.
    ///
    /// Reversing a credit can leave too little on the bank; the delete is
    /// then rejected with [`EngineError::InsufficientFunds`].
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        actor_id: &str,
    ) -> ResultEngine<()> {
        let actor_id = normalize_actor(actor_id)?;
        let result = with_tx!(self, |db_tx| {
            self.unpost_transaction(&db_tx, transaction_id).await
        });
        match &result {
            Ok(()) => tracing::info!(
                transaction = %transaction_id,
                actor = %actor_id,
                "transaction deleted"
            ),
            Err(err) => log_rejected("delete_transaction", err),
        }
        result
    }

    async fn unpost_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let stored = self.require_transaction(db_tx, transaction_id).await?;
        let category = self
            .require_category(db_tx, parse_uuid(&stored.category_id, "category")?)
            .await?;
        let bank = self
            .require_bank(db_tx, parse_uuid(&stored.bank_id, "bank")?)
            .await?;

        let delta = signed_delta(Money::new(stored.amount_minor), category.method()?);
        let balance = apply_delta(Money::new(bank.balance_minor), -delta, &bank.name)?;

        transactions::Entity::delete_by_id(stored.id)
            .exec(db_tx)
            .await?;
        self.write_balance(db_tx, &bank, balance).await?;
        Ok(())
    }
}
