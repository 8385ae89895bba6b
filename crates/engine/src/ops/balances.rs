use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*};

use crate::{
    CalculateMethod, EngineError, Money, ResultEngine, banks, categories, signed_delta,
    transactions, util::parse_uuid,
};

use super::{Engine, with_tx};

/// A bank whose stored balance disagrees with its transaction history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub bank_id: Uuid,
    pub name: String,
    pub stored: Money,
    pub expected: Money,
}

struct Replay {
    bank: banks::Model,
    expected: Money,
}

/// Folds every transaction into its bank, starting from the initial balance.
async fn replay<C: ConnectionTrait>(db: &C) -> ResultEngine<Vec<Replay>> {
    let mut by_id: HashMap<String, Replay> = HashMap::new();
    for bank in banks::Entity::find().all(db).await? {
        by_id.insert(
            bank.id.clone(),
            Replay {
                expected: Money::new(bank.initial_balance_minor),
                bank,
            },
        );
    }

    let mut methods: HashMap<String, CalculateMethod> = HashMap::new();
    for category in categories::Entity::find().all(db).await? {
        methods.insert(category.id.clone(), category.method()?);
    }

    for row in transactions::Entity::find().all(db).await? {
        let method = methods
            .get(&row.category_id)
            .copied()
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        let entry = by_id
            .get_mut(&row.bank_id)
            .ok_or_else(|| EngineError::KeyNotFound("bank not exists".to_string()))?;
        entry.expected = entry
            .expected
            .checked_add(signed_delta(Money::new(row.amount_minor), method))
            .ok_or_else(|| {
                EngineError::Validation(format!("balance overflow on bank {}", entry.bank.name))
            })?;
    }

    let mut out: Vec<Replay> = by_id.into_values().collect();
    out.sort_by(|a, b| a.bank.name_norm.cmp(&b.bank.name_norm));
    Ok(out)
}

fn drift(replay: &Replay) -> ResultEngine<Option<BalanceDrift>> {
    if replay.bank.balance_minor == replay.expected.minor() {
        return Ok(None);
    }
    Ok(Some(BalanceDrift {
        bank_id: parse_uuid(&replay.bank.id, "bank")?,
        name: replay.bank.name.clone(),
        stored: Money::new(replay.bank.balance_minor),
        expected: replay.expected,
    }))
}

impl Engine {
    /// Lists the banks whose stored balance differs from
    /// `initial_balance + Σ signed amounts`. Read-only.
    pub async fn verify_balances(&self) -> ResultEngine<Vec<BalanceDrift>> {
        let replays = replay(&self.database).await?;
        let mut drifts = Vec::new();
        for replay in &replays {
            if let Some(drift) = drift(replay)? {
                drifts.push(drift);
            }
        }
        Ok(drifts)
    }

    /// Recomputes denormalized bank balances from the transaction history and
    /// returns the banks that were corrected.
    ///
    /// Either every drifted bank is fixed or none is.
    pub async fn recompute_balances(&self) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            let replays = replay(&db_tx).await?;
            let mut fixed = Vec::new();
            for replay in &replays {
                let Some(drift) = drift(replay)? else {
                    continue;
                };
                if drift.expected.is_negative() {
                    return Err(EngineError::InsufficientFunds(format!(
                        "bank {} would be recomputed to {}",
                        drift.name, drift.expected
                    )));
                }
                self.write_balance(&db_tx, &replay.bank, drift.expected)
                    .await?;
                tracing::warn!(
                    bank = %drift.name,
                    stored = %drift.stored,
                    expected = %drift.expected,
                    "bank balance corrected"
                );
                fixed.push(drift);
            }
            Ok(fixed)
        })
    }
}
