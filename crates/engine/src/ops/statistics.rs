use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{ConnectionTrait, QueryResult, Statement, Value};

use crate::{CalculateMethod, CategoryKind, EngineError, Money, ResultEngine, util::parse_uuid};

use super::Engine;

/// Restricts the transactions aggregated by the statistics queries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`).
#[derive(Clone, Debug, Default)]
pub struct StatsFilter {
    pub bank_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl StatsFilter {
    fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from >= to
        {
            return Err(EngineError::Validation(
                "invalid range: from must be < to".to_string(),
            ));
        }
        Ok(())
    }

    /// SQL conditions on the `t` alias, each prefixed with ` AND `.
    fn conditions(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(bank_id) = self.bank_id {
            sql.push_str(" AND t.bank_id = ?");
            values.push(bank_id.to_string().into());
        }
        if let Some(from) = self.from {
            sql.push_str(" AND t.date >= ?");
            values.push(from.into());
        }
        if let Some(to) = self.to {
            sql.push_str(" AND t.date < ?");
            values.push(to.into());
        }
        (sql, values)
    }
}

/// Income and expense totals over a set of transactions.
///
/// `net` is `total_income - total_expense`, classified by category type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub transaction_count: u64,
    pub total_income: Money,
    pub total_expense: Money,
    pub net: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSummary {
    pub bank_id: Uuid,
    pub name: String,
    pub balance: Money,
    pub transaction_count: u64,
    /// Sum of amounts posted under `add` categories.
    pub credits: Money,
    /// Sum of amounts posted under `subtract` categories.
    pub debits: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    pub calculate_method: CalculateMethod,
    pub transaction_count: u64,
    pub total: Money,
}

fn get_i64(row: &QueryResult, column: &str) -> ResultEngine<i64> {
    Ok(row.try_get::<i64>("", column)?)
}

fn get_count(row: &QueryResult, column: &str) -> ResultEngine<u64> {
    u64::try_from(get_i64(row, column)?)
        .map_err(|_| EngineError::Validation(format!("negative {column}")))
}

impl Engine {
    /// Totals over all transactions matching `filter`.
    pub async fn totals(&self, filter: &StatsFilter) -> ResultEngine<Totals> {
        filter.validate()?;
        let backend = self.database.get_database_backend();
        let (cond, values) = filter.conditions();

        let stmt = Statement::from_sql_and_values(
            backend,
            format!(
                "SELECT COUNT(t.id) AS count, \
                 COALESCE(SUM(CASE WHEN c.kind = 'income' THEN t.amount_minor ELSE 0 END), 0) AS income, \
                 COALESCE(SUM(CASE WHEN c.kind = 'expense' THEN t.amount_minor ELSE 0 END), 0) AS expense \
                 FROM transactions t \
                 INNER JOIN categories c ON c.id = t.category_id \
                 WHERE 1 = 1{cond}"
            ),
            values,
        );
        let Some(row) = self.database.query_one(stmt).await? else {
            return Ok(Totals {
                transaction_count: 0,
                total_income: Money::ZERO,
                total_expense: Money::ZERO,
                net: Money::ZERO,
            });
        };

        let total_income = Money::new(get_i64(&row, "income")?);
        let total_expense = Money::new(get_i64(&row, "expense")?);
        let net = total_income
            .checked_sub(total_expense)
            .ok_or_else(|| EngineError::Validation("net overflow".to_string()))?;
        Ok(Totals {
            transaction_count: get_count(&row, "count")?,
            total_income,
            total_expense,
            net,
        })
    }

    /// One row per bank, ordered by name, with its stored balance and the
    /// credits and debits matching `filter`.
    pub async fn bank_summaries(&self, filter: &StatsFilter) -> ResultEngine<Vec<BankSummary>> {
        filter.validate()?;
        let backend = self.database.get_database_backend();
        let (cond, values) = filter.conditions();

        let stmt = Statement::from_sql_and_values(
            backend,
            format!(
                "SELECT b.id AS bank_id, b.name AS name, b.balance_minor AS balance, \
                 COUNT(t.id) AS count, \
                 COALESCE(SUM(CASE WHEN c.calculate_method = 'add' THEN t.amount_minor ELSE 0 END), 0) AS credits, \
                 COALESCE(SUM(CASE WHEN c.calculate_method = 'subtract' THEN t.amount_minor ELSE 0 END), 0) AS debits \
                 FROM banks b \
                 LEFT JOIN transactions t ON t.bank_id = b.id{cond} \
                 LEFT JOIN categories c ON c.id = t.category_id \
                 GROUP BY b.id, b.name, b.name_norm, b.balance_minor \
                 ORDER BY b.name_norm"
            ),
            values,
        );

        let rows = self.database.query_all(stmt).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let bank_id: String = row.try_get("", "bank_id")?;
            let summary = BankSummary {
                bank_id: parse_uuid(&bank_id, "bank")?,
                name: row.try_get("", "name")?,
                balance: Money::new(get_i64(&row, "balance")?),
                transaction_count: get_count(&row, "count")?,
                credits: Money::new(get_i64(&row, "credits")?),
                debits: Money::new(get_i64(&row, "debits")?),
            };
            if filter.bank_id.is_some_and(|id| id != summary.bank_id) {
                continue;
            }
            out.push(summary);
        }
        Ok(out)
    }

    /// One row per category, ordered by name, with the totals matching
    /// `filter`.
    pub async fn category_summaries(
        &self,
        filter: &StatsFilter,
    ) -> ResultEngine<Vec<CategorySummary>> {
        filter.validate()?;
        let backend = self.database.get_database_backend();
        let (cond, values) = filter.conditions();

        let stmt = Statement::from_sql_and_values(
            backend,
            format!(
                "SELECT c.id AS category_id, c.name AS name, c.kind AS kind, \
                 c.calculate_method AS calculate_method, \
                 COUNT(t.id) AS count, COALESCE(SUM(t.amount_minor), 0) AS total \
                 FROM categories c \
                 LEFT JOIN transactions t ON t.category_id = c.id{cond} \
                 GROUP BY c.id, c.name, c.name_norm, c.kind, c.calculate_method \
                 ORDER BY c.name_norm"
            ),
            values,
        );

        let rows = self.database.query_all(stmt).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let category_id: String = row.try_get("", "category_id")?;
            let kind: String = row.try_get("", "kind")?;
            let method: String = row.try_get("", "calculate_method")?;
            out.push(CategorySummary {
                category_id: parse_uuid(&category_id, "category")?,
                name: row.try_get("", "name")?,
                kind: CategoryKind::try_from(kind.as_str())?,
                calculate_method: CalculateMethod::try_from(method.as_str())?,
                transaction_count: get_count(&row, "count")?,
                total: Money::new(get_i64(&row, "total")?),
            });
        }
        Ok(out)
    }
}
