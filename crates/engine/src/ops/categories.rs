use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    CalculateMethod, Category, CategoryKind, EngineError, ResultEngine, categories, transactions,
    util::{name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    async fn ensure_category_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query =
            categories::Entity::find().filter(categories::Column::NameNorm.eq(name_key(name)));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id.to_string()));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Registers a new category.
    ///
    /// Names are unique ignoring case and surrounding whitespace.
    pub async fn create_category(
        &self,
        name: &str,
        kind: CategoryKind,
        calculate_method: CalculateMethod,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.ensure_category_name_free(&db_tx, &name, None).await?;

            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                name_norm: ActiveValue::Set(name_key(&name)),
                name: ActiveValue::Set(name.clone()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                calculate_method: ActiveValue::Set(calculate_method.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| EngineError::from_named_write(err, &name))?;

            tracing::info!(category = %name, kind = kind.as_str(), "category created");
            Category::try_from(model)
        })
    }

    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// All categories, ordered by name.
    pub async fn categories(&self) -> ResultEngine<Vec<Category>> {
        categories::Entity::find()
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Renames a category or changes its kind.
    ///
    /// The calculate method is fixed once a transaction references the
    /// category: changing it would silently re-sign amounts already folded
    /// into bank balances.
    pub async fn update_category(
        &self,
        category_id: Uuid,
        name: Option<&str>,
        kind: Option<CategoryKind>,
        calculate_method: Option<CalculateMethod>,
    ) -> ResultEngine<Category> {
        let name = name
            .map(|name| normalize_required_name(name, "category"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let current = self.require_category(&db_tx, category_id).await?;

            let mut active: categories::ActiveModel = current.clone().into();
            let mut changed = false;
            if let Some(name) = &name {
                self.ensure_category_name_free(&db_tx, name, Some(category_id))
                    .await?;
                active.name = ActiveValue::Set(name.clone());
                active.name_norm = ActiveValue::Set(name_key(name));
                changed = true;
            }
            if let Some(kind) = kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
                changed = true;
            }
            if let Some(method) = calculate_method
                && method != current.method()?
            {
                let used = transactions::Entity::find()
                    .filter(transactions::Column::CategoryId.eq(category_id.to_string()))
                    .count(&db_tx)
                    .await?;
                if used > 0 {
                    return Err(EngineError::ReferentialConflict(format!(
                        "category {} is used by {used} transactions",
                        current.name
                    )));
                }
                active.calculate_method = ActiveValue::Set(method.as_str().to_string());
                changed = true;
            }
            if !changed {
                return Category::try_from(current);
            }

            let label = name.as_deref().unwrap_or(&current.name);
            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_named_write(err, label))?;
            Category::try_from(model)
        })
    }

    /// Deletes a category no transaction references.
    pub async fn delete_category(&self, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_category(&db_tx, category_id).await?;
            let used = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_id.to_string()))
                .count(&db_tx)
                .await?;
            if used > 0 {
                return Err(EngineError::ReferentialConflict(format!(
                    "category {} is used by {used} transactions",
                    current.name
                )));
            }

            categories::Entity::delete_by_id(current.id)
                .exec(&db_tx)
                .await?;
            tracing::info!(category = %current.name, "category deleted");
            Ok(())
        })
    }
}
