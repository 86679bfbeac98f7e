use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Category, EngineError, ResultEngine, budget_allocations, categories, transactions};

use super::{Engine, ensure_user_id, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Return a category snapshot from DB.
    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;
            let category = Category::try_from(model)?;
            Ok(category)
        })
    }

    /// Return every category of a user, ordered by title.
    pub async fn categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let models: Vec<categories::Model> = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(categories::Column::Title)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Category::try_from(model)?);
            }
            Ok(out)
        })
    }

    /// Add a new category for a user.
    ///
    /// Titles are unique per user with an exact, case-sensitive match. There
    /// is no normalization or aliasing: "Food" and "food" are distinct.
    pub async fn create_category(
        &self,
        user_id: &str,
        title: &str,
        icon: Option<&str>,
    ) -> ResultEngine<Category> {
        ensure_user_id(user_id)?;
        let title = normalize_required_name(title, "category")?;
        let icon = normalize_optional_text(icon);
        with_tx!(self, |db_tx| {
            let exists = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .filter(categories::Column::Title.eq(title.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(title));
            }

            let category = Category::new(user_id.to_string(), title, icon);
            let category_model: categories::ActiveModel = (&category).into();
            category_model.insert(&db_tx).await?;

            Ok(category)
        })
    }

    /// Patches category fields; unset arguments keep their stored value.
    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        title: Option<&str>,
        icon: Option<&str>,
    ) -> ResultEngine<Category> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;

            let new_title = match title {
                Some(raw) => {
                    let candidate = normalize_required_name(raw, "category")?;
                    let exists = categories::Entity::find()
                        .filter(categories::Column::UserId.eq(user_id.to_string()))
                        .filter(categories::Column::Title.eq(candidate.clone()))
                        .filter(categories::Column::Id.ne(category_id.to_string()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if exists {
                        return Err(EngineError::ExistingKey(candidate));
                    }
                    candidate
                }
                None => model.title,
            };
            let new_icon = match icon {
                Some(raw) => normalize_optional_text(Some(raw)),
                None => model.icon,
            };

            let active = categories::ActiveModel {
                id: ActiveValue::Set(category_id.to_string()),
                title: ActiveValue::Set(new_title),
                icon: ActiveValue::Set(new_icon),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            let category = Category::try_from(updated)?;
            Ok(category)
        })
    }

    /// Deletes a category that nothing references.
    ///
    /// Both transactions and budget allocations pin a category in place;
    /// remove or retarget them first.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;

            let referenced_by_tx = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if referenced_by_tx {
                return Err(EngineError::InUse(model.title));
            }

            let referenced_by_allocation = budget_allocations::Entity::find()
                .filter(budget_allocations::Column::CategoryId.eq(category_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if referenced_by_allocation {
                return Err(EngineError::InUse(model.title));
            }

            categories::Entity::delete_by_id(category_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
