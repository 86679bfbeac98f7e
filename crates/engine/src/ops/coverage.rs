use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, DatabaseTransaction, JoinType, QueryFilter, QuerySelect, prelude::*};

use crate::{EngineError, ResultEngine, budget_allocations, budgets};

use super::Engine;

impl Engine {
    /// Finds the allocation rows an expense at `at` in `category_id` falls
    /// under.
    ///
    /// A budget covers the expense when it is active, its window contains the
    /// instant (both ends inclusive) and it carries an allocation for the
    /// category. Every covering budget participates, so one expense can be
    /// tracked by several overlapping windows.
    pub(super) async fn covering_allocations(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
        at: DateTime<Utc>,
    ) -> ResultEngine<Vec<budget_allocations::Model>> {
        budget_allocations::Entity::find()
            .join(
                JoinType::InnerJoin,
                budget_allocations::Relation::Budgets.def(),
            )
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .filter(budgets::Column::IsActive.eq(true))
            .filter(budgets::Column::StartDate.lte(at))
            .filter(budgets::Column::EndDate.gte(at))
            .filter(budget_allocations::Column::CategoryId.eq(category_id.to_string()))
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Stages a spending change on every allocation covering the expense.
    ///
    /// The first touch of an allocation seeds its preview from the stored
    /// value; later touches accumulate, so an update that moves an expense
    /// within the same budget nets into a single write. Spending is never
    /// clamped at zero or at the limit.
    pub(super) async fn preview_spent_delta(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        previews: &mut HashMap<Uuid, i64>,
        category_id: Uuid,
        at: DateTime<Utc>,
        delta_minor: i64,
    ) -> ResultEngine<()> {
        let allocation_models = self
            .covering_allocations(db, user_id, category_id, at)
            .await?;
        for model in allocation_models {
            let allocation_id = Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("allocation not exists".to_string()))?;
            let entry = previews.entry(allocation_id).or_insert(model.spent_minor);
            *entry += delta_minor;
        }
        Ok(())
    }

    /// Persists previewed allocation spending with one partial update per row.
    pub(super) async fn persist_allocation_spent(
        &self,
        db: &DatabaseTransaction,
        previews: &HashMap<Uuid, i64>,
    ) -> ResultEngine<()> {
        for (allocation_id, spent_minor) in previews {
            let update = budget_allocations::ActiveModel {
                id: ActiveValue::Set(allocation_id.to_string()),
                spent_minor: ActiveValue::Set(*spent_minor),
                ..Default::default()
            };
            update.update(db).await?;
        }
        Ok(())
    }
}
