use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    AllocationInput, Budget, CreateBudgetCmd, EngineError, ResultEngine, UpdateBudgetCmd,
    budget_allocations::{self, BudgetAllocation},
    budgets,
};

use super::{Engine, ensure_user_id, normalize_required_name, with_tx};

/// Validates the shape of a requested allocation list against a budget total.
fn validate_allocations(allocations: &[AllocationInput], total_minor: i64) -> ResultEngine<()> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut limit_sum: i64 = 0;
    for allocation in allocations {
        if allocation.limit_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "allocation limit must be >= 0".to_string(),
            ));
        }
        if !seen.insert(allocation.category_id) {
            return Err(EngineError::InvalidAllocation(
                "duplicate category in allocations".to_string(),
            ));
        }
        limit_sum = limit_sum
            .checked_add(allocation.limit_minor)
            .ok_or_else(|| EngineError::InvalidAmount("allocation limits overflow".to_string()))?;
    }
    if limit_sum > total_minor {
        return Err(EngineError::InvalidAllocation(
            "allocated amount exceeds budget total".to_string(),
        ));
    }
    Ok(())
}

/// Snaps an instant to the start of its UTC day.
fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

impl Engine {
    /// Loads the allocation rows of a budget model and builds the domain
    /// aggregate, allocations ordered by position.
    pub(super) async fn assemble_budget(
        &self,
        db: &DatabaseTransaction,
        model: budgets::Model,
    ) -> ResultEngine<Budget> {
        let allocation_models: Vec<budget_allocations::Model> = budget_allocations::Entity::find()
            .filter(budget_allocations::Column::BudgetId.eq(model.id.clone()))
            .order_by_asc(budget_allocations::Column::Position)
            .all(db)
            .await?;
        Budget::try_from((model, allocation_models))
    }

    /// Add a new budget with its allocations.
    ///
    /// Names are unique per user with an exact match. Every allocation
    /// category must belong to the user, appear at most once and carry a
    /// non-negative limit, and the limits together must fit inside
    /// `total_minor`. New budgets start active with zero spending.
    pub async fn create_budget(&self, cmd: CreateBudgetCmd) -> ResultEngine<Budget> {
        let CreateBudgetCmd {
            user_id,
            name,
            total_minor,
            start_date,
            end_date,
            allocations,
        } = cmd;
        ensure_user_id(&user_id)?;
        let name = normalize_required_name(&name, "budget")?;
        if total_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "total_minor must be >= 0".to_string(),
            ));
        }
        if start_date > end_date {
            return Err(EngineError::InvalidDates(
                "start_date must be <= end_date".to_string(),
            ));
        }
        validate_allocations(&allocations, total_minor)?;

        with_tx!(self, |db_tx| {
            let exists = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.clone()))
                .filter(budgets::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            for allocation in &allocations {
                self.require_category(&db_tx, &user_id, allocation.category_id)
                    .await?;
            }

            let mut budget = Budget::new(user_id.clone(), name, total_minor, start_date, end_date);
            for (position, input) in allocations.iter().enumerate() {
                budget.allocations.push(BudgetAllocation::new(
                    budget.id,
                    input.category_id,
                    input.limit_minor,
                    position as i32,
                ));
            }

            let budget_model: budgets::ActiveModel = (&budget).into();
            budget_model.insert(&db_tx).await?;
            for allocation in &budget.allocations {
                let allocation_model: budget_allocations::ActiveModel = allocation.into();
                allocation_model.insert(&db_tx).await?;
            }

            Ok(budget)
        })
    }

    /// Return a budget with its allocations from DB.
    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, user_id, budget_id).await?;
            let budget = self.assemble_budget(&db_tx, model).await?;
            Ok(budget)
        })
    }

    /// Return every budget of a user, newest first.
    ///
    /// Budgets whose window already ended are deactivated on the way out.
    /// Expiry is lazy: nothing flips `is_active` until a list read observes
    /// the ended window, and the flip persists within the same atomic unit as
    /// the read.
    pub async fn list_budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            budgets::Entity::update_many()
                .col_expr(budgets::Column::IsActive, Expr::value(false))
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .filter(budgets::Column::IsActive.eq(true))
                .filter(budgets::Column::EndDate.lt(now))
                .exec(&db_tx)
                .await?;

            let models: Vec<budgets::Model> = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(budgets::Column::CreatedAt)
                .order_by_desc(budgets::Column::Id)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.assemble_budget(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Return the budgets that cover an expense in `category_id` at `at`,
    /// newest first.
    pub async fn covering_budgets(
        &self,
        user_id: &str,
        category_id: Uuid,
        at: DateTime<Utc>,
    ) -> ResultEngine<Vec<Budget>> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let allocation_models = self
                .covering_allocations(&db_tx, user_id, category_id, at)
                .await?;
            let budget_ids: Vec<String> = allocation_models
                .into_iter()
                .map(|model| model.budget_id)
                .collect();
            if budget_ids.is_empty() {
                return Ok(Vec::new());
            }

            let models: Vec<budgets::Model> = budgets::Entity::find()
                .filter(budgets::Column::Id.is_in(budget_ids))
                .order_by_desc(budgets::Column::CreatedAt)
                .order_by_desc(budgets::Column::Id)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.assemble_budget(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Patches budget fields; unset fields keep their stored value.
    ///
    /// Supplied dates are snapped to the start of their UTC day before the
    /// window is validated. Supplying `allocations` replaces the whole list:
    /// a category kept across the replacement keeps its tracked spending,
    /// dropped categories lose theirs, new categories start at zero. Without
    /// a replacement the existing limits must still fit a lowered total.
    pub async fn update_budget(&self, cmd: UpdateBudgetCmd) -> ResultEngine<Budget> {
        let UpdateBudgetCmd {
            user_id,
            budget_id,
            name,
            total_minor,
            start_date,
            end_date,
            is_active,
            allocations,
        } = cmd;
        ensure_user_id(&user_id)?;

        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, &user_id, budget_id).await?;
            let current = self.assemble_budget(&db_tx, model).await?;

            let new_name = match name {
                Some(raw) => {
                    let candidate = normalize_required_name(&raw, "budget")?;
                    let exists = budgets::Entity::find()
                        .filter(budgets::Column::UserId.eq(user_id.clone()))
                        .filter(budgets::Column::Name.eq(candidate.clone()))
                        .filter(budgets::Column::Id.ne(budget_id.to_string()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if exists {
                        return Err(EngineError::ExistingKey(candidate));
                    }
                    candidate
                }
                None => current.name.clone(),
            };
            let new_total = total_minor.unwrap_or(current.total_minor);
            if new_total < 0 {
                return Err(EngineError::InvalidAmount(
                    "total_minor must be >= 0".to_string(),
                ));
            }
            let new_start = match start_date {
                Some(supplied) => start_of_day(supplied),
                None => current.start_date,
            };
            let new_end = match end_date {
                Some(supplied) => start_of_day(supplied),
                None => current.end_date,
            };
            if new_start > new_end {
                return Err(EngineError::InvalidDates(
                    "start_date must be <= end_date".to_string(),
                ));
            }
            let new_active = is_active.unwrap_or(current.is_active);

            match allocations {
                Some(inputs) => {
                    validate_allocations(&inputs, new_total)?;
                    for input in &inputs {
                        self.require_category(&db_tx, &user_id, input.category_id)
                            .await?;
                    }

                    let mut spent_by_category: HashMap<Uuid, i64> = current
                        .allocations
                        .iter()
                        .map(|allocation| (allocation.category_id, allocation.spent_minor))
                        .collect();

                    budget_allocations::Entity::delete_many()
                        .filter(budget_allocations::Column::BudgetId.eq(budget_id.to_string()))
                        .exec(&db_tx)
                        .await?;
                    for (position, input) in inputs.iter().enumerate() {
                        let mut allocation = BudgetAllocation::new(
                            budget_id,
                            input.category_id,
                            input.limit_minor,
                            position as i32,
                        );
                        allocation.spent_minor = spent_by_category
                            .remove(&input.category_id)
                            .unwrap_or_default();
                        let allocation_model: budget_allocations::ActiveModel = (&allocation).into();
                        allocation_model.insert(&db_tx).await?;
                    }
                }
                None => {
                    let limit_sum: i64 = current
                        .allocations
                        .iter()
                        .map(|allocation| allocation.limit_minor)
                        .sum();
                    if limit_sum > new_total {
                        return Err(EngineError::InvalidAllocation(
                            "allocated amount exceeds budget total".to_string(),
                        ));
                    }
                }
            }

            let active = budgets::ActiveModel {
                id: ActiveValue::Set(budget_id.to_string()),
                name: ActiveValue::Set(new_name),
                total_minor: ActiveValue::Set(new_total),
                start_date: ActiveValue::Set(new_start),
                end_date: ActiveValue::Set(new_end),
                is_active: ActiveValue::Set(new_active),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            let budget = self.assemble_budget(&db_tx, updated).await?;
            Ok(budget)
        })
    }

    /// Deletes a budget and its allocations.
    ///
    /// Transactions are untouched: they only lose the envelope that was
    /// tracking them.
    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, user_id, budget_id).await?;

            budget_allocations::Entity::delete_many()
                .filter(budget_allocations::Column::BudgetId.eq(budget_id.to_string()))
                .exec(&db_tx)
                .await?;
            budgets::Entity::delete_by_id(budget_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
