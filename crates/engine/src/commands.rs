//! Command structs for engine operations.
//!
//! These types group parameters for the wider write operations
//! (transaction create/update, budget create/update), keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::transactions::TransactionKind;

/// Create an expense or income transaction.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub wallet_id: Uuid,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl CreateTransactionCmd {
    /// `occurred_at` defaults to the current instant.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        wallet_id: Uuid,
        category_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            wallet_id,
            category_id,
            kind,
            amount_minor,
            note: None,
            occurred_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }
}

/// Update an existing transaction.
///
/// Every field except the identifiers is optional; unset fields keep their
/// stored value.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,

    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,

    // Retargeting.
    pub wallet_id: Option<Uuid>,
    pub category_id: Option<Uuid>,

    pub note: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
            amount_minor: None,
            kind: None,
            wallet_id: None,
            category_id: None,
            note: None,
            occurred_at: None,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}

/// One requested allocation inside a budget write.
#[derive(Clone, Copy, Debug)]
pub struct AllocationInput {
    pub category_id: Uuid,
    pub limit_minor: i64,
}

impl AllocationInput {
    #[must_use]
    pub fn new(category_id: Uuid, limit_minor: i64) -> Self {
        Self {
            category_id,
            limit_minor,
        }
    }
}

/// Create a budget with its allocations.
#[derive(Clone, Debug)]
pub struct CreateBudgetCmd {
    pub user_id: String,
    pub name: String,
    pub total_minor: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub allocations: Vec<AllocationInput>,
}

impl CreateBudgetCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        total_minor: i64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            total_minor,
            start_date,
            end_date,
            allocations: Vec::new(),
        }
    }

    /// Append one allocation, keeping the call order as display order.
    #[must_use]
    pub fn allocation(mut self, category_id: Uuid, limit_minor: i64) -> Self {
        self.allocations
            .push(AllocationInput::new(category_id, limit_minor));
        self
    }

    #[must_use]
    pub fn allocations(mut self, allocations: Vec<AllocationInput>) -> Self {
        self.allocations = allocations;
        self
    }
}

/// Update an existing budget.
///
/// Unset fields keep their stored value. Supplying `allocations` replaces the
/// whole allocation list; spending already tracked for a category carries
/// over to its replacement row.
#[derive(Clone, Debug)]
pub struct UpdateBudgetCmd {
    pub user_id: String,
    pub budget_id: Uuid,

    pub name: Option<String>,
    pub total_minor: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub allocations: Option<Vec<AllocationInput>>,
}

impl UpdateBudgetCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, budget_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            budget_id,
            name: None,
            total_minor: None,
            start_date: None,
            end_date: None,
            is_active: None,
            allocations: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn total_minor(mut self, total_minor: i64) -> Self {
        self.total_minor = Some(total_minor);
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn allocations(mut self, allocations: Vec<AllocationInput>) -> Self {
        self.allocations = Some(allocations);
        self
    }
}
