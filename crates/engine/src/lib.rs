pub use budget_allocations::BudgetAllocation;
pub use budgets::Budget;
pub use categories::Category;
pub use commands::{
    AllocationInput, CreateBudgetCmd, CreateTransactionCmd, UpdateBudgetCmd, UpdateTransactionCmd,
};
pub use error::EngineError;
pub use money::Amount;
pub use ops::{Engine, EngineBuilder, TransactionListFilter};
pub use transactions::{Transaction, TransactionKind};
pub use wallets::Wallet;

mod budget_allocations;
mod budgets;
mod categories;
mod commands;
mod error;
mod money;
mod ops;
mod transactions;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
