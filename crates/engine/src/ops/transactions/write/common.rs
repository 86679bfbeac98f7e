use std::collections::HashMap;

use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::ResultEngine;

use super::super::super::{Engine, normalize_optional_text};

/// Staged derived-state changes for one ledger mutation.
///
/// Wallets and allocations touched by a write are simulated in memory first,
/// so every admission check runs before any row changes. `persist_previews`
/// then writes one partial update per touched row.
#[derive(Debug, Default)]
pub(super) struct Previews {
    pub(super) wallets: HashMap<Uuid, i64>,
    pub(super) spent: HashMap<Uuid, i64>,
}

pub(super) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

impl Engine {
    pub(super) async fn persist_previews(
        &self,
        db: &DatabaseTransaction,
        previews: &Previews,
    ) -> ResultEngine<()> {
        self.persist_wallet_balances(db, &previews.wallets).await?;
        self.persist_allocation_spent(db, &previews.spent).await
    }
}
