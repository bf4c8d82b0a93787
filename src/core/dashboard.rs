//! Dashboard bootstrap - the composition root behind the home screen.
//!
//! Loading the dashboard performs the owner's lazy initialization (default
//! banks, legacy installment normalization) and then gathers everything the
//! UI renders in one pass.

use crate::clock::Clock;
use crate::core::{bank, category, event, installment, payable, transaction};
use crate::entities::{
    bank as bank_entity, event as event_entity, payable as payable_entity,
    payable_category as category_entity, transaction as transaction_entity,
};
use crate::errors::Result;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Everything the dashboard home screen renders for one owner.
#[derive(Debug)]
pub struct DashboardData {
    /// The owner's banks, ordered by name
    pub banks: Vec<bank_entity::Model>,
    /// The owner's payable categories, ordered by name
    pub categories: Vec<category_entity::Model>,
    /// The owner's transactions, most recent first
    pub transactions: Vec<transaction_entity::Model>,
    /// The owner's payables, ordered by due date
    pub payables: Vec<payable_entity::Model>,
    /// The owner's events, chronological
    pub events: Vec<event_entity::Model>,
    /// The evaluation date everything was loaded against
    pub today: NaiveDate,
}

/// Loads the dashboard for one owner, running the idempotent per-owner
/// initialization first: default banks are provisioned on first load, and
/// legacy ungrouped installments are normalized into proper groups.
pub async fn load(
    db: &DatabaseConnection,
    owner_id: i64,
    clock: &dyn Clock,
) -> Result<DashboardData> {
    bank::ensure_defaults(db, owner_id).await?;
    installment::normalize_legacy(db, owner_id, clock).await?;

    let data = DashboardData {
        banks: bank::list(db, owner_id).await?,
        categories: category::list(db, owner_id).await?,
        transactions: transaction::list(db, owner_id).await?,
        payables: payable::list(db, owner_id).await?,
        events: event::list(db, owner_id).await?,
        today: clock.today(),
    };
    debug!(
        owner_id,
        payables = data.payables.len(),
        transactions = data.transactions.len(),
        "dashboard loaded"
    );
    Ok(data)
}
