//! Bank entity - Represents a financial institution owned by one user.
//!
//! Banks scope transactions and payables. Name and slug are unique per owner;
//! the slug is derived from the name and used in report filenames.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bank database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    /// Unique identifier for the bank
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this bank; all lookups are scoped to it
    pub owner_id: i64,
    /// Display name (e.g., "Nubank"), unique per owner
    pub name: String,
    /// URL-safe token derived from the name, unique per owner
    pub slug: String,
    /// Hex color used by the dashboard UI
    pub color: String,
    /// Icon identifier used by the dashboard UI
    pub icon: String,
}

/// Defines relationships between Bank and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One bank has many transactions (delete-protected while any exist)
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One bank has many payables (detached on bank deletion)
    #[sea_orm(has_many = "super::payable::Entity")]
    Payables,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::payable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
