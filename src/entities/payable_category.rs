//! Payable category entity - User-defined labels for grouping payables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payable category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payable_categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this category
    pub owner_id: i64,
    /// Display name, unique per owner
    pub name: String,
    /// URL-safe token derived from the name, unique per owner
    pub slug: String,
    /// Hex color used by the dashboard UI
    pub color: String,
}

/// Defines relationships between `PayableCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category labels many payables (detached on category deletion)
    #[sea_orm(has_many = "super::payable::Entity")]
    Payables,
}

impl Related<super::payable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
