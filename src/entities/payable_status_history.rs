//! Payable status history entity - Append-only audit trail of status changes.
//!
//! A row is written only when a mutation actually changed the status, payment
//! date, or payment note of a payable. Rows are never updated; they disappear
//! only when the parent payable is deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::payable::PayableStatus;

/// Status history database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payable_status_history")]
pub struct Model {
    /// Unique identifier for the history entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The payable this entry audits
    pub payable_id: i64,
    /// Status before the change
    pub previous_status: PayableStatus,
    /// Status after the change
    pub new_status: PayableStatus,
    /// Payment date before the change
    pub previous_payment_date: Option<Date>,
    /// Payment date after the change
    pub new_payment_date: Option<Date>,
    /// Payment note before the change
    pub previous_payment_note: String,
    /// Payment note after the change
    pub new_payment_note: String,
    /// Where the change came from (`manual`, `status_update`, `form_update`,
    /// `bulk_pay_until`, `bulk_pay_all`, `bulk_reopen_all`,
    /// `bulk_mark_paid`, `bulk_mark_pending`)
    pub source: String,
    /// Owner id of the actor, when known
    pub changed_by: Option<i64>,
    /// When the change happened
    pub changed_at: DateTimeUtc,
}

/// Defines relationships between status history and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one payable and dies with it
    #[sea_orm(
        belongs_to = "super::payable::Entity",
        from = "Column::PayableId",
        to = "super::payable::Column::Id",
        on_delete = "Cascade"
    )]
    Payable,
}

impl Related<super::payable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
