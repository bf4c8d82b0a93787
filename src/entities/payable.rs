//! Payable entity - A trackable bill or obligation with a due date.
//!
//! Payables of kind `installment` can belong to an installment group: a set
//! of records generated from one originating amount split across monthly due
//! dates, sharing an opaque `installment_group` identifier.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of obligation a payable represents.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PayableKind {
    /// One-off bill
    #[sea_orm(string_value = "invoice")]
    Invoice,
    /// Recurring subscription
    #[sea_orm(string_value = "subscription")]
    Subscription,
    /// Outstanding debt
    #[sea_orm(string_value = "debt")]
    Debt,
    /// One slice of an installment plan
    #[sea_orm(string_value = "installment")]
    Installment,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

impl PayableKind {
    /// Display label used in exported reports when no category is set.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Fatura",
            Self::Subscription => "Assinatura",
            Self::Debt => "Divida",
            Self::Installment => "Parcela",
            Self::Other => "Outro",
        }
    }
}

/// Payment state of a payable.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
pub enum PayableStatus {
    /// Not yet paid
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// Payable database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payables")]
pub struct Model {
    /// Unique identifier for the payable
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this payable; all lookups are scoped to it
    pub owner_id: i64,
    /// Optional bank the payment comes out of
    pub bank_id: Option<i64>,
    /// Optional user-defined category
    pub category_id: Option<i64>,
    /// Short human-readable title
    pub title: String,
    /// Optional longer description
    pub description: String,
    /// What kind of obligation this is
    pub kind: PayableKind,
    /// Payment state
    pub status: PayableStatus,
    /// Amount owed for this record (one installment's share when grouped)
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    /// When the payment is due
    pub due_date: Date,
    /// When it was actually paid; set iff status is paid
    pub payment_date: Option<Date>,
    /// Free-form note recorded at payment time; empty while pending
    pub payment_note: String,
    /// Blob-store reference to an uploaded receipt, if any
    pub payment_receipt: Option<String>,
    /// 1-based position within the installment plan
    pub installment_number: Option<i32>,
    /// Total number of installments in the plan
    pub installment_total: Option<i32>,
    /// Opaque token shared by every payable of one installment plan
    pub installment_group: Option<Uuid>,
    /// Whether a subscription renews automatically; false for other kinds
    pub is_recurring: bool,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Payable and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payable may reference one bank
    #[sea_orm(
        belongs_to = "super::bank::Entity",
        from = "Column::BankId",
        to = "super::bank::Column::Id"
    )]
    Bank,
    /// Each payable may reference one category
    #[sea_orm(
        belongs_to = "super::payable_category::Entity",
        from = "Column::CategoryId",
        to = "super::payable_category::Column::Id"
    )]
    Category,
    /// One payable has many status history entries
    #[sea_orm(has_many = "super::payable_status_history::Entity")]
    StatusHistory,
}

impl Related<super::bank::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bank.def()
    }
}

impl Related<super::payable_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::payable_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
