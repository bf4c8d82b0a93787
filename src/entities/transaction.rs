//! Transaction entity - A single income or expense movement on a bank.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a transaction.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum TransactionType {
    /// Money entering the bank
    #[sea_orm(string_value = "income")]
    Income,
    /// Money leaving the bank
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl TransactionType {
    /// Display label used in exported reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "Entrada",
            Self::Expense => "Saida",
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this transaction
    pub owner_id: i64,
    /// Bank the money moved through; banks with transactions cannot be deleted
    pub bank_id: i64,
    /// Short human-readable title
    pub title: String,
    /// Optional longer description
    pub description: String,
    /// Amount moved, always positive; direction comes from `transaction_type`
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    /// Whether this is income or expense
    pub transaction_type: TransactionType,
    /// Calendar date the movement happened
    pub transaction_date: Date,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one bank
    #[sea_orm(
        belongs_to = "super::bank::Entity",
        from = "Column::BankId",
        to = "super::bank::Column::Id"
    )]
    Bank,
}

impl Related<super::bank::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bank.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
