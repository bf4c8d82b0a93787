//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod bank;
pub mod event;
pub mod payable;
pub mod payable_category;
pub mod payable_status_history;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use bank::{Column as BankColumn, Entity as Bank, Model as BankModel};
pub use event::{Column as EventColumn, Entity as Event, Model as EventModel};
pub use payable::{Column as PayableColumn, Entity as Payable, Model as PayableModel};
pub use payable_category::{
    Column as PayableCategoryColumn, Entity as PayableCategory, Model as PayableCategoryModel,
};
pub use payable_status_history::{
    Column as PayableStatusHistoryColumn, Entity as PayableStatusHistory,
    Model as PayableStatusHistoryModel,
};
pub use transaction::{Column as TransactionColumn, Entity as Transaction, Model as TransactionModel};
