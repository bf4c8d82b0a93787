//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without manual SQL.

use crate::entities::{
    Bank, Event, Payable, PayableCategory, PayableStatusHistory, Transaction,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the database described by `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions. Referenced tables come
/// first so the foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let bank_table = schema.create_table_from_entity(Bank);
    let category_table = schema.create_table_from_entity(PayableCategory);
    let transaction_table = schema.create_table_from_entity(Transaction);
    let event_table = schema.create_table_from_entity(Event);
    let payable_table = schema.create_table_from_entity(Payable);
    let history_table = schema.create_table_from_entity(PayableStatusHistory);

    db.execute(builder.build(&bank_table)).await?;
    db.execute(builder.build(&category_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&event_table)).await?;
    db.execute(builder.build(&payable_table)).await?;
    db.execute(builder.build(&history_table)).await?;

    Ok(())
}
