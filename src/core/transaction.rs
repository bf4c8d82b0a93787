//! Transaction management - income/expense movements on a bank.

use crate::clock::Clock;
use crate::core::bank;
use crate::entities::transaction::{self, TransactionType};
use crate::entities::Transaction;
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Smallest accepted amount: one cent.
const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Caller-supplied fields for creating or updating a transaction.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    /// Bank the money moved through, owned by the caller
    pub bank_id: i64,
    /// Title (trimmed; must not be empty)
    pub title: String,
    /// Description (trimmed; may be empty)
    pub description: String,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Amount moved, at least one cent
    pub amount: Decimal,
    /// Calendar date of the movement
    pub transaction_date: NaiveDate,
}

fn clean_input(mut input: TransactionInput) -> Result<TransactionInput> {
    input.title = input.title.trim().to_string();
    input.description = input.description.trim().to_string();

    if input.title.is_empty() {
        return Err(Error::validation("title", "title cannot be empty"));
    }
    if input.amount < MIN_AMOUNT {
        return Err(Error::validation("amount", "amount must be at least 0.01"));
    }
    Ok(input)
}

async fn validate_bank<C>(db: &C, owner_id: i64, bank_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    bank::find_owned(db, owner_id, bank_id)
        .await
        .map(|_| ())
        .map_err(|_| Error::validation("bank", "bank does not belong to this user"))
}

/// Creates a transaction against one of the caller's banks.
pub async fn create(
    db: &DatabaseConnection,
    owner_id: i64,
    input: TransactionInput,
    clock: &dyn Clock,
) -> Result<transaction::Model> {
    let input = clean_input(input)?;
    validate_bank(db, owner_id, input.bank_id).await?;

    let now = clock.now();
    let model = transaction::ActiveModel {
        owner_id: Set(owner_id),
        bank_id: Set(input.bank_id),
        title: Set(input.title),
        description: Set(input.description),
        amount: Set(input.amount),
        transaction_type: Set(input.transaction_type),
        transaction_date: Set(input.transaction_date),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Applies a full update to an existing transaction.
pub async fn update(
    db: &DatabaseConnection,
    owner_id: i64,
    transaction_id: i64,
    input: TransactionInput,
    clock: &dyn Clock,
) -> Result<transaction::Model> {
    let input = clean_input(input)?;
    validate_bank(db, owner_id, input.bank_id).await?;

    let existing = find_owned(db, owner_id, transaction_id).await?;
    let mut active: transaction::ActiveModel = existing.into();
    active.bank_id = Set(input.bank_id);
    active.title = Set(input.title);
    active.description = Set(input.description);
    active.amount = Set(input.amount);
    active.transaction_type = Set(input.transaction_type);
    active.transaction_date = Set(input.transaction_date);
    active.updated_at = Set(clock.now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a transaction, returning its id.
pub async fn delete(
    db: &DatabaseConnection,
    owner_id: i64,
    transaction_id: i64,
) -> Result<i64> {
    let existing = find_owned(db, owner_id, transaction_id).await?;
    Transaction::delete_by_id(existing.id).exec(db).await?;
    Ok(existing.id)
}

/// Lists the caller's transactions, most recent first.
pub async fn list(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_owned<C>(db: &C, owner_id: i64, transaction_id: i64) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "transaction" })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn create_and_list_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();
        let bank = crate::core::bank::create(&db, OWNER, "Nubank", None, None).await?;

        let older = TransactionInput {
            bank_id: bank.id,
            title: "Mercado".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Expense,
            amount: dec!(250.00),
            transaction_date: date(2024, 1, 5),
        };
        let newer = TransactionInput {
            transaction_date: date(2024, 2, 5),
            title: "Salario".to_string(),
            transaction_type: TransactionType::Income,
            amount: dec!(5000.00),
            ..older.clone()
        };
        create(&db, OWNER, older, &clock).await?;
        create(&db, OWNER, newer, &clock).await?;

        let listed = list(&db, OWNER).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Salario");
        assert_eq!(listed[1].title, "Mercado");

        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_foreign_bank() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();
        let foreign_bank = crate::core::bank::create(&db, OTHER_OWNER, "Itau", None, None).await?;

        let input = TransactionInput {
            bank_id: foreign_bank.id,
            title: "Mercado".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Expense,
            amount: dec!(10.00),
            transaction_date: date(2024, 1, 5),
        };
        let result = create(&db, OWNER, input, &clock).await;

        assert!(matches!(result, Err(Error::Validation { field: "bank", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();
        let bank = crate::core::bank::create(&db, OWNER, "Nubank", None, None).await?;
        let created = create_test_transaction(&db, OWNER, bank.id, &clock).await?;

        let input = TransactionInput {
            bank_id: bank.id,
            title: "Mercado do mes".to_string(),
            description: "compras".to_string(),
            transaction_type: TransactionType::Expense,
            amount: dec!(300.00),
            transaction_date: date(2024, 1, 6),
        };
        let result = update(&db, OTHER_OWNER, created.id, input.clone(), &clock).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let updated = update(&db, OWNER, created.id, input, &clock).await?;
        assert_eq!(updated.title, "Mercado do mes");
        assert_eq!(updated.amount, dec!(300.00));

        assert!(matches!(
            delete(&db, OTHER_OWNER, created.id).await,
            Err(Error::NotFound { .. })
        ));
        assert_eq!(delete(&db, OWNER, created.id).await?, created.id);
        assert!(list(&db, OWNER).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn amount_must_cover_a_cent() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();
        let bank = crate::core::bank::create(&db, OWNER, "Nubank", None, None).await?;

        let input = TransactionInput {
            bank_id: bank.id,
            title: "Nada".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Expense,
            amount: dec!(0.00),
            transaction_date: date(2024, 1, 5),
        };
        let result = create(&db, OWNER, input, &clock).await;

        assert!(matches!(result, Err(Error::Validation { field: "amount", .. })));

        Ok(())
    }
}
