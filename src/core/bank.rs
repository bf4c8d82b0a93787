//! Bank management - seeding defaults, creation with per-owner slugs, and
//! delete protection.
//!
//! Banks are referenced by transactions (protected: the bank cannot be
//! deleted while any exist) and by payables (detached: deleting the bank
//! leaves the payable without a bank).

use crate::core::text::slugify;
use crate::entities::bank;
use crate::entities::{payable, transaction, Bank, Payable, Transaction};
use crate::errors::{Error, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// Banks auto-provisioned for every owner on first dashboard load.
const DEFAULT_BANKS: [(&str, &str, &str, &str); 3] = [
    ("Nubank", "nubank", "#8A05BE", "ph-credit-card"),
    ("Itau", "itau", "#EC7000", "ph-bank"),
    ("Inter", "inter", "#FF7A00", "ph-wallet"),
];

/// Default color for user-created banks.
const DEFAULT_COLOR: &str = "#4F46E5";

/// Default icon for user-created banks.
const DEFAULT_ICON: &str = "ph-bank";

/// Seeds the default banks for an owner that has none yet. Idempotent: any
/// existing bank (default or not) suppresses the seeding entirely.
pub async fn ensure_defaults(db: &DatabaseConnection, owner_id: i64) -> Result<()> {
    let existing = Bank::find()
        .filter(bank::Column::OwnerId.eq(owner_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let defaults = DEFAULT_BANKS.map(|(name, slug, color, icon)| bank::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        color: Set(color.to_string()),
        icon: Set(icon.to_string()),
        ..Default::default()
    });
    Bank::insert_many(defaults).exec(db).await?;
    Ok(())
}

/// Looks up a bank scoped to its owner, treating foreign records as absent.
pub(crate) async fn find_owned<C>(db: &C, owner_id: i64, bank_id: i64) -> Result<bank::Model>
where
    C: ConnectionTrait,
{
    Bank::find_by_id(bank_id)
        .filter(bank::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "bank" })
}

/// Creates a bank with a deduplicated per-owner slug.
pub async fn create(
    db: &DatabaseConnection,
    owner_id: i64,
    name: &str,
    color: Option<&str>,
    icon: Option<&str>,
) -> Result<bank::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "name cannot be empty"));
    }

    let duplicate = Bank::find()
        .filter(bank::Column::OwnerId.eq(owner_id))
        .filter(bank::Column::Name.eq(name))
        .count(db)
        .await?;
    if duplicate > 0 {
        return Err(Error::validation("name", "a bank with this name already exists"));
    }

    let icon = match icon.map(str::trim) {
        Some(icon) if !icon.is_empty() => icon,
        _ => DEFAULT_ICON,
    };
    let slug = unique_slug(db, owner_id, name, "bank").await?;

    let model = bank::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        slug: Set(slug),
        color: Set(color.unwrap_or(DEFAULT_COLOR).to_string()),
        icon: Set(icon.to_string()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Deletes a bank. Fails with [`Error::Conflict`] while any transaction
/// references it; payables referencing it are detached instead.
pub async fn delete(db: &DatabaseConnection, owner_id: i64, bank_id: i64) -> Result<i64> {
    let bank = find_owned(db, owner_id, bank_id).await?;

    let references = Transaction::find()
        .filter(transaction::Column::BankId.eq(bank.id))
        .count(db)
        .await?;
    if references > 0 {
        return Err(Error::Conflict {
            message: "cannot remove: this bank still has linked transactions".to_string(),
        });
    }

    let txn = db.begin().await?;
    Payable::update_many()
        .col_expr(payable::Column::BankId, sea_orm::sea_query::Expr::value(Option::<i64>::None))
        .filter(payable::Column::BankId.eq(bank.id))
        .exec(&txn)
        .await?;
    Bank::delete_by_id(bank.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(bank.id)
}

/// Lists the caller's banks ordered by name.
pub async fn list(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<bank::Model>> {
    Bank::find()
        .filter(bank::Column::OwnerId.eq(owner_id))
        .order_by_asc(bank::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Derives a slug from `name` unique among the owner's banks, appending
/// `-2`, `-3`, ... on collision.
async fn unique_slug<C>(db: &C, owner_id: i64, name: &str, fallback: &str) -> Result<String>
where
    C: ConnectionTrait,
{
    let base = {
        let slug = slugify(name);
        if slug.is_empty() { fallback.to_string() } else { slug }
    };

    let mut candidate = base.clone();
    let mut counter = 2;
    loop {
        let taken = Bank::find()
            .filter(bank::Column::OwnerId.eq(owner_id))
            .filter(bank::Column::Slug.eq(candidate.clone()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn ensure_defaults_seeds_once() -> Result<()> {
        let db = setup_test_db().await?;

        ensure_defaults(&db, OWNER).await?;
        ensure_defaults(&db, OWNER).await?;

        let banks = list(&db, OWNER).await?;
        assert_eq!(banks.len(), 3);
        let names: Vec<&str> = banks.iter().map(|bank| bank.name.as_str()).collect();
        assert_eq!(names, vec!["Inter", "Itau", "Nubank"]);

        Ok(())
    }

    #[tokio::test]
    async fn defaults_are_per_owner() -> Result<()> {
        let db = setup_test_db().await?;

        ensure_defaults(&db, OWNER).await?;
        ensure_defaults(&db, OTHER_OWNER).await?;

        assert_eq!(list(&db, OWNER).await?.len(), 3);
        assert_eq!(list(&db, OTHER_OWNER).await?.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn create_slugifies_and_deduplicates() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create(&db, OWNER, "Caixa Econômica", None, None).await?;
        assert_eq!(first.slug, "caixa-economica");
        assert_eq!(first.color, DEFAULT_COLOR);
        assert_eq!(first.icon, DEFAULT_ICON);

        // Same slug for another owner is fine.
        let other = create(&db, OTHER_OWNER, "Caixa Econômica", None, None).await?;
        assert_eq!(other.slug, "caixa-economica");

        // A colliding slug for the same owner gets a suffix.
        let second = create(&db, OWNER, "Caixa: Econômica", None, None).await?;
        assert_eq!(second.slug, "caixa-economica-2");

        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() -> Result<()> {
        let db = setup_test_db().await?;

        create(&db, OWNER, "Nubank", None, None).await?;
        let result = create(&db, OWNER, "Nubank", None, None).await;

        assert!(matches!(result, Err(Error::Validation { field: "name", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn delete_is_blocked_by_linked_transactions() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let bank = create(&db, OWNER, "Nubank", None, None).await?;
        create_test_transaction(&db, OWNER, bank.id, &clock).await?;

        let result = delete(&db, OWNER, bank.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn delete_detaches_payables_when_unreferenced() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let bank = create(&db, OWNER, "Nubank", None, None).await?;
        let mut input = payable_input("Fatura", &clock);
        input.bank_id = Some(bank.id);
        let created = crate::core::payable::create(&db, OWNER, input, &clock).await?;

        delete(&db, OWNER, bank.id).await?;

        let detached = crate::core::payable::get(&db, OWNER, created[0].id).await?;
        assert_eq!(detached.bank_id, None);
        assert!(list(&db, OWNER).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() -> Result<()> {
        let db = setup_test_db().await?;

        let bank = create(&db, OWNER, "Nubank", None, None).await?;
        let result = delete(&db, OTHER_OWNER, bank.id).await;

        assert!(matches!(result, Err(Error::NotFound { entity: "bank" })));

        Ok(())
    }
}
