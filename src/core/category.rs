//! Payable category management.
//!
//! Categories are pure labels: deleting one detaches it from its payables
//! rather than blocking or cascading.

use crate::core::text::slugify;
use crate::entities::payable_category;
use crate::entities::{payable, Payable, PayableCategory};
use crate::errors::{Error, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// Default color for user-created categories.
const DEFAULT_COLOR: &str = "#5D7084";

/// Looks up a category scoped to its owner, treating foreign records as
/// absent.
pub(crate) async fn find_owned<C>(
    db: &C,
    owner_id: i64,
    category_id: i64,
) -> Result<payable_category::Model>
where
    C: ConnectionTrait,
{
    PayableCategory::find_by_id(category_id)
        .filter(payable_category::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "category" })
}

/// Creates a category with a deduplicated per-owner slug.
pub async fn create(
    db: &DatabaseConnection,
    owner_id: i64,
    name: &str,
    color: Option<&str>,
) -> Result<payable_category::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "name cannot be empty"));
    }

    let duplicate = PayableCategory::find()
        .filter(payable_category::Column::OwnerId.eq(owner_id))
        .filter(payable_category::Column::Name.eq(name))
        .count(db)
        .await?;
    if duplicate > 0 {
        return Err(Error::validation(
            "name",
            "a category with this name already exists",
        ));
    }

    let base = {
        let slug = slugify(name);
        if slug.is_empty() { "categoria".to_string() } else { slug }
    };
    let mut slug = base.clone();
    let mut counter = 2;
    loop {
        let taken = PayableCategory::find()
            .filter(payable_category::Column::OwnerId.eq(owner_id))
            .filter(payable_category::Column::Slug.eq(slug.clone()))
            .count(db)
            .await?;
        if taken == 0 {
            break;
        }
        slug = format!("{base}-{counter}");
        counter += 1;
    }

    let model = payable_category::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        slug: Set(slug),
        color: Set(color.unwrap_or(DEFAULT_COLOR).to_string()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Deletes a category, detaching it from any payables that use it.
pub async fn delete(db: &DatabaseConnection, owner_id: i64, category_id: i64) -> Result<i64> {
    let category = find_owned(db, owner_id, category_id).await?;

    let txn = db.begin().await?;
    Payable::update_many()
        .col_expr(
            payable::Column::CategoryId,
            sea_orm::sea_query::Expr::value(Option::<i64>::None),
        )
        .filter(payable::Column::CategoryId.eq(category.id))
        .exec(&txn)
        .await?;
    PayableCategory::delete_by_id(category.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(category.id)
}

/// Lists the caller's categories ordered by name.
pub async fn list(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<Vec<payable_category::Model>> {
    PayableCategory::find()
        .filter(payable_category::Column::OwnerId.eq(owner_id))
        .order_by_asc(payable_category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn create_slugifies_with_category_fallback() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create(&db, OWNER, "Cartão de Crédito", None).await?;
        assert_eq!(first.slug, "cartao-de-credito");
        assert_eq!(first.color, DEFAULT_COLOR);

        let unnamed = create(&db, OWNER, "!!!", None).await?;
        assert_eq!(unnamed.slug, "categoria");

        Ok(())
    }

    #[tokio::test]
    async fn delete_detaches_from_payables() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let category = create(&db, OWNER, "Moradia", None).await?;
        let mut input = payable_input("Aluguel", &clock);
        input.category_id = Some(category.id);
        let created = crate::core::payable::create(&db, OWNER, input, &clock).await?;

        delete(&db, OWNER, category.id).await?;

        let detached = crate::core::payable::get(&db, OWNER, created[0].id).await?;
        assert_eq!(detached.category_id, None);
        assert!(list(&db, OWNER).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() -> Result<()> {
        let db = setup_test_db().await?;

        let category = create(&db, OWNER, "Moradia", None).await?;
        let result = delete(&db, OTHER_OWNER, category.id).await;

        assert!(matches!(result, Err(Error::NotFound { entity: "category" })));

        Ok(())
    }
}
