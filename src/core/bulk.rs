//! Bulk operations over payables.
//!
//! Two coordinators: one addresses an entire installment group through any of
//! its members, the other an explicit selection of payable ids. Both run as a
//! single transaction, apply the status engine record by record, and append
//! one history entry per record that actually changed, tagged with the bulk
//! action that caused it.

use crate::clock::Clock;
use crate::core::payable;
use crate::core::status::{self, StatusChange};
use crate::entities::payable::{self as payable_entity, PayableKind, PayableStatus};
use crate::entities::{Payable, PayableStatusHistory};
use crate::errors::{Error, Result};
use crate::storage::ReceiptStore;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// Action applied to a whole installment group.
#[derive(Debug, Clone)]
pub enum GroupAction {
    /// Mark installments `1..=until_installment` paid with a shared payment
    /// date and note; later installments are left untouched.
    PayUntil {
        /// Highest installment number to mark paid; zero marks nothing.
        until_installment: i32,
        /// Shared payment date; today when absent.
        payment_date: Option<NaiveDate>,
        /// Shared payment note.
        payment_note: String,
    },
    /// Mark every installment in the group paid.
    PayAll {
        /// Shared payment date; today when absent.
        payment_date: Option<NaiveDate>,
        /// Shared payment note.
        payment_note: String,
    },
    /// Reset every installment to pending, dropping payment fields and
    /// receipts.
    ReopenAll,
}

impl GroupAction {
    const fn source(&self) -> &'static str {
        match self {
            Self::PayUntil { .. } => "bulk_pay_until",
            Self::PayAll { .. } => "bulk_pay_all",
            Self::ReopenAll => "bulk_reopen_all",
        }
    }
}

/// Action applied to an explicit selection of payables.
#[derive(Debug, Clone)]
pub enum SelectionAction {
    /// Mark every selected payable paid with a shared date and note.
    MarkPaid {
        /// Shared payment date; today when absent.
        payment_date: Option<NaiveDate>,
        /// Shared payment note.
        payment_note: String,
    },
    /// Reset every selected payable to pending, dropping receipts.
    MarkPending,
    /// Delete the selected payables (and their receipts). A selected grouped
    /// installment takes its entire group with it.
    Delete,
}

impl SelectionAction {
    const fn source(&self) -> &'static str {
        match self {
            Self::MarkPaid { .. } => "bulk_mark_paid",
            Self::MarkPending => "bulk_mark_pending",
            Self::Delete => "bulk_delete",
        }
    }
}

/// Result of a selection action.
#[derive(Debug)]
pub enum SelectionOutcome {
    /// Final state of every updated record, ordered by due date then id.
    Updated(Vec<payable_entity::Model>),
    /// Ids of every deleted record.
    Deleted(Vec<i64>),
}

/// Applies a [`GroupAction`] to the installment group that
/// `reference_payable_id` belongs to.
///
/// Fails with [`Error::InvalidGroup`] when the reference is not an
/// installment or carries no group id. Returns the refreshed group ordered by
/// installment number then id.
pub async fn group_update(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    reference_payable_id: i64,
    action: GroupAction,
    clock: &dyn Clock,
) -> Result<Vec<payable_entity::Model>> {
    let txn = db.begin().await?;
    let reference = payable::find_owned(&txn, owner_id, reference_payable_id).await?;
    let group = match (reference.kind, reference.installment_group) {
        (PayableKind::Installment, Some(group)) => group,
        _ => return Err(Error::InvalidGroup { id: reference.id }),
    };

    let members = payable::load_group(&txn, owner_id, group).await?;
    if members.is_empty() {
        return Err(Error::NotFound { entity: "installment" });
    }
    let group_size = i32::try_from(members.len()).unwrap_or(i32::MAX);

    let source = action.source();
    let (change, until_installment) = match action {
        GroupAction::PayUntil {
            until_installment,
            payment_date,
            payment_note,
        } => {
            if !(0..=group_size).contains(&until_installment) {
                return Err(Error::validation(
                    "until_installment",
                    "installment outside the allowed range",
                ));
            }
            (
                StatusChange::paid(payment_date, Some(payment_note)),
                until_installment,
            )
        }
        GroupAction::PayAll {
            payment_date,
            payment_note,
        } => (
            StatusChange::paid(payment_date, Some(payment_note)),
            group_size,
        ),
        GroupAction::ReopenAll => (StatusChange::pending(true), group_size),
    };

    let today = clock.today();
    let now = clock.now();
    let mut orphaned_receipts = Vec::new();
    let mut history_entries = Vec::new();

    for member in members {
        let reopening = change.status == PayableStatus::Pending;
        if !reopening && member.installment_number.unwrap_or(0) > until_installment {
            continue;
        }

        let before = status::snapshot(&member);
        let updated = status::apply_status(&member, &change, today);
        if reopening {
            if let Some(path) = &member.payment_receipt {
                orphaned_receipts.push(path.clone());
            }
        }
        if let Some(entry) = status::build_history_entry(&updated, &before, source, Some(owner_id), now)
        {
            history_entries.push(entry);
        }

        let mut active: payable_entity::ActiveModel = member.into();
        active.status = Set(updated.status);
        active.payment_date = Set(updated.payment_date);
        active.payment_note = Set(updated.payment_note);
        active.payment_receipt = Set(updated.payment_receipt);
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }

    if !history_entries.is_empty() {
        PayableStatusHistory::insert_many(history_entries).exec(&txn).await?;
    }
    txn.commit().await?;

    discard_blobs(receipts, &orphaned_receipts).await;

    payable::load_group(db, owner_id, group).await
}

/// Applies a [`SelectionAction`] to an explicit, deduplicated list of payable
/// ids owned by the caller.
///
/// Fails with a validation error when the list is empty or contains no
/// positive id, and with [`Error::NotFound`] when none of the ids resolve to
/// a record owned by the caller.
pub async fn selection_action(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_ids: &[i64],
    action: SelectionAction,
    clock: &dyn Clock,
) -> Result<SelectionOutcome> {
    if payable_ids.is_empty() {
        return Err(Error::validation("payable_ids", "select at least one payable"));
    }
    let mut ids: Vec<i64> = Vec::with_capacity(payable_ids.len());
    for &id in payable_ids {
        if id > 0 && !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(Error::validation(
            "payable_ids",
            "select at least one valid payable",
        ));
    }

    let txn = db.begin().await?;
    let targets = Payable::find()
        .filter(payable_entity::Column::OwnerId.eq(owner_id))
        .filter(payable_entity::Column::Id.is_in(ids))
        .order_by_asc(payable_entity::Column::DueDate)
        .order_by_asc(payable_entity::Column::Id)
        .all(&txn)
        .await?;
    if targets.is_empty() {
        return Err(Error::NotFound { entity: "payable" });
    }

    if matches!(action, SelectionAction::Delete) {
        return delete_selection(txn, receipts, owner_id, targets).await;
    }

    let source = action.source();
    let change = match action {
        SelectionAction::MarkPaid {
            payment_date,
            payment_note,
        } => StatusChange::paid(payment_date, Some(payment_note)),
        SelectionAction::MarkPending | SelectionAction::Delete => StatusChange::pending(true),
    };

    let today = clock.today();
    let now = clock.now();
    let mut updated_ids = Vec::new();
    let mut orphaned_receipts = Vec::new();
    let mut history_entries = Vec::new();

    for target in targets {
        let before = status::snapshot(&target);
        let updated = status::apply_status(&target, &change, today);
        if change.status == PayableStatus::Pending {
            if let Some(path) = &target.payment_receipt {
                orphaned_receipts.push(path.clone());
            }
        }
        if let Some(entry) = status::build_history_entry(&updated, &before, source, Some(owner_id), now)
        {
            history_entries.push(entry);
        }
        updated_ids.push(target.id);

        let mut active: payable_entity::ActiveModel = target.into();
        active.status = Set(updated.status);
        active.payment_date = Set(updated.payment_date);
        active.payment_note = Set(updated.payment_note);
        active.payment_receipt = Set(updated.payment_receipt);
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }

    if !history_entries.is_empty() {
        PayableStatusHistory::insert_many(history_entries).exec(&txn).await?;
    }
    txn.commit().await?;

    discard_blobs(receipts, &orphaned_receipts).await;

    let refreshed = Payable::find()
        .filter(payable_entity::Column::OwnerId.eq(owner_id))
        .filter(payable_entity::Column::Id.is_in(updated_ids))
        .order_by_asc(payable_entity::Column::DueDate)
        .order_by_asc(payable_entity::Column::Id)
        .all(db)
        .await?;
    Ok(SelectionOutcome::Updated(refreshed))
}

/// Deletes the selected payables, expanding grouped installments to their
/// full group (a group is always deleted as one unit).
async fn delete_selection(
    txn: sea_orm::DatabaseTransaction,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    targets: Vec<payable_entity::Model>,
) -> Result<SelectionOutcome> {
    let mut doomed = Vec::new();
    let mut doomed_ids = Vec::new();
    for target in targets {
        if doomed_ids.contains(&target.id) {
            continue;
        }
        match (target.kind, target.installment_group) {
            (PayableKind::Installment, Some(group)) => {
                for member in payable::load_group(&txn, owner_id, group).await? {
                    if !doomed_ids.contains(&member.id) {
                        doomed_ids.push(member.id);
                        doomed.push(member);
                    }
                }
            }
            _ => {
                doomed_ids.push(target.id);
                doomed.push(target);
            }
        }
    }

    Payable::delete_many()
        .filter(payable_entity::Column::OwnerId.eq(owner_id))
        .filter(payable_entity::Column::Id.is_in(doomed_ids.clone()))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    let paths: Vec<String> = doomed
        .iter()
        .filter_map(|member| member.payment_receipt.clone())
        .collect();
    discard_blobs(receipts, &paths).await;

    Ok(SelectionOutcome::Deleted(doomed_ids))
}

/// Best-effort blob cleanup after a committed mutation.
async fn discard_blobs(receipts: &dyn ReceiptStore, paths: &[String]) {
    for path in paths {
        if let Err(error) = receipts.delete(path).await {
            tracing::warn!(%path, %error, "failed to delete receipt blob");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::installment;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::PaginatorTrait;

    async fn create_test_plan(
        db: &DatabaseConnection,
        title: &str,
        slices: i32,
    ) -> Result<Vec<payable_entity::Model>> {
        let mut input = installment_input(title, dec!(120.00), slices);
        input.due_date = date(2024, 1, 10);
        installment::create_plan(db, OWNER, input, &test_clock()).await
    }

    async fn history_count(db: &DatabaseConnection) -> Result<u64> {
        PayableStatusHistory::find().count(db).await.map_err(Into::into)
    }

    #[tokio::test]
    async fn pay_until_marks_prefix_and_leaves_rest_pending() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 4).await?;
        let paid_on = date(2024, 2, 1);

        let group = group_update(
            &db,
            &receipts,
            OWNER,
            plan[0].id,
            GroupAction::PayUntil {
                until_installment: 2,
                payment_date: Some(paid_on),
                payment_note: "pix".to_string(),
            },
            &clock,
        )
        .await?;

        assert_eq!(group.len(), 4);
        for slice in &group[..2] {
            assert_eq!(slice.status, PayableStatus::Paid);
            assert_eq!(slice.payment_date, Some(paid_on));
            assert_eq!(slice.payment_note, "pix");
        }
        for slice in &group[2..] {
            assert_eq!(slice.status, PayableStatus::Pending);
            assert_eq!(slice.payment_date, None);
        }

        // One history entry per changed record.
        assert_eq!(history_count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn pay_until_zero_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 3).await?;

        let group = group_update(
            &db,
            &receipts,
            OWNER,
            plan[0].id,
            GroupAction::PayUntil {
                until_installment: 0,
                payment_date: None,
                payment_note: String::new(),
            },
            &clock,
        )
        .await?;

        assert!(group.iter().all(|slice| slice.status == PayableStatus::Pending));
        assert_eq!(history_count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn pay_until_rejects_out_of_range_target() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 3).await?;

        let result = group_update(
            &db,
            &receipts,
            OWNER,
            plan[0].id,
            GroupAction::PayUntil {
                until_installment: 4,
                payment_date: None,
                payment_note: String::new(),
            },
            &clock,
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Validation { field: "until_installment", .. })
        ));
        assert_eq!(history_count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn pay_all_marks_every_installment() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 5).await?;

        let group = group_update(
            &db,
            &receipts,
            OWNER,
            plan[2].id,
            GroupAction::PayAll {
                payment_date: None,
                payment_note: "quitado".to_string(),
            },
            &clock,
        )
        .await?;

        assert!(group.iter().all(|slice| slice.status == PayableStatus::Paid));
        assert!(group.iter().all(|slice| slice.payment_date == Some(clock.today())));
        assert_eq!(history_count(&db).await?, 5);

        Ok(())
    }

    #[tokio::test]
    async fn reopen_all_resets_group_and_discards_receipts() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 3).await?;
        group_update(
            &db,
            &receipts,
            OWNER,
            plan[0].id,
            GroupAction::PayAll {
                payment_date: None,
                payment_note: String::new(),
            },
            &clock,
        )
        .await?;

        // Attach a receipt to the first slice.
        let path = receipts.save("payable_receipts/nota.pdf", b"pdf").await?;
        attach_receipt(&db, plan[0].id, &path).await?;

        let group = group_update(&db, &receipts, OWNER, plan[0].id, GroupAction::ReopenAll, &clock)
            .await?;

        assert!(group.iter().all(|slice| slice.status == PayableStatus::Pending));
        assert!(group.iter().all(|slice| slice.payment_date.is_none()));
        assert!(group.iter().all(|slice| slice.payment_receipt.is_none()));
        assert!(!receipts.exists(&path).await?);

        // 3 entries from pay_all + 3 from reopen_all.
        assert_eq!(history_count(&db).await?, 6);

        Ok(())
    }

    #[tokio::test]
    async fn group_update_rejects_ungrouped_reference() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let single = create_test_payable(&db, OWNER, "Internet").await?;

        let result = group_update(
            &db,
            &receipts,
            OWNER,
            single.id,
            GroupAction::ReopenAll,
            &clock,
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidGroup { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn selection_mark_paid_is_shared_and_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let first = create_test_payable(&db, OWNER, "Internet").await?;
        let second = create_test_payable(&db, OWNER, "Energia").await?;

        let action = SelectionAction::MarkPaid {
            payment_date: Some(date(2024, 2, 5)),
            payment_note: "debito".to_string(),
        };
        // Duplicated ids collapse to one record each.
        let outcome = selection_action(
            &db,
            &receipts,
            OWNER,
            &[first.id, second.id, first.id],
            action.clone(),
            &clock,
        )
        .await?;

        let SelectionOutcome::Updated(updated) = outcome else {
            panic!("expected updated outcome");
        };
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|record| record.status == PayableStatus::Paid));
        assert!(updated.iter().all(|record| record.payment_date == Some(date(2024, 2, 5))));
        assert_eq!(history_count(&db).await?, 2);

        // Re-running the same action is a no-op for the audit trail.
        selection_action(&db, &receipts, OWNER, &[first.id, second.id], action, &clock).await?;
        assert_eq!(history_count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn selection_delete_takes_whole_group() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 4).await?;
        let keeper = create_test_payable(&db, OWNER, "Internet").await?;

        let outcome = selection_action(
            &db,
            &receipts,
            OWNER,
            &[plan[1].id],
            SelectionAction::Delete,
            &clock,
        )
        .await?;

        let SelectionOutcome::Deleted(deleted_ids) = outcome else {
            panic!("expected deleted outcome");
        };
        assert_eq!(deleted_ids.len(), 4);

        let remaining = payable::list(&db, OWNER).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keeper.id);

        Ok(())
    }

    #[tokio::test]
    async fn selection_rejects_empty_and_foreign_ids() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let result =
            selection_action(&db, &receipts, OWNER, &[], SelectionAction::MarkPending, &clock).await;
        assert!(matches!(result, Err(Error::Validation { field: "payable_ids", .. })));

        let result =
            selection_action(&db, &receipts, OWNER, &[0, -3], SelectionAction::MarkPending, &clock)
                .await;
        assert!(matches!(result, Err(Error::Validation { field: "payable_ids", .. })));

        let foreign = create_test_payable(&db, OTHER_OWNER, "Energia").await?;
        let result = selection_action(
            &db,
            &receipts,
            OWNER,
            &[foreign.id],
            SelectionAction::MarkPending,
            &clock,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "payable" })));

        // The foreign record was never touched.
        let untouched = payable::get(&db, OTHER_OWNER, foreign.id).await?;
        assert_eq!(untouched.status, PayableStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn selection_mark_pending_discards_receipts() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let target = create_test_payable(&db, OWNER, "Internet").await?;
        selection_action(
            &db,
            &receipts,
            OWNER,
            &[target.id],
            SelectionAction::MarkPaid {
                payment_date: None,
                payment_note: String::new(),
            },
            &clock,
        )
        .await?;

        let path = receipts.save("payable_receipts/nota.png", b"img").await?;
        attach_receipt(&db, target.id, &path).await?;

        let outcome = selection_action(
            &db,
            &receipts,
            OWNER,
            &[target.id],
            SelectionAction::MarkPending,
            &clock,
        )
        .await?;

        let SelectionOutcome::Updated(updated) = outcome else {
            panic!("expected updated outcome");
        };
        assert_eq!(updated[0].payment_receipt, None);
        assert!(!receipts.exists(&path).await?);

        Ok(())
    }

    #[tokio::test]
    async fn group_members_stay_ordered_by_installment_number() -> Result<()> {
        let db = setup_test_db().await?;
        let (_dir, receipts) = receipt_store();
        let clock = test_clock();

        let plan = create_test_plan(&db, "Notebook", 6).await?;
        let group = group_update(
            &db,
            &receipts,
            OWNER,
            plan[5].id,
            GroupAction::PayUntil {
                until_installment: 3,
                payment_date: None,
                payment_note: String::new(),
            },
            &clock,
        )
        .await?;

        let numbers: Vec<i32> = group
            .iter()
            .filter_map(|slice| slice.installment_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

        Ok(())
    }
}
