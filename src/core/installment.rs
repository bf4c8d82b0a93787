//! Installment plan builder and legacy-data normalizer.
//!
//! A plan splits one total amount into monthly slices that share an opaque
//! group id. The builder creates complete plans; the normalizer upgrades
//! pre-group records (imported from the era before group ids existed) into
//! the same shape, synthesizing any slices the legacy data lost.

use crate::clock::Clock;
use crate::core::{money, payable, schedule};
use crate::entities::payable::{self as payable_entity, PayableKind, PayableStatus};
use crate::entities::Payable;
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use uuid::Uuid;

/// Creates a full installment plan from the caller's view of one slice.
///
/// The input carries the plan's total amount, the due date and payment state
/// of the *current* installment, and the current/total installment numbers.
/// Every other slice is created pending with empty payment fields, its due
/// date shifted by whole calendar months from the current one. All records
/// are inserted atomically and share a freshly generated group id.
///
/// Returns the created records ordered by installment number; exactly
/// `installment_total` of them, summing to the input amount.
pub async fn create_plan(
    db: &DatabaseConnection,
    owner_id: i64,
    input: payable::PayableInput,
    clock: &dyn Clock,
) -> Result<Vec<payable_entity::Model>> {
    let input = payable::clean_input(input, clock.today())?;
    if input.kind != PayableKind::Installment {
        return Err(Error::validation(
            "kind",
            "installment plans require the installment kind",
        ));
    }
    payable::validate_references(db, owner_id, &input).await?;

    let total = input
        .installment_total
        .ok_or_else(|| Error::validation("installment_total", "installment total is required"))?;
    let current = input.installment_number.unwrap_or(1);
    let amounts = money::split_amount(input.amount, u32::try_from(total).unwrap_or(1));

    let group_id = Uuid::new_v4();
    let now = clock.now();
    let records: Vec<payable_entity::ActiveModel> = amounts
        .iter()
        .enumerate()
        .map(|(index, amount)| {
            let number = i32::try_from(index).unwrap_or(0) + 1;
            let is_current = number == current;
            let status = if is_current { input.status } else { PayableStatus::Pending };
            let is_current_paid = is_current && input.status == PayableStatus::Paid;

            payable_entity::ActiveModel {
                owner_id: Set(owner_id),
                bank_id: Set(input.bank_id),
                category_id: Set(input.category_id),
                title: Set(input.title.clone()),
                description: Set(input.description.clone()),
                kind: Set(PayableKind::Installment),
                status: Set(status),
                amount: Set(*amount),
                due_date: Set(schedule::add_months(input.due_date, number - current)),
                payment_date: Set(if is_current_paid { input.payment_date } else { None }),
                payment_note: Set(if is_current_paid {
                    input.payment_note.clone()
                } else {
                    String::new()
                }),
                payment_receipt: Set(None),
                installment_number: Set(Some(number)),
                installment_total: Set(Some(total)),
                installment_group: Set(Some(group_id)),
                is_recurring: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
        })
        .collect();

    let txn = db.begin().await?;
    Payable::insert_many(records).exec(&txn).await?;
    txn.commit().await?;

    payable::load_group(db, owner_id, group_id).await
}

/// Clustering key for legacy installments: records that agree on all of
/// these fields are assumed to come from the same original plan.
type LegacyKey = (Option<i64>, String, String, Decimal, i32, NaiveDate);

/// Assigns group ids to pre-group installment records and synthesizes the
/// slices missing from each reconstructed plan.
///
/// Scans the owner's installment payables that have a total above one and no
/// group yet, clusters them by (bank, title, description, amount, total,
/// inferred plan start date), and upgrades each cluster in one transaction:
/// all found records get a fresh shared group id (missing installment
/// numbers default to 1), and absent numbers in `1..=total` become new
/// pending records following the monthly cadence. Running it again is a
/// no-op: grouped records no longer match the scan.
pub async fn normalize_legacy(
    db: &DatabaseConnection,
    owner_id: i64,
    clock: &dyn Clock,
) -> Result<()> {
    let legacy = Payable::find()
        .filter(payable_entity::Column::OwnerId.eq(owner_id))
        .filter(payable_entity::Column::Kind.eq(PayableKind::Installment))
        .filter(payable_entity::Column::InstallmentTotal.gt(1))
        .filter(payable_entity::Column::InstallmentGroup.is_null())
        .order_by_asc(payable_entity::Column::Id)
        .all(db)
        .await?;
    if legacy.is_empty() {
        return Ok(());
    }

    let mut clusters: BTreeMap<LegacyKey, Vec<payable_entity::Model>> = BTreeMap::new();
    for record in legacy {
        let number = record.installment_number.unwrap_or(1);
        let total = record.installment_total.unwrap_or(1);
        let start = schedule::plan_start_date(record.due_date, number);
        clusters
            .entry((
                record.bank_id,
                record.title.clone(),
                record.description.clone(),
                record.amount,
                total,
                start,
            ))
            .or_default()
            .push(record);
    }

    let now = clock.now();
    let txn = db.begin().await?;
    for ((bank_id, title, description, amount, total, start), members) in clusters {
        let group_id = Uuid::new_v4();
        let category_id = members.first().and_then(|member| member.category_id);
        let mut existing_numbers = BTreeSet::new();

        debug!(owner_id, %group_id, total, members = members.len(), "normalizing legacy installment cluster");

        for member in members {
            let number = member.installment_number.unwrap_or(1);
            existing_numbers.insert(number);

            let mut active: payable_entity::ActiveModel = member.into();
            active.installment_group = Set(Some(group_id));
            active.installment_number = Set(Some(number));
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let missing: Vec<payable_entity::ActiveModel> = (1..=total)
            .filter(|number| !existing_numbers.contains(number))
            .map(|number| payable_entity::ActiveModel {
                owner_id: Set(owner_id),
                bank_id: Set(bank_id),
                category_id: Set(category_id),
                title: Set(title.clone()),
                description: Set(description.clone()),
                kind: Set(PayableKind::Installment),
                status: Set(PayableStatus::Pending),
                amount: Set(amount),
                due_date: Set(schedule::add_months(start, number - 1)),
                payment_date: Set(None),
                payment_note: Set(String::new()),
                payment_receipt: Set(None),
                installment_number: Set(Some(number)),
                installment_total: Set(Some(total)),
                installment_group: Set(Some(group_id)),
                is_recurring: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            })
            .collect();
        if !missing.is_empty() {
            Payable::insert_many(missing).exec(&txn).await?;
        }
    }
    txn.commit().await?;

    Ok(())
}
