//! Payable lifecycle - creation, form updates, status transitions, deletion,
//! receipts, and the audit-history listing.
//!
//! All operations are owner-scoped: a payable owned by someone else behaves
//! exactly like a missing one. Every mutating entry point runs inside one
//! database transaction, with the before-snapshot taken inside the same
//! transaction as the mutation so the audit trail always reflects a
//! consistent before/after pair.

use crate::clock::Clock;
use crate::core::installment;
use crate::core::status::{self, StatusChange};
use crate::entities::payable::{self, PayableKind, PayableStatus};
use crate::entities::{payable_status_history, Payable, PayableStatusHistory};
use crate::errors::{Error, Result};
use crate::storage::ReceiptStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

/// Receipt uploads accept only these extensions (lowercase, with dot).
pub const ALLOWED_RECEIPT_EXTENSIONS: [&str; 5] = [".pdf", ".png", ".jpg", ".jpeg", ".webp"];

/// Receipt uploads are capped at 8 MiB.
pub const MAX_RECEIPT_BYTES: usize = 8 * 1024 * 1024;

/// History listings return at most this many entries.
const HISTORY_LIMIT: u64 = 120;

/// Smallest accepted amount: one cent.
const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Caller-supplied fields for creating or updating a payable.
#[derive(Debug, Clone)]
pub struct PayableInput {
    /// Bank the payment comes out of, owned by the caller
    pub bank_id: Option<i64>,
    /// Category label, owned by the caller
    pub category_id: Option<i64>,
    /// Title (trimmed; must not be empty)
    pub title: String,
    /// Description (trimmed; may be empty)
    pub description: String,
    /// Payable kind
    pub kind: PayableKind,
    /// Desired status
    pub status: PayableStatus,
    /// Amount; for installment kind this is the plan's total amount
    pub amount: Decimal,
    /// Due date; for installment kind, the due date of the current slice
    pub due_date: NaiveDate,
    /// Payment date, meaningful only when status is paid
    pub payment_date: Option<NaiveDate>,
    /// Payment note, meaningful only when status is paid
    pub payment_note: String,
    /// Current installment number (installment kind only)
    pub installment_number: Option<i32>,
    /// Total installments in the plan (installment kind only)
    pub installment_total: Option<i32>,
    /// Auto-renew flag, meaningful only for subscriptions
    pub is_recurring: bool,
}

/// Normalizes and validates a [`PayableInput`], mirroring the model-level
/// rules: installment fields are required for the installment kind and
/// cleared for every other kind, the recurring flag only survives on
/// subscriptions, and payment fields are forced consistent with the status.
pub fn clean_input(mut input: PayableInput, today: NaiveDate) -> Result<PayableInput> {
    input.title = input.title.trim().to_string();
    input.description = input.description.trim().to_string();
    input.payment_note = input.payment_note.trim().to_string();

    if input.title.is_empty() {
        return Err(Error::validation("title", "title cannot be empty"));
    }
    if input.amount < MIN_AMOUNT {
        return Err(Error::validation("amount", "amount must be at least 0.01"));
    }

    if input.kind == PayableKind::Installment {
        let total = input
            .installment_total
            .ok_or_else(|| Error::validation("installment_total", "installment total is required"))?;
        if total < 1 {
            return Err(Error::validation(
                "installment_total",
                "installment total must be at least 1",
            ));
        }
        let number = input.installment_number.unwrap_or(1);
        if number < 1 {
            return Err(Error::validation(
                "installment_number",
                "installment number must be at least 1",
            ));
        }
        if number > total {
            return Err(Error::validation(
                "installment_number",
                "current installment cannot exceed the total",
            ));
        }
        input.installment_number = Some(number);
    } else {
        input.installment_number = None;
        input.installment_total = None;
    }

    if input.kind != PayableKind::Subscription {
        input.is_recurring = false;
    }

    match input.status {
        PayableStatus::Paid => {
            if input.payment_date.is_none() {
                input.payment_date = Some(today);
            }
        }
        PayableStatus::Pending => {
            input.payment_date = None;
            input.payment_note = String::new();
        }
    }

    Ok(input)
}

/// Ensures any referenced bank/category is owned by the caller.
pub(crate) async fn validate_references<C>(
    db: &C,
    owner_id: i64,
    input: &PayableInput,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if let Some(bank_id) = input.bank_id {
        crate::core::bank::find_owned(db, owner_id, bank_id)
            .await
            .map_err(|_| Error::validation("bank", "bank does not belong to this user"))?;
    }
    if let Some(category_id) = input.category_id {
        crate::core::category::find_owned(db, owner_id, category_id)
            .await
            .map_err(|_| Error::validation("category", "category does not belong to this user"))?;
    }
    Ok(())
}

/// Looks up a payable scoped to its owner, treating foreign records as absent.
pub(crate) async fn find_owned<C>(db: &C, owner_id: i64, payable_id: i64) -> Result<payable::Model>
where
    C: ConnectionTrait,
{
    Payable::find_by_id(payable_id)
        .filter(payable::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "payable" })
}

/// Members of an installment group, ordered by installment number then id.
pub(crate) async fn load_group<C>(
    db: &C,
    owner_id: i64,
    group: Uuid,
) -> Result<Vec<payable::Model>>
where
    C: ConnectionTrait,
{
    Payable::find()
        .filter(payable::Column::OwnerId.eq(owner_id))
        .filter(payable::Column::InstallmentGroup.eq(group))
        .order_by_asc(payable::Column::InstallmentNumber)
        .order_by_asc(payable::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes the receipt blob referenced by `payable`, if any. Blob-store
/// failures are logged and swallowed so the surrounding row mutation still
/// completes (best-effort cleanup).
pub(crate) async fn discard_receipt_blob(receipts: &dyn ReceiptStore, payable: &payable::Model) {
    if let Some(path) = &payable.payment_receipt {
        if let Err(error) = receipts.delete(path).await {
            warn!(payable_id = payable.id, %path, %error, "failed to delete receipt blob");
        }
    }
}

/// Creates a payable. Installment kind fans out into a full plan (one record
/// per installment, all sharing a fresh group id); every other kind inserts a
/// single record. Returns the created records ordered by installment number.
pub async fn create(
    db: &DatabaseConnection,
    owner_id: i64,
    input: PayableInput,
    clock: &dyn Clock,
) -> Result<Vec<payable::Model>> {
    if input.kind == PayableKind::Installment {
        return installment::create_plan(db, owner_id, input, clock).await;
    }

    let input = clean_input(input, clock.today())?;
    validate_references(db, owner_id, &input).await?;

    let now = clock.now();
    let model = payable::ActiveModel {
        owner_id: Set(owner_id),
        bank_id: Set(input.bank_id),
        category_id: Set(input.category_id),
        title: Set(input.title),
        description: Set(input.description),
        kind: Set(input.kind),
        status: Set(input.status),
        amount: Set(input.amount),
        due_date: Set(input.due_date),
        payment_date: Set(input.payment_date),
        payment_note: Set(input.payment_note),
        payment_receipt: Set(None),
        installment_number: Set(None),
        installment_total: Set(None),
        installment_group: Set(None),
        is_recurring: Set(input.is_recurring),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(vec![model.insert(db).await?])
}

/// Applies a full form update to an existing payable, recording a
/// `form_update` history entry when the tracked fields changed. Moving a
/// payable back to pending drops its receipt.
pub async fn update(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_id: i64,
    input: PayableInput,
    clock: &dyn Clock,
) -> Result<(payable::Model, Option<payable_status_history::Model>)> {
    let input = clean_input(input, clock.today())?;
    validate_references(db, owner_id, &input).await?;

    let txn = db.begin().await?;
    let existing = find_owned(&txn, owner_id, payable_id).await?;
    let before = status::snapshot(&existing);

    // The group identity survives a form update only while the payable stays
    // an installment.
    let keeps_group = input.kind == PayableKind::Installment;
    let drops_receipt = input.status == PayableStatus::Pending && existing.payment_receipt.is_some();

    let now = clock.now();
    let mut active: payable::ActiveModel = existing.clone().into();
    active.bank_id = Set(input.bank_id);
    active.category_id = Set(input.category_id);
    active.title = Set(input.title);
    active.description = Set(input.description);
    active.kind = Set(input.kind);
    active.status = Set(input.status);
    active.amount = Set(input.amount);
    active.due_date = Set(input.due_date);
    active.payment_date = Set(input.payment_date);
    active.payment_note = Set(input.payment_note);
    active.installment_number = Set(input.installment_number);
    active.installment_total = Set(input.installment_total);
    active.installment_group = Set(if keeps_group {
        existing.installment_group
    } else {
        None
    });
    active.is_recurring = Set(input.is_recurring);
    if drops_receipt {
        active.payment_receipt = Set(None);
    }
    active.updated_at = Set(now);

    let updated = active.update(&txn).await?;
    let history = match status::build_history_entry(&updated, &before, "form_update", Some(owner_id), now)
    {
        Some(entry) => Some(entry.insert(&txn).await?),
        None => None,
    };
    txn.commit().await?;

    if drops_receipt {
        discard_receipt_blob(receipts, &existing).await;
    }

    Ok((updated, history))
}

/// Applies a status transition to one payable: the `apply-status` entry
/// point. Marking pending clears the payment fields and drops the receipt;
/// marking paid fills the payment date (given, existing, or today) and the
/// note (given, or preserved when the argument is `None`). Records a
/// `status_update` history entry when something tracked changed.
pub async fn update_status(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_id: i64,
    new_status: PayableStatus,
    payment_date: Option<NaiveDate>,
    payment_note: Option<String>,
    clock: &dyn Clock,
) -> Result<(payable::Model, Option<payable_status_history::Model>)> {
    let change = match new_status {
        PayableStatus::Paid => StatusChange::paid(payment_date, payment_note),
        PayableStatus::Pending => StatusChange::pending(true),
    };

    let txn = db.begin().await?;
    let existing = find_owned(&txn, owner_id, payable_id).await?;
    let before = status::snapshot(&existing);

    let mut updated = status::apply_status(&existing, &change, clock.today());
    updated.updated_at = clock.now();

    let mut active: payable::ActiveModel = existing.clone().into();
    active.status = Set(updated.status);
    active.payment_date = Set(updated.payment_date);
    active.payment_note = Set(updated.payment_note.clone());
    active.payment_receipt = Set(updated.payment_receipt.clone());
    active.updated_at = Set(updated.updated_at);
    let updated = active.update(&txn).await?;

    let history = match status::build_history_entry(
        &updated,
        &before,
        "status_update",
        Some(owner_id),
        clock.now(),
    ) {
        Some(entry) => Some(entry.insert(&txn).await?),
        None => None,
    };
    txn.commit().await?;

    if new_status == PayableStatus::Pending && existing.payment_receipt.is_some() {
        discard_receipt_blob(receipts, &existing).await;
    }

    Ok((updated, history))
}

/// Deletes a payable. A grouped installment takes its entire group with it -
/// single-record deletion is not possible once grouped. Receipts are removed
/// alongside the rows. Returns the ids that were deleted.
pub async fn delete(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_id: i64,
) -> Result<Vec<i64>> {
    let txn = db.begin().await?;
    let target = find_owned(&txn, owner_id, payable_id).await?;

    let members = match (target.kind, target.installment_group) {
        (PayableKind::Installment, Some(group)) => load_group(&txn, owner_id, group).await?,
        _ => vec![target],
    };

    let deleted_ids: Vec<i64> = members.iter().map(|member| member.id).collect();
    Payable::delete_many()
        .filter(payable::Column::OwnerId.eq(owner_id))
        .filter(payable::Column::Id.is_in(deleted_ids.clone()))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    for member in &members {
        discard_receipt_blob(receipts, member).await;
    }

    Ok(deleted_ids)
}

/// Looks up one payable owned by the caller.
pub async fn get(
    db: &DatabaseConnection,
    owner_id: i64,
    payable_id: i64,
) -> Result<payable::Model> {
    find_owned(db, owner_id, payable_id).await
}

/// Lists the caller's payables ordered by due date then id.
pub async fn list(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<payable::Model>> {
    Payable::find()
        .filter(payable::Column::OwnerId.eq(owner_id))
        .order_by_asc(payable::Column::DueDate)
        .order_by_asc(payable::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the audit history of a payable, newest first, capped at 120 entries.
pub async fn history(
    db: &DatabaseConnection,
    owner_id: i64,
    payable_id: i64,
) -> Result<Vec<payable_status_history::Model>> {
    let payable = find_owned(db, owner_id, payable_id).await?;

    PayableStatusHistory::find()
        .filter(payable_status_history::Column::PayableId.eq(payable.id))
        .order_by_desc(payable_status_history::Column::ChangedAt)
        .order_by_desc(payable_status_history::Column::Id)
        .limit(HISTORY_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Attaches a receipt to a paid payable, replacing any previous one. The
/// upload must use an allowed extension and stay under the size cap.
pub async fn upload_receipt(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_id: i64,
    file_name: &str,
    bytes: &[u8],
    clock: &dyn Clock,
) -> Result<payable::Model> {
    let payable = find_owned(db, owner_id, payable_id).await?;
    if payable.status != PayableStatus::Paid {
        return Err(Error::validation(
            "receipt",
            "mark the payable as paid before attaching a receipt",
        ));
    }

    let base_name = std::path::Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let extension = std::path::Path::new(base_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{}", extension.to_lowercase()))
        .unwrap_or_default();
    if !ALLOWED_RECEIPT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::validation(
            "receipt",
            "invalid format; use PDF, PNG, JPG, JPEG or WEBP",
        ));
    }
    if bytes.len() > MAX_RECEIPT_BYTES {
        return Err(Error::validation("receipt", "file too large; the limit is 8MB"));
    }

    // Write the new blob and point the row at it before discarding the old
    // one, so a failed write never leaves the row referencing a deleted blob.
    let today = clock.today();
    let suggested = format!(
        "payable_receipts/{}/{}",
        today.format("%Y/%m"),
        base_name
    );
    let stored_path = receipts.save(&suggested, bytes).await?;

    let mut active: payable::ActiveModel = payable.clone().into();
    active.payment_receipt = Set(Some(stored_path));
    active.updated_at = Set(clock.now());
    let updated = active.update(db).await?;

    discard_receipt_blob(receipts, &payable).await;

    Ok(updated)
}

/// Detaches and deletes the receipt of a payable.
pub async fn delete_receipt(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_id: i64,
    clock: &dyn Clock,
) -> Result<payable::Model> {
    let payable = find_owned(db, owner_id, payable_id).await?;
    if payable.payment_receipt.is_none() {
        return Err(Error::validation("receipt", "no receipt attached to this payable"));
    }

    discard_receipt_blob(receipts, &payable).await;

    let mut active: payable::ActiveModel = payable.into();
    active.payment_receipt = Set(None);
    active.updated_at = Set(clock.now());
    active.update(db).await.map_err(Into::into)
}

/// Reads back the receipt bytes of a payable, together with the stored file
/// name.
pub async fn open_receipt(
    db: &DatabaseConnection,
    receipts: &dyn ReceiptStore,
    owner_id: i64,
    payable_id: i64,
) -> Result<(Vec<u8>, String)> {
    let payable = find_owned(db, owner_id, payable_id).await?;
    let path = payable
        .payment_receipt
        .ok_or(Error::NotFound { entity: "receipt" })?;

    let bytes = receipts.open(&path).await?;
    let file_name = std::path::Path::new(&path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("receipt")
        .to_string();
    Ok((bytes, file_name))
}
