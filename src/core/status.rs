//! Payable status engine and history recorder.
//!
//! Status transitions are computed in memory as pure functions: callers
//! snapshot the payable first, apply the change, persist the result, and
//! persist the history entry the diff produced (if any). This keeps the same
//! transition logic usable from the single-record endpoints and from the bulk
//! coordinator, which batches its writes.

use crate::entities::payable::{self, PayableStatus};
use crate::entities::payable_status_history;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::Set;

/// The tracked fields of a payable, captured before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Status at capture time
    pub status: PayableStatus,
    /// Payment date at capture time
    pub payment_date: Option<NaiveDate>,
    /// Payment note at capture time
    pub payment_note: String,
}

/// A requested status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// Target status
    pub status: PayableStatus,
    /// Payment date to record; `None` keeps the existing date (or defaults to
    /// today when the payable had none)
    pub payment_date: Option<NaiveDate>,
    /// Payment note to record; `None` preserves the existing note, while
    /// `Some("")` explicitly clears it
    pub payment_note: Option<String>,
    /// Whether a pending transition should also drop the receipt reference
    pub clear_receipt: bool,
}

impl StatusChange {
    /// Transition to paid with the given payment fields.
    #[must_use]
    pub const fn paid(payment_date: Option<NaiveDate>, payment_note: Option<String>) -> Self {
        Self {
            status: PayableStatus::Paid,
            payment_date,
            payment_note,
            clear_receipt: false,
        }
    }

    /// Transition to pending, optionally dropping the receipt reference.
    #[must_use]
    pub const fn pending(clear_receipt: bool) -> Self {
        Self {
            status: PayableStatus::Pending,
            payment_date: None,
            payment_note: None,
            clear_receipt,
        }
    }
}

/// Captures the tracked fields of `payable` before it is mutated.
#[must_use]
pub fn snapshot(payable: &payable::Model) -> StatusSnapshot {
    StatusSnapshot {
        status: payable.status,
        payment_date: payable.payment_date,
        payment_note: payable.payment_note.clone(),
    }
}

/// Applies a status transition in memory and returns the updated model.
///
/// Paid: the payment date falls back to the existing one, then to `today`;
/// the note is trimmed when provided and preserved when the argument is
/// absent. Pending: payment date and note are cleared unconditionally, and
/// the receipt reference is dropped when requested (deleting the blob itself
/// is the caller's responsibility). Persistence is always the caller's
/// responsibility.
#[must_use]
pub fn apply_status(
    payable: &payable::Model,
    change: &StatusChange,
    today: NaiveDate,
) -> payable::Model {
    let mut updated = payable.clone();
    updated.status = change.status;

    match change.status {
        PayableStatus::Paid => {
            updated.payment_date = change
                .payment_date
                .or(payable.payment_date)
                .or(Some(today));
            if let Some(note) = &change.payment_note {
                updated.payment_note = note.trim().to_string();
            }
        }
        PayableStatus::Pending => {
            updated.payment_date = None;
            updated.payment_note = String::new();
            if change.clear_receipt {
                updated.payment_receipt = None;
            }
        }
    }

    updated
}

/// Builds the audit entry for a transition, or `None` when nothing tracked
/// changed. Receipt changes alone never produce an entry.
#[must_use]
pub fn build_history_entry(
    after: &payable::Model,
    before: &StatusSnapshot,
    source: &str,
    changed_by: Option<i64>,
    now: DateTime<Utc>,
) -> Option<payable_status_history::ActiveModel> {
    let has_change = before.status != after.status
        || before.payment_date != after.payment_date
        || before.payment_note != after.payment_note;
    if !has_change {
        return None;
    }

    Some(payable_status_history::ActiveModel {
        payable_id: Set(after.id),
        previous_status: Set(before.status),
        new_status: Set(after.status),
        previous_payment_date: Set(before.payment_date),
        new_payment_date: Set(after.payment_date),
        previous_payment_note: Set(before.payment_note.clone()),
        new_payment_note: Set(after.payment_note.clone()),
        source: Set(source.to_string()),
        changed_by: Set(changed_by),
        changed_at: Set(now),
        ..Default::default()
    })
}
