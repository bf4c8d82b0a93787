//! Shared test utilities for finboard.
//!
//! Common fixtures: an in-memory database with the full schema, a pinned
//! clock, a throwaway receipt store, and input builders with sensible
//! defaults.

pub use crate::clock::{Clock, FixedClock};
use crate::core::event::EventInput;
use crate::core::payable::PayableInput;
use crate::entities::event::{EventImportance, EventStatus};
use crate::entities::payable::{self, PayableKind, PayableStatus};
use crate::entities::transaction::{self, TransactionType};
use crate::errors::Result;
use crate::storage::FsReceiptStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Owner id used by most tests.
pub const OWNER: i64 = 1;

/// A second owner for cross-owner isolation tests.
pub const OTHER_OWNER: i64 = 2;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Clock pinned to 2024-06-01.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::on(date(2024, 6, 1))
}

/// Shorthand for a known-valid calendar date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Creates a receipt store rooted in a throwaway temp directory. Keep the
/// `TempDir` alive for the duration of the test.
#[must_use]
pub fn receipt_store() -> (tempfile::TempDir, FsReceiptStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FsReceiptStore::new(dir.path());
    (dir, store)
}

/// Pending invoice input with sensible defaults: amount 100.00, due on the
/// pinned clock's today.
#[must_use]
pub fn payable_input(title: &str, clock: &FixedClock) -> PayableInput {
    PayableInput {
        bank_id: None,
        category_id: None,
        title: title.to_string(),
        description: String::new(),
        kind: PayableKind::Invoice,
        status: PayableStatus::Pending,
        amount: dec!(100.00),
        due_date: clock.today(),
        payment_date: None,
        payment_note: String::new(),
        installment_number: None,
        installment_total: None,
        is_recurring: false,
    }
}

/// Installment-plan input: current installment 1 of `total`, due 2024-01-10.
#[must_use]
pub fn installment_input(title: &str, amount: Decimal, total: i32) -> PayableInput {
    PayableInput {
        bank_id: None,
        category_id: None,
        title: title.to_string(),
        description: String::new(),
        kind: PayableKind::Installment,
        status: PayableStatus::Pending,
        amount,
        due_date: date(2024, 1, 10),
        payment_date: None,
        payment_note: String::new(),
        installment_number: Some(1),
        installment_total: Some(total),
        is_recurring: false,
    }
}

/// Event input with sensible defaults starting the day after the pinned
/// clock.
#[must_use]
pub fn event_input(title: &str, clock: &FixedClock) -> EventInput {
    EventInput {
        title: title.to_string(),
        creator_name: String::new(),
        starts_at: clock.now() + chrono::Duration::days(1),
        ends_at: None,
        description: String::new(),
        location: String::new(),
        color: "#4F46E5".to_string(),
        status: EventStatus::Pending,
        importance: EventImportance::Medium,
        reminder_minutes_before: 60,
        all_day: false,
    }
}

/// Creates a pending invoice payable through the public create path.
pub async fn create_test_payable(
    db: &DatabaseConnection,
    owner_id: i64,
    title: &str,
) -> Result<payable::Model> {
    let clock = test_clock();
    let created = crate::core::payable::create(db, owner_id, payable_input(title, &clock), &clock)
        .await?;
    Ok(created.into_iter().next().expect("created payable"))
}

/// Creates an expense transaction of 100.00 on 2024-05-15.
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    owner_id: i64,
    bank_id: i64,
    clock: &FixedClock,
) -> Result<transaction::Model> {
    crate::core::transaction::create(
        db,
        owner_id,
        crate::core::transaction::TransactionInput {
            bank_id,
            title: "Mercado".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Expense,
            amount: dec!(100.00),
            transaction_date: date(2024, 5, 15),
        },
        clock,
    )
    .await
}

/// Inserts a pre-group-era installment row directly: kind installment,
/// `installment_total` set, but no group id. Exactly what the legacy
/// normalizer scans for.
pub async fn create_legacy_installment(
    db: &DatabaseConnection,
    owner_id: i64,
    title: &str,
    amount: Decimal,
    installment_number: Option<i32>,
    installment_total: i32,
    due_date: NaiveDate,
) -> Result<payable::Model> {
    let now = test_clock().now();
    let model = payable::ActiveModel {
        owner_id: Set(owner_id),
        bank_id: Set(None),
        category_id: Set(None),
        title: Set(title.to_string()),
        description: Set(String::new()),
        kind: Set(PayableKind::Installment),
        status: Set(PayableStatus::Pending),
        amount: Set(amount),
        due_date: Set(due_date),
        payment_date: Set(None),
        payment_note: Set(String::new()),
        payment_receipt: Set(None),
        installment_number: Set(installment_number),
        installment_total: Set(Some(installment_total)),
        installment_group: Set(None),
        is_recurring: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Points a payable's receipt reference at an already-stored blob path.
pub async fn attach_receipt(
    db: &DatabaseConnection,
    payable_id: i64,
    path: &str,
) -> Result<()> {
    let payable = crate::entities::Payable::find_by_id(payable_id)
        .one(db)
        .await?
        .expect("payable to attach receipt to");
    let mut active: payable::ActiveModel = payable.into();
    active.payment_receipt = Set(Some(path.to_string()));
    active.update(db).await?;
    Ok(())
}
