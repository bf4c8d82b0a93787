//! Report aggregators - reduce owner records to the normalized dataset.
//!
//! Both builders filter by owner, optional bank, and an inclusive date range,
//! walk the records in deterministic order (date then id), and accumulate the
//! consolidated totals in sorted maps so the summary blocks come out
//! alphabetically regardless of insertion order.

use super::{DetailLevel, ReportDataset};
use crate::core::money::{format_currency_brl, format_date_br};
use crate::entities::bank as bank_entity;
use crate::entities::payable::{self, PayableStatus};
use crate::entities::payable_category;
use crate::entities::transaction::{self, TransactionType};
use crate::entities::{Bank, Payable, PayableCategory, Transaction};
use crate::errors::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{BTreeMap, HashMap};

/// Fallback bank label for records without one.
const NO_BANK: &str = "Sem banco";

/// Builds the payables report: one row per payable in scope, classified as
/// paid, overdue (due before `today` and unpaid), or pending, with totals per
/// status, bank, and category.
pub async fn build_payables(
    db: &DatabaseConnection,
    owner_id: i64,
    selected_bank: Option<&bank_entity::Model>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    detail_level: DetailLevel,
    today: NaiveDate,
) -> Result<ReportDataset> {
    let mut query = Payable::find()
        .filter(payable::Column::OwnerId.eq(owner_id))
        .order_by_asc(payable::Column::DueDate)
        .order_by_asc(payable::Column::Id);
    if let Some(bank) = selected_bank {
        query = query.filter(payable::Column::BankId.eq(bank.id));
    }
    if let Some(start) = start_date {
        query = query.filter(payable::Column::DueDate.gte(start));
    }
    if let Some(end) = end_date {
        query = query.filter(payable::Column::DueDate.lte(end));
    }
    let records = query.all(db).await?;

    let bank_names = bank_name_map(db, owner_id).await?;
    let category_names: HashMap<i64, String> = PayableCategory::find()
        .filter(payable_category::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();

    let headers = Vec::from(
        [
            "Vencimento",
            "Titulo",
            "Categoria",
            "Banco",
            "Status",
            "Parcela",
            "Valor",
            "Data pagamento",
            "Obs pagamento",
            "Descricao",
        ]
        .map(str::to_string),
    );

    let mut detailed_rows = Vec::new();
    let mut total_pending = Decimal::ZERO;
    let mut total_overdue = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut by_bank: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_status: BTreeMap<String, Decimal> = BTreeMap::new();

    for record in &records {
        let status_label = payable_status_label(record, today);
        let installment_label = match (record.installment_number, record.installment_total) {
            (Some(number), Some(total)) => format!("{number}/{total}"),
            _ => "-".to_string(),
        };
        let bank_name = record
            .bank_id
            .and_then(|id| bank_names.get(&id).cloned())
            .unwrap_or_else(|| NO_BANK.to_string());
        let category_name = record
            .category_id
            .and_then(|id| category_names.get(&id).cloned())
            .unwrap_or_else(|| record.kind.label().to_string());

        detailed_rows.push(vec![
            format_date_br(Some(record.due_date)),
            record.title.clone(),
            category_name.clone(),
            bank_name.clone(),
            status_label.to_string(),
            installment_label,
            format_currency_brl(record.amount),
            format_date_br(record.payment_date),
            if record.payment_note.is_empty() { "-".to_string() } else { record.payment_note.clone() },
            if record.description.is_empty() { "-".to_string() } else { record.description.clone() },
        ]);

        *by_bank.entry(bank_name).or_default() += record.amount;
        *by_category.entry(category_name).or_default() += record.amount;
        *by_status.entry(status_label.to_string()).or_default() += record.amount;
        match status_label {
            "Pago" => total_paid += record.amount,
            "Vencida" => total_overdue += record.amount,
            _ => total_pending += record.amount,
        }
    }

    let total_amount = total_pending + total_overdue + total_paid;
    let mut summary = vec![
        format!("Visao: {}", detail_level.label()),
        format!("Periodo: {}", period_label(start_date, end_date)),
        format!("Total de contas: {}", detailed_rows.len()),
        format!("Total pendente: {}", format_currency_brl(total_pending)),
        format!("Total vencido: {}", format_currency_brl(total_overdue)),
        format!("Total pago: {}", format_currency_brl(total_paid)),
        format!("Total geral: {}", format_currency_brl(total_amount)),
    ];
    if detail_level.includes_consolidated() {
        summary.push("Consolidado por banco:".to_string());
        summary.extend(consolidated_lines(&by_bank));
        summary.push("Consolidado por categoria:".to_string());
        summary.extend(consolidated_lines(&by_category));
        summary.push("Consolidado por status:".to_string());
        summary.extend(consolidated_lines(&by_status));
    }

    let scope = selected_bank.map_or("Todos os bancos", |bank| bank.name.as_str());
    Ok(ReportDataset {
        title: format!(
            "Relatorio de contas a pagar - {scope} - {}",
            period_label(start_date, end_date)
        ),
        headers,
        rows: if detail_level.includes_rows() { detailed_rows } else { Vec::new() },
        summary,
    })
}

/// Builds the cashflow report: one row per transaction in scope, with income
/// and expense totals, a signed balance per bank, and totals per type.
pub async fn build_cashflow(
    db: &DatabaseConnection,
    owner_id: i64,
    selected_bank: Option<&bank_entity::Model>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    detail_level: DetailLevel,
) -> Result<ReportDataset> {
    let mut query = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .order_by_asc(transaction::Column::TransactionDate)
        .order_by_asc(transaction::Column::Id);
    if let Some(bank) = selected_bank {
        query = query.filter(transaction::Column::BankId.eq(bank.id));
    }
    if let Some(start) = start_date {
        query = query.filter(transaction::Column::TransactionDate.gte(start));
    }
    if let Some(end) = end_date {
        query = query.filter(transaction::Column::TransactionDate.lte(end));
    }
    let records = query.all(db).await?;

    let bank_names = bank_name_map(db, owner_id).await?;

    let headers = Vec::from(
        ["Data", "Titulo", "Tipo", "Banco", "Valor", "Descricao"].map(str::to_string),
    );

    let mut detailed_rows = Vec::new();
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut by_bank: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_type: BTreeMap<String, Decimal> = BTreeMap::new();

    for record in &records {
        let bank_name = bank_names
            .get(&record.bank_id)
            .cloned()
            .unwrap_or_else(|| NO_BANK.to_string());
        let type_name = record.transaction_type.label();

        detailed_rows.push(vec![
            format_date_br(Some(record.transaction_date)),
            record.title.clone(),
            type_name.to_string(),
            bank_name.clone(),
            format_currency_brl(record.amount),
            if record.description.is_empty() { "-".to_string() } else { record.description.clone() },
        ]);

        let signed = match record.transaction_type {
            TransactionType::Income => record.amount,
            TransactionType::Expense => -record.amount,
        };
        *by_bank.entry(bank_name).or_default() += signed;
        *by_type.entry(type_name.to_string()).or_default() += record.amount;
        match record.transaction_type {
            TransactionType::Income => total_income += record.amount,
            TransactionType::Expense => total_expense += record.amount,
        }
    }

    let mut summary = vec![
        format!("Visao: {}", detail_level.label()),
        format!("Periodo: {}", period_label(start_date, end_date)),
        format!("Total de transacoes: {}", detailed_rows.len()),
        format!("Entradas: {}", format_currency_brl(total_income)),
        format!("Saidas: {}", format_currency_brl(total_expense)),
        format!("Saldo: {}", format_currency_brl(total_income - total_expense)),
    ];
    if detail_level.includes_consolidated() {
        summary.push("Consolidado por banco (saldo):".to_string());
        summary.extend(consolidated_lines(&by_bank));
        summary.push("Consolidado por tipo:".to_string());
        summary.extend(consolidated_lines(&by_type));
    }

    let scope = selected_bank.map_or("Todos os bancos", |bank| bank.name.as_str());
    Ok(ReportDataset {
        title: format!(
            "Relatorio de entradas e saidas - {scope} - {}",
            period_label(start_date, end_date)
        ),
        headers,
        rows: if detail_level.includes_rows() { detailed_rows } else { Vec::new() },
        summary,
    })
}

/// Report classification of a payable for a given evaluation date.
fn payable_status_label(record: &payable::Model, today: NaiveDate) -> &'static str {
    if record.status == PayableStatus::Paid {
        "Pago"
    } else if record.due_date < today {
        "Vencida"
    } else {
        "Pendente"
    }
}

/// Human-readable period description for titles and summaries.
fn period_label(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> String {
    match (start_date, end_date) {
        (None, None) => "Todo periodo".to_string(),
        (Some(start), Some(end)) => {
            format!("{} a {}", format_date_br(Some(start)), format_date_br(Some(end)))
        }
        (Some(start), None) => format!("A partir de {}", format_date_br(Some(start))),
        (None, Some(end)) => format!("Ate {}", format_date_br(Some(end))),
    }
}

fn consolidated_lines(totals: &BTreeMap<String, Decimal>) -> Vec<String> {
    totals
        .iter()
        .map(|(key, amount)| format!("- {key}: {}", format_currency_brl(*amount)))
        .collect()
}

async fn bank_name_map(db: &DatabaseConnection, owner_id: i64) -> Result<HashMap<i64, String>> {
    Ok(Bank::find()
        .filter(bank_entity::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?
        .into_iter()
        .map(|bank| (bank.id, bank.name))
        .collect())
}
