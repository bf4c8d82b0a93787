//! Report generation - aggregation plus three renderers.
//!
//! The aggregators in [`dataset`] reduce the owner's records to one
//! normalized tabular shape ([`ReportDataset`]); the renderers serialize that
//! shape to semicolon CSV, SpreadsheetML, or a hand-assembled PDF without
//! ever touching the database. Report generation takes the evaluation date
//! from the injected clock, never from ambient time.

pub mod csv;
pub mod dataset;
pub mod pdf;
pub mod spreadsheet;

use crate::clock::Clock;
use crate::core::{bank, text};
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Which records a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Payables with status/overdue classification
    Payables,
    /// Income and expense transactions
    Cashflow,
}

impl ReportKind {
    /// Token used in filenames.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Payables => "payables",
            Self::Cashflow => "cashflow",
        }
    }
}

/// Output serialization of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Semicolon-separated UTF-8 text with byte-order mark
    Csv,
    /// Single-sheet SpreadsheetML (Excel 2003 XML)
    Excel,
    /// Hand-assembled PDF 1.4
    Pdf,
}

impl ReportFormat {
    /// File extension used in filenames.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xls",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type reported to the download layer.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Excel => "application/vnd.ms-excel",
            Self::Pdf => "application/pdf",
        }
    }
}

/// How much of the dataset a report emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    /// Aggregate summaries only
    Consolidated,
    /// Per-record rows only
    Detailed,
    /// Both rows and summaries
    Both,
}

impl DetailLevel {
    /// Token used in filenames.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Consolidated => "consolidated",
            Self::Detailed => "detailed",
            Self::Both => "both",
        }
    }

    /// Display label used inside the report body.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Consolidated => "Consolidado",
            Self::Detailed => "Detalhado",
            Self::Both => "Consolidado + detalhado",
        }
    }

    /// Whether per-record rows are emitted.
    #[must_use]
    pub const fn includes_rows(self) -> bool {
        matches!(self, Self::Detailed | Self::Both)
    }

    /// Whether the consolidated summary blocks are emitted.
    #[must_use]
    pub const fn includes_consolidated(self) -> bool {
        matches!(self, Self::Consolidated | Self::Both)
    }
}

/// The normalized tabular shape every renderer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDataset {
    /// Report title line
    pub title: String,
    /// Column headers for the detail rows
    pub headers: Vec<String>,
    /// Per-record detail rows (empty for consolidated-only reports)
    pub rows: Vec<Vec<String>>,
    /// Summary lines, including the consolidated blocks
    pub summary: Vec<String>,
}

/// A rendered report ready for download.
#[derive(Debug)]
pub struct ReportExport {
    /// Serialized report
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub content_type: &'static str,
    /// Suggested download filename
    pub file_name: String,
}

/// Builds and renders a report for the caller.
///
/// The optional bank filter must reference one of the caller's banks; the
/// period bounds are inclusive and the start must not exceed the end.
#[allow(clippy::too_many_arguments)]
pub async fn export(
    db: &DatabaseConnection,
    owner_id: i64,
    kind: ReportKind,
    format: ReportFormat,
    bank_id: Option<i64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    detail_level: DetailLevel,
    clock: &dyn Clock,
) -> Result<ReportExport> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(Error::validation(
                "end_date",
                "start date cannot be after the end date",
            ));
        }
    }

    let selected_bank = match bank_id {
        Some(id) => Some(
            bank::find_owned(db, owner_id, id)
                .await
                .map_err(|_| Error::validation("bank", "bank not found"))?,
        ),
        None => None,
    };

    let today = clock.today();
    let dataset = match kind {
        ReportKind::Payables => {
            dataset::build_payables(
                db,
                owner_id,
                selected_bank.as_ref(),
                start_date,
                end_date,
                detail_level,
                today,
            )
            .await?
        }
        ReportKind::Cashflow => {
            dataset::build_cashflow(
                db,
                owner_id,
                selected_bank.as_ref(),
                start_date,
                end_date,
                detail_level,
            )
            .await?
        }
    };

    let bytes = match format {
        ReportFormat::Csv => csv::render(&dataset, today).into_bytes(),
        ReportFormat::Excel => spreadsheet::render(&dataset, today).into_bytes(),
        ReportFormat::Pdf => pdf::render(&dataset, today),
    };
    let file_name = file_name(
        kind,
        format,
        selected_bank.as_ref().map(|bank| bank.slug.as_str()),
        start_date,
        end_date,
        detail_level,
        today,
    );

    Ok(ReportExport {
        bytes,
        content_type: format.content_type(),
        file_name,
    })
}

/// Download filename:
/// `relatorio-<kind>-<bank|todos-bancos>-<start|inicio>-<end|fim>-<detail>-<date>.<ext>`.
#[must_use]
pub fn file_name(
    kind: ReportKind,
    format: ReportFormat,
    bank_slug: Option<&str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    detail_level: DetailLevel,
    generated_on: NaiveDate,
) -> String {
    let bank_scope = bank_slug.unwrap_or("todos-bancos");
    let period_start = start_date.map_or_else(|| "inicio".to_string(), |date| date.to_string());
    let period_end = end_date.map_or_else(|| "fim".to_string(), |date| date.to_string());
    format!(
        "relatorio-{}-{}-{}-{}-{}-{}.{}",
        text::slugify(kind.token()),
        bank_scope,
        period_start,
        period_end,
        text::slugify(detail_level.token()),
        generated_on,
        format.extension(),
    )
}
