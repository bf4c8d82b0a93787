//! Semicolon-delimited text renderer.
//!
//! Layout: title row, generation-date row, blank row, header row, detail
//! rows, blank row, one row per summary line. The output starts with a UTF-8
//! byte-order mark so spreadsheet applications detect the encoding, uses `;`
//! as the field delimiter, and terminates records with CRLF.

use super::ReportDataset;
use crate::core::money::format_date_br;
use chrono::NaiveDate;

/// Renders the dataset as delimited text.
#[must_use]
pub fn render(dataset: &ReportDataset, generated_on: NaiveDate) -> String {
    let mut output = String::from("\u{feff}");

    push_row(&mut output, &[dataset.title.clone()]);
    push_row(
        &mut output,
        &[format!("Gerado em: {}", format_date_br(Some(generated_on)))],
    );
    push_row(&mut output, &[]);
    push_row(&mut output, &dataset.headers);
    for row in &dataset.rows {
        push_row(&mut output, row);
    }
    if !dataset.summary.is_empty() {
        push_row(&mut output, &[]);
        for line in &dataset.summary {
            push_row(&mut output, &[line.clone()]);
        }
    }

    output
}

fn push_row(output: &mut String, fields: &[String]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            output.push(';');
        }
        output.push_str(&escape_field(field));
    }
    output.push_str("\r\n");
}

/// Quotes a field when it contains the delimiter, a quote, or a line break.
fn escape_field(field: &str) -> String {
    if field.contains(';') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn sample_dataset() -> ReportDataset {
        ReportDataset {
            title: "Relatorio de contas a pagar - Todos os bancos - Todo periodo".to_string(),
            headers: vec!["Vencimento".to_string(), "Titulo".to_string()],
            rows: vec![vec!["10/05/2024".to_string(), "Conta de luz".to_string()]],
            summary: vec!["Total de contas: 1".to_string()],
        }
    }

    #[test]
    fn output_starts_with_byte_order_mark() {
        let output = render(&sample_dataset(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(output.starts_with('\u{feff}'));
    }

    #[test]
    fn layout_matches_expected_shape() {
        let output = render(&sample_dataset(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let body = output.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = body.split("\r\n").collect();

        assert_eq!(lines[0], "Relatorio de contas a pagar - Todos os bancos - Todo periodo");
        assert_eq!(lines[1], "Gerado em: 01/06/2024");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Vencimento;Titulo");
        assert_eq!(lines[4], "10/05/2024;Conta de luz");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "Total de contas: 1");
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a;b"), "\"a;b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
