//! SpreadsheetML renderer (Excel 2003 XML).
//!
//! Produces a minimal single-worksheet workbook with four named styles
//! (title, header, meta, cell) and the same row layout as the delimited-text
//! renderer. Every cell value is emitted as an XML-escaped string.

use super::ReportDataset;
use crate::core::money::format_date_br;
use chrono::NaiveDate;

/// Renders the dataset as a single-sheet SpreadsheetML document.
#[must_use]
pub fn render(dataset: &ReportDataset, generated_on: NaiveDate) -> String {
    let mut xml_rows = Vec::new();
    xml_rows.push(format!("<Row>{}</Row>", cell(&dataset.title, "title")));
    xml_rows.push(format!(
        "<Row>{}</Row>",
        cell(&format!("Gerado em: {}", format_date_br(Some(generated_on))), "meta")
    ));
    xml_rows.push("<Row></Row>".to_string());
    xml_rows.push(format!(
        "<Row>{}</Row>",
        dataset
            .headers
            .iter()
            .map(|header| cell(header, "header"))
            .collect::<String>()
    ));

    for row in &dataset.rows {
        xml_rows.push(format!(
            "<Row>{}</Row>",
            row.iter().map(|value| cell(value, "cell")).collect::<String>()
        ));
    }

    if !dataset.summary.is_empty() {
        xml_rows.push("<Row></Row>".to_string());
        for line in &dataset.summary {
            xml_rows.push(format!("<Row>{}</Row>", cell(line, "meta")));
        }
    }

    let worksheet = xml_rows.join("\n");
    format!(
        r#"<?xml version="1.0"?>
<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet"
 xmlns:o="urn:schemas-microsoft-com:office:office"
 xmlns:x="urn:schemas-microsoft-com:office:excel"
 xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
 <Styles>
  <Style ss:ID="title"><Font ss:Bold="1" ss:Size="13"/></Style>
  <Style ss:ID="header"><Font ss:Bold="1"/></Style>
  <Style ss:ID="meta"><Font ss:Italic="1"/></Style>
  <Style ss:ID="cell"></Style>
 </Styles>
 <Worksheet ss:Name="Relatorio">
  <Table>
{worksheet}
  </Table>
 </Worksheet>
</Workbook>
"#
    )
}

fn cell(value: &str, style_id: &str) -> String {
    format!(
        r#"<Cell ss:StyleID="{style_id}"><Data ss:Type="String">{}</Data></Cell>"#,
        escape_xml(value)
    )
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
