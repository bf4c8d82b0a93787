//! Minimal PDF renderer.
//!
//! Assembles a PDF 1.4 byte stream by hand: one Helvetica font object, one
//! content stream and page object per 46 text lines, a pages tree, a catalog,
//! and a cross-reference table with 10-digit byte offsets. The text content
//! is ASCII-normalized and rendered as a monospaced-style listing (headers,
//! a rule, one line per row, then the summary). The goal is a well-formed
//! document any standard reader opens, not typographic fidelity.

use super::ReportDataset;
use crate::core::money::format_date_br;
use crate::core::text::normalize_ascii;
use chrono::NaiveDate;

/// Text lines laid out per page.
const LINES_PER_PAGE: usize = 46;

/// Maximum characters per body line before truncation.
const LINE_WIDTH: usize = 120;

/// Renders the dataset as a single- or multi-page PDF document.
#[must_use]
pub fn render(dataset: &ReportDataset, generated_on: NaiveDate) -> Vec<u8> {
    // The preamble (generation date, headers, rule) guarantees at least one
    // page even for an empty dataset.
    let lines = layout_lines(dataset, generated_on);
    let pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();

    let mut objects: Vec<String> = Vec::new();

    let font_id = push_object(
        &mut objects,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    );

    let title = normalize_ascii(&dataset.title);
    let mut content_ids = Vec::new();
    let mut page_ids = Vec::new();
    for page_lines in &pages {
        let stream = content_stream(&title, page_lines);
        let content = format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len());
        content_ids.push(push_object(&mut objects, content));
        // Placeholder: page objects need the pages-tree id, assigned below.
        page_ids.push(push_object(&mut objects, String::new()));
    }

    let pages_id = push_object(&mut objects, String::new());
    let catalog_id = push_object(
        &mut objects,
        format!("<< /Type /Catalog /Pages {pages_id} 0 R >>"),
    );

    let kids = page_ids
        .iter()
        .map(|page_id| format!("{page_id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects[pages_id - 1] = format!(
        "<< /Type /Pages /Count {} /Kids [{kids}] >>",
        page_ids.len()
    );
    for (index, page_id) in page_ids.iter().enumerate() {
        objects[page_id - 1] = format!(
            "<< /Type /Page /Parent {pages_id} 0 R /MediaBox [0 0 595 842] \
             /Resources << /Font << /F1 {font_id} 0 R >> >> \
             /Contents {} 0 R >>",
            content_ids[index]
        );
    }

    assemble(&objects, catalog_id)
}

/// Appends an object to the table, returning its 1-based object id.
fn push_object(objects: &mut Vec<String>, content: String) -> usize {
    objects.push(content);
    objects.len()
}

/// Flattens the dataset into the text lines the pages carry.
fn layout_lines(dataset: &ReportDataset, generated_on: NaiveDate) -> Vec<String> {
    let mut lines = vec![
        format!("Gerado em: {}", format_date_br(Some(generated_on))),
        String::new(),
        join_columns(&dataset.headers),
        "-".repeat(LINE_WIDTH),
    ];

    for row in &dataset.rows {
        let mut line = join_columns(row);
        if line.len() > LINE_WIDTH {
            line.truncate(LINE_WIDTH - 3);
            line.push_str("...");
        }
        lines.push(line);
    }

    if !dataset.summary.is_empty() {
        lines.push(String::new());
        lines.push("Resumo:".to_string());
        lines.extend(dataset.summary.iter().map(|item| normalize_ascii(item)));
    }

    lines
}

fn join_columns(columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| normalize_ascii(column))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// One page's content stream: the title followed by the page's lines, walked
/// downward with relative text displacements.
fn content_stream(title: &str, lines: &[String]) -> String {
    let mut stream_lines = vec![
        "BT".to_string(),
        "/F1 10 Tf".to_string(),
        "40 805 Td".to_string(),
        format!("({}) Tj", escape_text(title)),
        "0 -18 Td".to_string(),
    ];
    for line in lines {
        stream_lines.push(format!("({}) Tj", escape_text(line)));
        stream_lines.push("0 -14 Td".to_string());
    }
    stream_lines.push("ET".to_string());
    stream_lines.join("\n")
}

/// Escapes the characters with meaning inside PDF string literals.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Serializes the object table: header, numbered objects, xref with 10-digit
/// offsets, and the trailer pointing at the catalog.
fn assemble(objects: &[String], catalog_id: usize) -> Vec<u8> {
    let mut output: Vec<u8> = b"%PDF-1.4\n".to_vec();

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, content) in objects.iter().enumerate() {
        offsets.push(output.len());
        output.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        output.extend_from_slice(content.as_bytes());
        output.extend_from_slice(b"\nendobj\n");
    }

    let xref_position = output.len();
    output.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    output.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        output.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    output.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {catalog_id} 0 R >>\nstartxref\n{xref_position}\n%%EOF",
            objects.len() + 1
        )
        .as_bytes(),
    );

    output
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn sample_dataset(row_count: usize) -> ReportDataset {
        ReportDataset {
            title: "Relatorio de contas a pagar - Todos os bancos - Todo periodo".to_string(),
            headers: vec!["Vencimento".to_string(), "Titulo".to_string()],
            rows: (0..row_count)
                .map(|index| vec!["10/05/2024".to_string(), format!("Conta {index}")])
                .collect(),
            summary: vec!["Total de contas: 1".to_string()],
        }
    }

    fn generated_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn document_has_pdf_frame() {
        let bytes = render(&sample_dataset(1), generated_on());
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/MediaBox [0 0 595 842]"));
    }

    #[test]
    fn small_report_fits_one_page() {
        let bytes = render(&sample_dataset(3), generated_on());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /Pages /Count 1 "));
    }

    #[test]
    fn long_report_paginates_every_46_lines() {
        // 4 preamble lines + 60 rows + 3 summary lines = 67 lines -> 2 pages.
        let bytes = render(&sample_dataset(60), generated_on());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /Pages /Count 2 "));
    }

    #[test]
    fn xref_offsets_point_at_their_objects() {
        let bytes = render(&sample_dataset(2), generated_on());
        let text = String::from_utf8_lossy(&bytes).to_string();

        let xref_start = text.rfind("xref\n").unwrap();
        let xref_block: Vec<&str> = text[xref_start..].lines().collect();
        // xref_block: ["xref", "0 N", "0000000000 65535 f ", entries..., "trailer", ...]
        let declared: usize = xref_block[1].split(' ').nth(1).unwrap().parse().unwrap();

        for (object_id, entry) in xref_block[3..].iter().take(declared - 1).enumerate() {
            let offset: usize = entry.split(' ').next().unwrap().parse().unwrap();
            let expected = format!("{} 0 obj", object_id + 1);
            assert!(
                text[offset..].starts_with(&expected),
                "offset {offset} should start object {}",
                object_id + 1
            );
        }

        // startxref points at the xref table itself.
        let startxref: usize = text
            .lines()
            .rev()
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(startxref, xref_start);
    }

    #[test]
    fn text_lines_escape_parentheses() {
        let mut dataset = sample_dataset(1);
        dataset.rows[0][1] = "Conta (cartao)".to_string();
        let bytes = render(&dataset, generated_on());
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("Conta \\(cartao\\)"));
    }

    #[test]
    fn overlong_rows_are_truncated_with_ellipsis() {
        let mut dataset = sample_dataset(1);
        dataset.rows[0][1] = "x".repeat(200);
        let bytes = render(&dataset, generated_on());
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("...) Tj"));
        assert!(!text.contains(&"x".repeat(150)));
    }

    #[test]
    fn stream_lengths_match_their_bytes() {
        let bytes = render(&sample_dataset(2), generated_on());
        let text = String::from_utf8_lossy(&bytes).to_string();

        let mut cursor = 0;
        while let Some(position) = text[cursor..].find("/Length ") {
            let start = cursor + position + "/Length ".len();
            let end = start + text[start..].find(' ').unwrap();
            let declared: usize = text[start..end].parse().unwrap();

            let stream_start = text[end..].find("stream\n").unwrap() + end + "stream\n".len();
            let stream_end = stream_start + text[stream_start..].find("\nendstream").unwrap();
            assert_eq!(stream_end - stream_start, declared);

            cursor = stream_end;
        }
    }
}
