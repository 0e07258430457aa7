// Word (.docx) text extraction

use std::io::Cursor;

use docx_rust::document::{BodyContent, Table, TableCell, TableCellContent, TableRowContent};
use docx_rust::DocxFile;

use crate::types::ExtractionError;

/// Pull the raw text out of a WordprocessingML document.
/// Paragraphs and table cells are separated by newlines; formatting is discarded.
pub fn extract_raw_text(data: &[u8]) -> Result<String, ExtractionError> {
    let file = DocxFile::from_reader(Cursor::new(data))
        .map_err(|e| ExtractionError::MalformedDocument(format!("{:?}", e)))?;
    let docx = file
        .parse()
        .map_err(|e| ExtractionError::MalformedDocument(format!("{:?}", e)))?;

    let mut lines = Vec::new();
    collect_blocks(&docx.document.body.content, &mut lines);
    let text = lines.join("\n").replace("\r\n", "\n");
    Ok(text.trim_end().to_string())
}

fn collect_blocks(content: &[BodyContent<'_>], lines: &mut Vec<String>) {
    for block in content {
        match block {
            BodyContent::Paragraph(para) => lines.push(para.text()),
            BodyContent::Sdt(sdt) => lines.push(sdt.text()),
            BodyContent::Table(table) => collect_table(table, lines),
            BodyContent::TableCell(cell) => collect_cell(cell, lines),
            BodyContent::Run(_) | BodyContent::SectionProperty(_) => {}
        }
    }
}

/// Row by row, one line per cell paragraph
fn collect_table(table: &Table<'_>, lines: &mut Vec<String>) {
    for row in &table.rows {
        for cell in &row.cells {
            match cell {
                TableRowContent::TableCell(cell) => collect_cell(cell, lines),
                TableRowContent::SDT(sdt) => lines.push(sdt.text()),
            }
        }
    }
}

fn collect_cell(cell: &TableCell<'_>, lines: &mut Vec<String>) {
    for content in &cell.content {
        match content {
            TableCellContent::Paragraph(para) => lines.push(para.text()),
        }
    }
}
