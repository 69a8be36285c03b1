use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::db::types::QuizType;
use crate::schemas::result::ResultRow;

pub(crate) const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub(crate) const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error("spreadsheet export failed: {0}")]
    Spreadsheet(#[from] XlsxError),
    #[error("document export failed: {0}")]
    Document(String),
}

pub(crate) fn scope_slug(quiz_type: Option<QuizType>) -> &'static str {
    quiz_type.map(QuizType::slug).unwrap_or("all")
}

pub(crate) fn scope_label(quiz_type: Option<QuizType>) -> &'static str {
    quiz_type.map(QuizType::as_str).unwrap_or("All")
}

pub(crate) fn results_filename(quiz_type: Option<QuizType>) -> String {
    format!("results_{}.xlsx", scope_slug(quiz_type))
}

pub(crate) fn top_teams_filename(quiz_type: Option<QuizType>) -> String {
    format!("top_5_teams_{}.docx", scope_slug(quiz_type))
}

/// One `Results` sheet: `lotname`, `score`, `duration` columns.
pub(crate) fn results_workbook(rows: &[ResultRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Results")?;

    for (col, title) in ["lotname", "score", "duration"].into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title, &bold)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let line = index as u32 + 1;
        sheet.write_string(line, 0, row.lotname.as_str())?;
        sheet.write_number(line, 1, f64::from(row.score))?;
        sheet.write_string(line, 2, row.duration.as_str())?;
    }

    Ok(workbook.save_to_buffer()?)
}

pub(crate) fn top_teams_document(
    quiz_type: Option<QuizType>,
    rows: &[ResultRow],
) -> Result<Vec<u8>, ExportError> {
    let heading = Paragraph::new().add_run(
        Run::new().add_text(format!("Top 5 Teams - {} Quiz", scope_label(quiz_type))).bold().size(40),
    );

    let mut table_rows = vec![TableRow::new(vec![
        text_cell("Team Name", true),
        text_cell("Score", true),
        text_cell("Duration (HH:MM:SS)", true),
    ])];
    table_rows.extend(rows.iter().map(|row| {
        TableRow::new(vec![
            text_cell(&row.lotname, false),
            text_cell(&row.score.to_string(), false),
            text_cell(&row.duration, false),
        ])
    }));

    let mut buffer = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(heading)
        .add_table(Table::new(table_rows))
        .build()
        .pack(&mut buffer)
        .map_err(|err| ExportError::Document(err.to_string()))?;

    Ok(buffer.into_inner())
}

fn text_cell(text: &str, bold: bool) -> TableCell {
    let run = Run::new().add_text(text);
    let run = if bold { run.bold() } else { run };
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}
