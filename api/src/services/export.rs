//! Spreadsheet export of an [`AttendanceSheet`].
//!
//! Layout: `Reg No, Name`, one `P`/`A` column per session (headed by its
//! date), then `Present, Total, Percentage`.

use std::collections::HashMap;
use std::str::FromStr;

use db::models::attendance_record::AttendanceStatus;
use rust_xlsxwriter::{Workbook, Worksheet};

use super::attendance_query::{AttendanceSheet, attendance_percentage};
use super::error::AttendanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AttendanceError::Validation(format!("Unsupported export format '{other}'"))),
        }
    }
}

/// Session column headers. A date held more than once gets ` (2)`, ` (3)`...
fn session_headers(sheet: &AttendanceSheet) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    sheet
        .sessions
        .iter()
        .map(|s| {
            let date = s.date.to_string();
            let n = seen.entry(date.clone()).or_insert(0);
            *n += 1;
            if *n == 1 { date } else { format!("{date} ({n})") }
        })
        .collect()
}

fn table(sheet: &AttendanceSheet) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = vec!["Reg No".to_owned(), "Name".to_owned()];
    header.extend(session_headers(sheet));
    header.extend(["Present".to_owned(), "Total".to_owned(), "Percentage".to_owned()]);

    let total = sheet.total_sessions();
    let rows = sheet
        .students
        .iter()
        .map(|student| {
            let mut row = vec![student.reg_no.clone().unwrap_or_default(), student.name.clone()];
            for session in &sheet.sessions {
                let cell = match sheet.mark(session.id, student.id) {
                    Some(AttendanceStatus::Present) => "P",
                    _ => "A",
                };
                row.push(cell.to_owned());
            }
            let present = sheet.present_count(student.id);
            row.push(present.to_string());
            row.push(total.to_string());
            row.push(format!("{:.2}", attendance_percentage(present, total)));
            row
        })
        .collect();

    (header, rows)
}

fn esc(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn to_csv(sheet: &AttendanceSheet) -> String {
    let (header, rows) = table(sheet);
    let mut csv = String::new();
    for line in std::iter::once(&header).chain(rows.iter()) {
        let cells: Vec<String> = line.iter().map(|c| esc(c)).collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

pub fn to_xlsx(sheet: &AttendanceSheet) -> Result<Vec<u8>, AttendanceError> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| AttendanceError::Export(e.to_string());

    let (header, rows) = table(sheet);
    let numeric_from = header.len() - 3;

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Attendance").map_err(xlsx_err)?;

    for (c, title) in header.iter().enumerate() {
        worksheet.write_string(0, c as u16, title.as_str()).map_err(xlsx_err)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            match cell.parse::<f64>() {
                Ok(n) if c >= numeric_from => worksheet.write_number(r, c as u16, n).map_err(xlsx_err)?,
                _ => worksheet.write_string(r, c as u16, cell.as_str()).map_err(xlsx_err)?,
            };
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer().map_err(xlsx_err)
}

pub fn render(sheet: &AttendanceSheet, format: ExportFormat) -> Result<Vec<u8>, AttendanceError> {
    match format {
        ExportFormat::Csv => Ok(to_csv(sheet).into_bytes()),
        ExportFormat::Xlsx => to_xlsx(sheet),
    }
}
