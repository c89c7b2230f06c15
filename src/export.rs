//! Export builder: serializes a filtered record set to a CSV or XLSX buffer.
//! Pure one-shot transformation — no knowledge of filtering, pagination or
//! persistence; either the whole buffer is produced or the call fails.

use rust_xlsxwriter::Workbook;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::types::{CongressRecord, ExportFile, ExportFormat};

/// Fixed column order shared by both formats.
pub const EXPORT_COLUMNS: [&str; 18] = [
    "name",
    "indication",
    "tier",
    "region",
    "scope",
    "country",
    "city",
    "start_date",
    "end_date",
    "typical_month",
    "website_url",
    "tags",
    "organizer",
    "indication_detail",
    "location_text",
    "deadlines_text",
    "rationale",
    "score",
];

pub fn build_export(rows: &[CongressRecord], format: ExportFormat) -> AppResult<ExportFile> {
    // Records are treated as generic field mappings so the builder stays
    // decoupled from the record type.
    let values: Vec<Value> = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Export(format!("failed to serialize rows: {}", e)))?;

    match format {
        ExportFormat::Csv => Ok(build_csv(&values)),
        ExportFormat::Xlsx => build_xlsx(&values),
    }
}

fn build_csv(rows: &[Value]) -> ExportFile {
    let mut csv = EXPORT_COLUMNS.join(",");
    for row in rows {
        csv.push('\n');
        let line = EXPORT_COLUMNS
            .iter()
            .map(|col| escape_csv_field(&cell_text(row, col)))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
    }

    ExportFile {
        bytes: csv.into_bytes(),
        content_type: "text/csv",
        filename: format!("congresses-export-{}.csv", chrono::Utc::now().timestamp_millis()),
    }
}

fn build_xlsx(rows: &[Value]) -> AppResult<ExportFile> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| AppError::Export(format!("xlsx build failed: {}", e));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Congresses").map_err(xlsx_err)?;

    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string(0, col, humanize_header(name)).map_err(xlsx_err)?;
        sheet.set_column_width(col, 20).map_err(xlsx_err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
            let col = col as u16;
            match row.get(*name) {
                Some(Value::Number(n)) => {
                    sheet.write_number(r, col, n.as_f64().unwrap_or(0.0)).map_err(xlsx_err)?;
                }
                other => {
                    let text = match other {
                        Some(v) => value_text(v),
                        None => String::new(),
                    };
                    sheet.write_string(r, col, text).map_err(xlsx_err)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().map_err(xlsx_err)?;
    Ok(ExportFile {
        bytes,
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        filename: format!("congresses-export-{}.xlsx", chrono::Utc::now().timestamp_millis()),
    })
}

fn cell_text(row: &Value, col: &str) -> String {
    match row.get(col) {
        None => String::new(),
        Some(v) => value_text(v),
    }
}

/// Flatten a field value: nulls become empty, arrays join with "; ",
/// scalars render without JSON quoting.
fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Quote a CSV field only when it contains a comma, double-quote or newline;
/// internal quotes are doubled.
fn escape_csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// "website_url" → "Website Url": underscores to spaces, words title-cased.
fn humanize_header(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
