//! Workbook reading for the import tool. Maps the German header row to
//! [`RawRow`] fields; required headers abort the import when missing.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::RawRow;

pub const COL_PILLAR: &str = "Pillar";
pub const COL_NAME: &str = "Name";
pub const COL_TIER: &str = "Tier";
pub const COL_URL: &str = "Offizielle URL";
pub const COL_ORGANIZER: &str = "Gesellschaft/Organisator";
pub const COL_INDICATION_DETAIL: &str = "Indikation(en)";
pub const COL_MONTH: &str = "Typischer Monat(e)";
pub const COL_LOCATION: &str = "Üblicher Ort";
pub const COL_DEADLINES: &str = "Wichtige Deadlines (öffentlich)";
pub const COL_RATIONALE: &str = "Rationale";
pub const COL_TAGS: &str = "Tags";

const REQUIRED: &[&str] = &[COL_PILLAR, COL_NAME, COL_TIER, COL_URL];

/// Read the configured sheet into raw rows (header row excluded).
pub fn read_rows(path: &Path, sheet_name: &str) -> anyhow::Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow::anyhow!("failed to open workbook {}: {}", path.display(), e))?;
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| anyhow::anyhow!("sheet \"{}\" not found in {}: {}", sheet_name, path.display(), e))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(anyhow::anyhow!("sheet \"{}\" is empty", sheet_name));
    };

    // Header → column index
    let mut headers: HashMap<String, usize> = HashMap::new();
    for (idx, cell) in header_row.iter().enumerate() {
        if let Some(h) = cell_str(cell) {
            headers.insert(h, idx);
        }
    }
    for required in REQUIRED {
        if !headers.contains_key(*required) {
            return Err(anyhow::anyhow!(
                "missing required column \"{}\" in sheet \"{}\"",
                required,
                sheet_name
            ));
        }
    }

    let col = |row: &[Data], header: &str| -> Option<String> {
        headers.get(header).and_then(|&idx| row.get(idx)).and_then(cell_str)
    };

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        out.push(RawRow {
            // Row 1 is the header, data starts at row 2.
            row: (i + 2) as u32,
            name: col(row, COL_NAME),
            pillar: col(row, COL_PILLAR),
            organizer: col(row, COL_ORGANIZER),
            indication_detail: col(row, COL_INDICATION_DETAIL),
            tier: col(row, COL_TIER),
            month: col(row, COL_MONTH),
            location: col(row, COL_LOCATION),
            website_url: col(row, COL_URL),
            deadlines: col(row, COL_DEADLINES),
            rationale: col(row, COL_RATIONALE),
            tags: col(row, COL_TAGS),
        });
    }

    Ok(out)
}

/// Cell value to trimmed non-empty string.
fn cell_str(cell: &Data) -> Option<String> {
    let s = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
