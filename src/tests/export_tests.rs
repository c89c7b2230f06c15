#[cfg(test)]
mod tests {
    use crate::export::{build_export, EXPORT_COLUMNS};
    use crate::tests::{date, record};
    use crate::types::ExportFormat;

    #[test]
    fn test_csv_header_row() {
        let file = build_export(&[], ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(file.bytes).unwrap();
        assert_eq!(csv, EXPORT_COLUMNS.join(","));
        assert_eq!(file.content_type, "text/csv");
        assert!(file.filename.starts_with("congresses-export-"));
        assert!(file.filename.ends_with(".csv"));
    }

    #[test]
    fn test_csv_tags_joined_without_quotes() {
        // "AI; Oncology" contains no comma/quote/newline after joining, so
        // the field must NOT be quoted.
        let mut rec = record("a", "ASCO", 1);
        rec.tags = vec!["AI".to_string(), "Oncology".to_string()];

        let file = build_export(&[rec], ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(file.bytes).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.contains(",AI; Oncology,"));
        assert!(!data_line.contains("\"AI; Oncology\""));
    }

    #[test]
    fn test_csv_quoting_rules() {
        let mut rec = record("a", "Congress, Annual \"Update\"", 1);
        rec.city = Some("St. Gallen".to_string());

        let file = build_export(&[rec], ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(file.bytes).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        // Comma and quotes force quoting; internal quotes are doubled.
        assert!(data_line.starts_with("\"Congress, Annual \"\"Update\"\"\","));
        // Unremarkable fields stay bare.
        assert!(data_line.contains("St. Gallen"));
        assert!(!data_line.contains("\"St. Gallen\""));
    }

    #[test]
    fn test_csv_column_values_in_document_order() {
        let mut rec = record("a", "ASCO", 1);
        rec.country = Some("USA".to_string());
        rec.city = Some("Chicago".to_string());
        rec.start_date = Some(date(2026, 6, 5));
        rec.end_date = Some(date(2026, 6, 8));
        rec.typical_month = Some(6);

        let file = build_export(&[rec], ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(file.bytes).unwrap();
        let cells: Vec<&str> = csv.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(cells.len(), EXPORT_COLUMNS.len());
        assert_eq!(cells[0], "ASCO"); // name
        assert_eq!(cells[2], "1"); // tier
        assert_eq!(cells[5], "USA"); // country
        assert_eq!(cells[6], "Chicago"); // city
        assert_eq!(cells[7], "2026-06-05"); // start_date
        assert_eq!(cells[8], "2026-06-08"); // end_date
        assert_eq!(cells[9], "6"); // typical_month
        assert_eq!(cells[17], "90"); // score
    }

    #[test]
    fn test_csv_nulls_become_empty_cells() {
        let rec = record("a", "ASCO", 2);
        let file = build_export(&[rec], ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(file.bytes).unwrap();
        let cells: Vec<&str> = csv.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(cells[5], ""); // country
        assert_eq!(cells[7], ""); // start_date
        assert_eq!(cells[11], ""); // tags
    }

    #[test]
    fn test_xlsx_buffer() {
        let mut rec = record("a", "ASCO", 1);
        rec.tags = vec!["AI".to_string(), "Oncology".to_string()];

        let file = build_export(&[rec], ExportFormat::Xlsx).unwrap();
        assert!(!file.bytes.is_empty());
        // XLSX is a zip container.
        assert_eq!(&file.bytes[..2], b"PK");
        assert_eq!(
            file.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert!(file.filename.ends_with(".xlsx"));
    }
}
