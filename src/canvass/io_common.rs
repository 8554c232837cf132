// Primitives shared by the file readers.

use log::{debug, info};
use std::path::Path;

use canvass_core::{codec, HeaderRow, Resident};

use crate::canvass::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Turns a table whose first row holds the labels into rows keyed by label.
///
/// Labels are trimmed, unlabeled columns are ignored and fully blank rows are skipped.
pub fn assemble_rows<I>(header: &[String], rows: I) -> Vec<HeaderRow>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let labels: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    rows.into_iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| {
            labels
                .iter()
                .zip(row)
                .filter(|(label, _)| !label.is_empty())
                .map(|(label, cell)| (label.clone(), cell))
                .collect()
        })
        .collect()
}

/// Reads an uploaded list, dispatching on the file extension.
pub fn read_header_rows(path: &str) -> CanvassResult<Vec<HeaderRow>> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    info!("Attempting to read resident file {:?}", path);
    match extension.as_deref() {
        Some("xlsx") => io_xlsx::read_excel_file(path),
        Some("csv") => io_csv::read_csv_file(path),
        _ => UnsupportedFileTypeSnafu { path }.fail(),
    }
}

/// Reads and decodes an uploaded list.
///
/// Any parse failure rejects the whole file: no partial list is returned.
pub fn read_residents(path: &str, id_prefix: &str) -> CanvassResult<Vec<Resident>> {
    let rows = read_header_rows(path)?;
    debug!(
        "read_residents: {}: {} data rows",
        simplify_file_name(path),
        rows.len()
    );
    Ok(codec::decode_records(&rows, id_prefix))
}

/// A prefix for freshly imported ids, unique to this import.
pub fn make_id_prefix() -> String {
    format!("resident-{}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn assemble() {
        let header = strings(&[" Name ", "", "Remark"]);
        let rows = vec![
            strings(&["Anna", "ignored", "hello"]),
            strings(&["", " ", ""]),
            strings(&["Bob"]),
        ];
        let res = assemble_rows(&header, rows);
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].get("Name"), Some(&"Anna".to_string()));
        assert_eq!(res[0].get("Remark"), Some(&"hello".to_string()));
        assert_eq!(res[0].len(), 2);
        assert_eq!(res[1].get("Remark"), None);
    }

    #[test]
    fn unsupported_extension() {
        assert!(matches!(
            read_header_rows("list.ods"),
            Err(CanvassError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/a/b/list.csv"), "list.csv");
        assert!(make_id_prefix().starts_with("resident-"));
    }
}
