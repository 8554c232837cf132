use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use canvass_core::HeaderRow;

use crate::canvass::{io_common::assemble_rows, *};

/// Reads the first worksheet of a workbook. The first row holds the labels.
pub fn read_excel_file(path: &str) -> CanvassResult<Vec<HeaderRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(h) => h.iter().map(cell_text).collect(),
        None => return Ok(Vec::new()),
    };
    debug!("read_excel_file: header: {:?}", header);

    let rows = iter.map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    Ok(assemble_rows(&header, rows))
}

/// The text of a cell as a spreadsheet program would show it.
///
/// Whole numbers lose their decimal part, so that a serial number `12` is not read as `12.0`.
pub fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(f) => f.to_string(),
        DataType::Empty => String::new(),
        other => {
            debug!("cell_text: dropping cell {:?}", other);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvass_core::{codec, Resident, SerialNo};
    use rust_xlsxwriter::Workbook;

    #[test]
    fn numbers_render_like_text() {
        assert_eq!(cell_text(&DataType::Float(12.0)), "12");
        assert_eq!(cell_text(&DataType::Float(2.5)), "2.5");
        assert_eq!(cell_text(&DataType::Int(7)), "7");
        assert_eq!(cell_text(&DataType::Empty), "");
        assert_eq!(cell_text(&DataType::String("x".to_string())), "x");
    }

    #[test]
    fn reads_a_written_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "S.No").unwrap();
        sheet.write_string(0, 1, "Name").unwrap();
        sheet.write_string(0, 2, "Mobile").unwrap();
        sheet.write_string(0, 3, "Visit Count").unwrap();
        sheet.write_number(1, 0, 5.0).unwrap();
        sheet.write_string(1, 1, "Anna").unwrap();
        sheet.write_string(1, 2, "98000").unwrap();
        sheet.write_number(1, 3, 2.0).unwrap();
        sheet.write_string(3, 1, "Bob").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_excel_file(path.to_str().unwrap()).unwrap();
        let residents: Vec<Resident> = codec::decode_records(&rows, "t");
        assert_eq!(residents.len(), 2);
        assert_eq!(residents[0].serial_no, Some(SerialNo::Number(5)));
        assert_eq!(residents[0].mobile_number, "98000");
        assert_eq!(residents[0].visit_count, 2);
        assert_eq!(residents[1].name, "Bob");
        assert_eq!(residents[1].serial_no, Some(SerialNo::Number(2)));
    }

    #[test]
    fn corrupt_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(matches!(
            read_excel_file(path.to_str().unwrap()),
            Err(CanvassError::OpeningExcel { .. })
        ));
    }
}
