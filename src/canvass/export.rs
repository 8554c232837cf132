use chrono::NaiveDate;
use log::info;
use rust_xlsxwriter::{Workbook, XlsxError};
use snafu::prelude::*;
use std::path::{Path, PathBuf};

use canvass_core::codec::{self, Cell, COLUMN_HEADERS};
use canvass_core::Resident;

use crate::canvass::*;

pub const DEFAULT_EXPORT_PREFIX: &str = "field_residents";
pub const EXPORT_SHEET_NAME: &str = "Residents";
const COLUMN_WIDTH: f64 = 20.0;

/// `<prefix>_<YYYY-MM-DD>.xlsx`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.xlsx", prefix, date.format("%Y-%m-%d"))
}

/// Writes the residents to a new workbook in `dir`, named after today's date.
///
/// Returns the path of the workbook.
pub fn export_residents(residents: &[Resident], dir: &Path, prefix: &str) -> CanvassResult<PathBuf> {
    let path = dir.join(export_file_name(prefix, chrono::Utc::now().date_naive()));
    write_workbook(residents, &path).context(ExportSnafu {
        path: path.display().to_string(),
    })?;
    info!("Exported {} residents to {:?}", residents.len(), path);
    Ok(path)
}

fn write_workbook(residents: &[Resident], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;
    for (col, header) in COLUMN_HEADERS.iter().enumerate() {
        sheet.set_column_width(col as u16, COLUMN_WIDTH)?;
        sheet.write_string(0, col as u16, *header)?;
    }
    for (idx, r) in residents.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in codec::encode_row(r).into_iter().enumerate() {
            match cell {
                Cell::Text(s) => sheet.write_string(row, col as u16, &s)?,
                Cell::Number(n) => sheet.write_number(row, col as u16, n as f64)?,
            };
        }
    }
    workbook.save(path)
}
