// Primitives for reading CSV files.

use log::debug;
use snafu::prelude::*;

use canvass_core::HeaderRow;

use crate::canvass::{io_common::assemble_rows, *};

pub fn read_csv_file(path: &str) -> CanvassResult<Vec<HeaderRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut lines: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // Line numbers start at 1 to match what spreadsheet programs show.
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        lines.push(line.iter().map(|s| s.to_string()).collect());
    }
    debug!("read_csv_file: {} lines", lines.len());

    let mut iter = lines.into_iter();
    let header = match iter.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    Ok(assemble_rows(&header, iter))
}
