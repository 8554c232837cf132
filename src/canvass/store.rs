//! The spreadsheet store: the remote table that is the system of record.
//!
//! [`TableBackend`] is the raw tabular API (Google Sheets in production, memory
//! in tests). [`StoreAdapter`] owns the column layout and the addressing rules on
//! top of it. Writes are single requests without any concurrency control: two
//! writers of the same row race and the last one wins.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

use canvass_core::codec::{self, Cell, FIRST_COLUMN, LAST_COLUMN};
use canvass_core::{Resident, SerialNo};

use crate::canvass::*;

/// A block of rows of the table in A1 notation: either all the data columns
/// (`Sheet1!A:K`) or one row of them (`Sheet1!A5:K5`).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableRange {
    pub sheet: String,
    /// 1-based row number; `None` for the whole column span.
    pub row: Option<u64>,
}

impl TableRange {
    pub fn all(sheet: &str) -> TableRange {
        TableRange {
            sheet: sheet.to_string(),
            row: None,
        }
    }

    pub fn row(sheet: &str, row: u64) -> TableRange {
        TableRange {
            sheet: sheet.to_string(),
            row: Some(row),
        }
    }
}

impl Display for TableRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(r) => write!(f, "{}!{}{}:{}{}", self.sheet, FIRST_COLUMN, r, LAST_COLUMN, r),
            None => write!(f, "{}!{}:{}", self.sheet, FIRST_COLUMN, LAST_COLUMN),
        }
    }
}

#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Adds rows after the last populated row.
    async fn append(&self, range: &TableRange, rows: Vec<Vec<Cell>>) -> CanvassResult<()>;
    /// Writes rows starting at the first row of the range.
    async fn update(&self, range: &TableRange, rows: Vec<Vec<Cell>>) -> CanvassResult<()>;
    async fn clear(&self, range: &TableRange) -> CanvassResult<()>;
    /// All the populated rows of the range, header included.
    async fn get(&self, range: &TableRange) -> CanvassResult<Vec<Vec<String>>>;
}

/// How a single-resident write was carried out.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Append,
    Update,
}

#[derive(Clone)]
pub struct StoreAdapter {
    backend: Arc<dyn TableBackend>,
    sheet: String,
}

impl StoreAdapter {
    pub fn new(backend: Arc<dyn TableBackend>, sheet: &str) -> StoreAdapter {
        StoreAdapter {
            backend,
            sheet: sheet.to_string(),
        }
    }

    pub async fn append(&self, rows: Vec<Vec<Cell>>) -> CanvassResult<()> {
        let range = TableRange::all(&self.sheet);
        info!("append: {} rows to {}", rows.len(), range);
        debug!("append: {:?}", rows);
        self.backend.append(&range, rows).await
    }

    /// Replaces everything in the data columns. Rows past the new content are gone.
    pub async fn overwrite(&self, rows: Vec<Vec<Cell>>) -> CanvassResult<()> {
        let range = TableRange::all(&self.sheet);
        info!("overwrite: {} rows in {}", rows.len(), range);
        self.backend.clear(&range).await?;
        self.backend.update(&range, rows).await
    }

    /// Writes one row at `serial + 1`.
    ///
    /// Without a usable serial number the row is appended instead: computing an
    /// address from it would overwrite some unrelated row.
    pub async fn update_one(
        &self,
        serial: Option<&SerialNo>,
        row: Vec<Cell>,
    ) -> CanvassResult<WriteMode> {
        match serial.and_then(|s| s.row_offset()) {
            Some(offset) => {
                let range = TableRange::row(&self.sheet, offset + 1);
                info!("update_one: updating {}", range);
                self.backend.update(&range, vec![row]).await?;
                Ok(WriteMode::Update)
            }
            None => {
                warn!(
                    "update_one: serial number {:?} is not usable, appending instead",
                    serial
                );
                self.append(vec![row]).await?;
                Ok(WriteMode::Append)
            }
        }
    }

    /// The data rows. The first row is always taken as the header and dropped.
    pub async fn fetch_all(&self) -> CanvassResult<Vec<Vec<String>>> {
        let range = TableRange::all(&self.sheet);
        let rows = self.backend.get(&range).await?;
        info!("fetch_all: {} raw rows in {}", rows.len(), range);
        if rows.len() <= 1 {
            return Ok(Vec::new());
        }
        Ok(rows.into_iter().skip(1).collect())
    }

    pub async fn add_resident(&self, r: &Resident) -> CanvassResult<()> {
        self.append(vec![codec::encode_row(r)]).await
    }

    pub async fn update_resident(&self, r: &Resident) -> CanvassResult<WriteMode> {
        self.update_one(r.serial_no.as_ref(), codec::encode_row(r))
            .await
    }

    /// Replaces the table with the given residents, below the header row.
    ///
    /// The header stays in row 1 so that the serial numbers keep addressing
    /// their own rows.
    pub async fn sync_residents(&self, residents: &[Resident]) -> CanvassResult<usize> {
        let mut rows = vec![codec::header_row()];
        rows.extend(residents.iter().map(codec::encode_row));
        self.overwrite(rows).await?;
        Ok(residents.len())
    }

    pub async fn fetch_residents(&self) -> CanvassResult<Vec<Resident>> {
        let rows = self.fetch_all().await?;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| codec::decode_table_row(cells, idx))
            .collect())
    }
}

/// A table kept in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryBackend {
    rows: std::sync::Mutex<Vec<Vec<String>>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new(rows: Vec<Vec<String>>) -> MemoryBackend {
        MemoryBackend {
            rows: std::sync::Mutex::new(rows),
        }
    }

    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<String>>> {
        // Poisoning is ignored.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
fn to_text(rows: Vec<Vec<Cell>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[cfg(test)]
#[async_trait]
impl TableBackend for MemoryBackend {
    async fn append(&self, _range: &TableRange, rows: Vec<Vec<Cell>>) -> CanvassResult<()> {
        self.lock().extend(to_text(rows));
        Ok(())
    }

    async fn update(&self, range: &TableRange, rows: Vec<Vec<Cell>>) -> CanvassResult<()> {
        let mut table = self.lock();
        let start = (range.row.unwrap_or(1) as usize).saturating_sub(1);
        for (idx, row) in to_text(rows).into_iter().enumerate() {
            let pos = start + idx;
            if table.len() <= pos {
                table.resize(pos + 1, Vec::new());
            }
            table[pos] = row;
        }
        Ok(())
    }

    async fn clear(&self, range: &TableRange) -> CanvassResult<()> {
        let mut table = self.lock();
        match range.row {
            Some(r) => {
                if let Some(row) = table.get_mut((r as usize).saturating_sub(1)) {
                    row.clear();
                }
            }
            None => table.clear(),
        }
        Ok(())
    }

    async fn get(&self, _range: &TableRange) -> CanvassResult<Vec<Vec<String>>> {
        Ok(self.snapshot())
    }
}
