use log::debug;
use std::collections::HashMap;

use crate::resident::Resident;

/// Merges a fresh snapshot of the backing table with the residents held locally.
///
/// The snapshot decides which residents exist and in which order: there is
/// exactly one output record per remote record, and local records absent from
/// the snapshot are dropped. Records are matched on the serial number.
///
/// For a matched record, the identity fields come from the snapshot and the
/// volunteer-edited fields (category, remark, phone number, visit count) keep
/// the local value when it is set. An empty or zero local value cannot be told
/// apart from "never edited", so the remote value wins in that case.
pub fn reconcile(local: &[Resident], remote: Vec<Resident>) -> Vec<Resident> {
    let mut by_serial: HashMap<String, &Resident> = HashMap::new();
    for r in local.iter() {
        if let Some(sn) = &r.serial_no {
            // First occurrence wins on duplicated serials.
            by_serial.entry(sn.key()).or_insert(r);
        }
    }

    let mut matched = 0usize;
    let merged: Vec<Resident> = remote
        .into_iter()
        .map(|sheet_row| {
            let existing = sheet_row
                .serial_no
                .as_ref()
                .and_then(|sn| by_serial.get(&sn.key()).copied());
            match existing {
                Some(existing) => {
                    matched += 1;
                    merge_record(existing, sheet_row)
                }
                None => sheet_row,
            }
        })
        .collect();
    debug!(
        "reconcile: {} remote records, {} matched locally, {} local records",
        merged.len(),
        matched,
        local.len()
    );
    merged
}

fn merge_record(existing: &Resident, sheet_row: Resident) -> Resident {
    let mut merged = sheet_row;
    if !existing.category.is_empty() {
        merged.category = existing.category.clone();
    }
    if !existing.remark.is_empty() {
        merged.remark = existing.remark.clone();
    }
    if !existing.phone_number.is_empty() {
        merged.phone_number = existing.phone_number.clone();
    }
    if existing.visit_count > 0 {
        merged.visit_count = existing.visit_count;
    }
    merged
}
