//! Mapping between spreadsheet rows and resident records.
//!
//! Two directions are supported:
//! - decoding, from a row keyed by header labels (an uploaded file) or from a
//!   positional row (the backing table) into a [`Resident`]
//! - encoding, from a [`Resident`] into the fixed eleven-column layout of the
//!   backing table.
//!
//! The column layout below is shared by the uploader, the exporter and the store.
//! Changing the order requires changing the table range as well.

use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;

use crate::resident::{Resident, SerialNo};

/// A data row of an uploaded table, keyed by the labels of its first row.
pub type HeaderRow = HashMap<String, String>;

/// Number of columns in the backing table.
pub const COLUMN_COUNT: usize = 11;

/// The first and last columns of the backing table.
pub const FIRST_COLUMN: char = 'A';
pub const LAST_COLUMN: char = 'K';

/// The header labels of the backing table, in column order.
pub const COLUMN_HEADERS: [&str; COLUMN_COUNT] = [
    "Serial No.",
    "Name",
    "Guardian's Name",
    "Ward/House No",
    "House Name",
    "Gender/Age",
    "Original Mobile",
    "Phone Number",
    "Category",
    "Remark",
    "Visit Count",
];

/// The fields of a resident, in column order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Field {
    SerialNo,
    Name,
    GuardianName,
    WardHouseNo,
    HouseName,
    GenderAge,
    MobileNumber,
    PhoneNumber,
    Category,
    Remark,
    VisitCount,
}

impl Field {
    /// The 0-based column index in the backing table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The spreadsheet column letter.
    pub fn column(self) -> char {
        (FIRST_COLUMN as u8 + self.index() as u8) as char
    }

    pub fn header(self) -> &'static str {
        COLUMN_HEADERS[self.index()]
    }

    /// The header labels accepted when importing, by decreasing priority.
    ///
    /// Lists exported by earlier tools use different labels for the same data.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::SerialNo => &["Serial No.", "Serial No", "S.No", "SNo"],
            Field::Name => &["Name"],
            Field::GuardianName => &["Guardian's Name"],
            Field::WardHouseNo => &[
                "Ward/House No",
                "Old Ward No/House No",
                "Ward No",
                "House No",
            ],
            Field::HouseName => &["House Name"],
            Field::GenderAge => &["Gender/Age"],
            Field::MobileNumber => &["Original Mobile", "Mobile Number", "Mobile"],
            Field::PhoneNumber => &["Phone Number"],
            Field::Category => &["Category"],
            Field::Remark => &["Remark"],
            Field::VisitCount => &["Visit Count"],
        }
    }
}

/// A cell of the backing table.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(u64),
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Finds the value of a field, trying each alias in turn. Empty values do not count.
pub fn lookup(row: &HeaderRow, field: Field) -> Option<&str> {
    field
        .aliases()
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(|s| s.as_str())
        .find(|s| !s.is_empty())
}

/// Reads a visit count. Only the leading integer counts, anything else is zero.
pub fn parse_count(s: &str) -> u32 {
    let digits: String = s
        .trim()
        .trim_start_matches('+')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().unwrap_or(0)
}

/// Decodes one uploaded row.
///
/// `position` is the 0-based index of the row among the data rows; it provides
/// the serial number when no serial-like column is present.
pub fn decode_record(row: &HeaderRow, position: usize, id: String) -> Resident {
    let text = |field: Field| lookup(row, field).unwrap_or_default().to_string();
    Resident {
        id,
        serial_no: Some(
            lookup(row, Field::SerialNo)
                .map(SerialNo::parse)
                .unwrap_or(SerialNo::Number(position as u64 + 1)),
        ),
        name: text(Field::Name),
        guardian_name: text(Field::GuardianName),
        ward_house_no: text(Field::WardHouseNo),
        house_name: text(Field::HouseName),
        gender_age: text(Field::GenderAge),
        mobile_number: text(Field::MobileNumber),
        phone_number: text(Field::PhoneNumber),
        category: text(Field::Category),
        remark: text(Field::Remark),
        visit_count: lookup(row, Field::VisitCount).map(parse_count).unwrap_or(0),
    }
}

/// Decodes all the uploaded rows. Identifiers are `<id_prefix>-<index>`.
pub fn decode_records(rows: &[HeaderRow], id_prefix: &str) -> Vec<Resident> {
    debug!("decode_records: {} rows", rows.len());
    rows.iter()
        .enumerate()
        .map(|(idx, row)| decode_record(row, idx, format!("{}-{}", id_prefix, idx)))
        .collect()
}

/// Resets the serial numbers to the 1-based position in the list.
pub fn renumber(residents: &mut [Resident]) {
    for (idx, r) in residents.iter_mut().enumerate() {
        r.serial_no = Some(SerialNo::Number(idx as u64 + 1));
    }
}

/// Encodes a resident into the fixed column layout.
pub fn encode_row(r: &Resident) -> Vec<Cell> {
    let serial = match &r.serial_no {
        Some(SerialNo::Number(n)) => Cell::Number(*n),
        Some(SerialNo::Text(s)) => Cell::Text(s.clone()),
        None => Cell::Text("".to_string()),
    };
    vec![
        serial,
        Cell::Text(r.name.clone()),
        Cell::Text(r.guardian_name.clone()),
        Cell::Text(r.ward_house_no.clone()),
        Cell::Text(r.house_name.clone()),
        Cell::Text(r.gender_age.clone()),
        Cell::Text(r.mobile_number.clone()),
        Cell::Text(r.phone_number.clone()),
        Cell::Text(r.category.clone()),
        Cell::Text(r.remark.clone()),
        Cell::Number(r.visit_count as u64),
    ]
}

/// The header row of the backing table.
pub fn header_row() -> Vec<Cell> {
    COLUMN_HEADERS
        .iter()
        .map(|h| Cell::Text(h.to_string()))
        .collect()
}

/// The encoded row, keyed by the canonical header labels.
pub fn to_header_row(r: &Resident) -> HeaderRow {
    COLUMN_HEADERS
        .iter()
        .zip(encode_row(r))
        .map(|(h, c)| (h.to_string(), c.to_string()))
        .collect()
}

/// Decodes a data row read back from the backing table.
///
/// `position` is the 0-based index among the data rows (the header excluded).
/// The identifier is derived from the position, so it changes when rows move.
pub fn decode_table_row(cells: &[String], position: usize) -> Resident {
    let text = |field: Field| cells.get(field.index()).cloned().unwrap_or_default();
    let serial = cells
        .get(Field::SerialNo.index())
        .and_then(|s| SerialNo::parse(s).row_offset())
        .unwrap_or(position as u64 + 1);
    Resident {
        id: format!("res-{}", position + 1),
        serial_no: Some(SerialNo::Number(serial)),
        name: text(Field::Name),
        guardian_name: text(Field::GuardianName),
        ward_house_no: text(Field::WardHouseNo),
        house_name: text(Field::HouseName),
        gender_age: text(Field::GenderAge),
        mobile_number: text(Field::MobileNumber),
        phone_number: text(Field::PhoneNumber),
        category: text(Field::Category),
        remark: text(Field::Remark),
        visit_count: cells
            .get(Field::VisitCount.index())
            .map(|s| parse_count(s))
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_resident() -> Resident {
        Resident {
            id: "resident-1".to_string(),
            serial_no: Some(SerialNo::Number(4)),
            name: "Anna Joseph".to_string(),
            guardian_name: "Joseph K".to_string(),
            ward_house_no: "12/145".to_string(),
            house_name: "Rose Villa".to_string(),
            gender_age: "F/34".to_string(),
            mobile_number: "9800000001".to_string(),
            phone_number: "9800000002".to_string(),
            category: "SUN".to_string(),
            remark: "Call after 6pm".to_string(),
            visit_count: 3,
        }
    }

    fn row(pairs: &[(&str, &str)]) -> HeaderRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn round_trip_through_header_row() {
        let r = full_resident();
        let decoded = decode_record(&to_header_row(&r), 9, "other-id".to_string());
        assert_eq!(decoded.id, "other-id");
        assert_eq!(
            decoded,
            Resident {
                id: "other-id".to_string(),
                ..r
            }
        );
    }

    #[test]
    fn old_ward_label_is_accepted() {
        let r = decode_record(
            &row(&[("Name", "Bob"), ("Old Ward No/House No", "7/22")]),
            0,
            "x".to_string(),
        );
        assert_eq!(r.ward_house_no, "7/22");
    }

    #[test]
    fn alias_priority_skips_empty_values() {
        let r = decode_record(
            &row(&[("Ward/House No", ""), ("Ward No", "3"), ("House No", "9")]),
            0,
            "x".to_string(),
        );
        assert_eq!(r.ward_house_no, "3");
    }

    #[test]
    fn missing_serial_uses_position() {
        let rows = vec![row(&[("Name", "A")]), row(&[("Name", "B")])];
        let residents = decode_records(&rows, "resident-42");
        assert_eq!(residents[0].serial_no, Some(SerialNo::Number(1)));
        assert_eq!(residents[1].serial_no, Some(SerialNo::Number(2)));
        assert_eq!(residents[1].id, "resident-42-1");
    }

    #[test]
    fn serial_aliases() {
        let r = decode_record(&row(&[("S.No", "17")]), 0, "x".to_string());
        assert_eq!(r.serial_no, Some(SerialNo::Number(17)));
    }

    #[test]
    fn missing_columns_are_zero_values() {
        let r = decode_record(&row(&[]), 0, "x".to_string());
        assert_eq!(r.name, "");
        assert_eq!(r.mobile_number, "");
        assert_eq!(r.visit_count, 0);
    }

    #[test]
    fn visit_count_parsing() {
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count(" 4 visits"), 4);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("-2"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn encode_fixed_layout() {
        let mut r = full_resident();
        r.phone_number = "".to_string();
        r.serial_no = None;
        let cells = encode_row(&r);
        assert_eq!(cells.len(), COLUMN_COUNT);
        assert_eq!(cells[0], Cell::Text("".to_string()));
        assert_eq!(cells[1], Cell::Text("Anna Joseph".to_string()));
        assert_eq!(cells[7], Cell::Text("".to_string()));
        assert_eq!(cells[10], Cell::Number(3));
    }

    #[test]
    fn columns_run_from_a_to_k() {
        assert_eq!(Field::SerialNo.column(), FIRST_COLUMN);
        assert_eq!(Field::VisitCount.column(), LAST_COLUMN);
        assert_eq!(Field::MobileNumber.header(), "Original Mobile");
    }

    #[test]
    fn decode_table_rows() {
        let cells: Vec<String> = vec!["", "Clara", "", "1/1"]
            .into_iter()
            .map(String::from)
            .collect();
        let r = decode_table_row(&cells, 4);
        assert_eq!(r.id, "res-5");
        assert_eq!(r.serial_no, Some(SerialNo::Number(5)));
        assert_eq!(r.name, "Clara");
        assert_eq!(r.ward_house_no, "1/1");
        assert_eq!(r.remark, "");
        assert_eq!(r.visit_count, 0);

        let mut cells: Vec<String> = encode_row(&full_resident())
            .iter()
            .map(|c| c.to_string())
            .collect();
        cells[10] = "x".to_string();
        let r = decode_table_row(&cells, 0);
        assert_eq!(r.serial_no, Some(SerialNo::Number(4)));
        assert_eq!(r.visit_count, 0);
    }

    #[test]
    fn renumbering() {
        let mut rs = vec![full_resident(), full_resident()];
        renumber(&mut rs);
        assert_eq!(rs[0].serial_no, Some(SerialNo::Number(1)));
        assert_eq!(rs[1].serial_no, Some(SerialNo::Number(2)));
    }
}
