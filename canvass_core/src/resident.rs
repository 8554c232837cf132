// ********* Resident records ***********

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

use crate::codec::parse_count;

/// The category labels offered to volunteers.
///
/// The list is not enforced: any other label is kept as typed.
pub const CATEGORY_LABELS: [&str; 5] = ["SKY", "FIRE", "SUN", "CLOUD", "WIND"];

pub fn is_known_category(label: &str) -> bool {
    CATEGORY_LABELS.contains(&label)
}

/// The serial number of a resident.
///
/// Spreadsheets coming from older tools may carry anything in the serial column,
/// so a serial number is either a plain number or some text. When numeric, it is
/// also the offset of the resident in the backing table (the table row is
/// `serial + 1`, the first row holding the headers).
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawSerialNo")]
pub enum SerialNo {
    Number(u64),
    Text(String),
}

// What may show up on the wire for a serial number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSerialNo {
    Int(u64),
    Float(f64),
    Text(String),
}

impl From<RawSerialNo> for SerialNo {
    fn from(raw: RawSerialNo) -> SerialNo {
        match raw {
            RawSerialNo::Int(n) => SerialNo::Number(n),
            RawSerialNo::Float(f) if f >= 0.0 && f.fract() == 0.0 => SerialNo::Number(f as u64),
            RawSerialNo::Float(f) => SerialNo::Text(f.to_string()),
            RawSerialNo::Text(s) => SerialNo::Text(s),
        }
    }
}

impl From<u64> for SerialNo {
    fn from(n: u64) -> SerialNo {
        SerialNo::Number(n)
    }
}

impl SerialNo {
    /// Reads a serial number from the text of a cell.
    pub fn parse(s: &str) -> SerialNo {
        match s.trim().parse::<u64>() {
            Ok(n) => SerialNo::Number(n),
            Err(_) => SerialNo::Text(s.to_string()),
        }
    }

    /// The numeric value, if there is one.
    pub fn numeric(&self) -> Option<u64> {
        match self {
            SerialNo::Number(n) => Some(*n),
            SerialNo::Text(s) => s.trim().parse::<u64>().ok(),
        }
    }

    /// The offset usable to address a row of the backing table.
    ///
    /// Zero is not a valid offset: it would point at the header row.
    pub fn row_offset(&self) -> Option<u64> {
        self.numeric().filter(|n| *n > 0)
    }

    /// A normalized key: numeric serials compare by value, others by text.
    pub fn key(&self) -> String {
        match self.numeric() {
            Some(n) => n.to_string(),
            None => self.to_string(),
        }
    }
}

// What may show up on the wire for a text field or a count: clients send the
// cells of their spreadsheets as they are.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// Reads a text field. Numbers are rendered without a trailing `.0`, null is empty.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<RawCell>::deserialize(d)? {
        None => String::new(),
        Some(RawCell::Int(i)) => i.to_string(),
        Some(RawCell::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(RawCell::Float(f)) => f.to_string(),
        Some(RawCell::Bool(b)) => b.to_string(),
        Some(RawCell::Text(s)) => s,
    })
}

/// Reads a visit count from a number or a numeric string. Anything else is zero.
fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(match Option::<RawCell>::deserialize(d)? {
        Some(RawCell::Int(i)) => u32::try_from(i.max(0)).unwrap_or(u32::MAX),
        Some(RawCell::Float(f)) if f > 0.0 => f as u32,
        Some(RawCell::Text(s)) => parse_count(&s),
        _ => 0,
    })
}

impl Display for SerialNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerialNo::Number(n) => write!(f, "{}", n),
            SerialNo::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One canvassed household or voter.
///
/// The optional contact, category and remark fields use the empty string for
/// "not set". The `id` is a client-side join key only and never reaches the
/// spreadsheet.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resident {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(rename = "serialNo", default, skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<SerialNo>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "guardianName", default, deserialize_with = "lenient_text")]
    pub guardian_name: String,
    #[serde(rename = "wardHouseNo", default, deserialize_with = "lenient_text")]
    pub ward_house_no: String,
    #[serde(rename = "houseName", default, deserialize_with = "lenient_text")]
    pub house_name: String,
    #[serde(rename = "genderAge", default, deserialize_with = "lenient_text")]
    pub gender_age: String,
    /// The contact imported with the list.
    #[serde(rename = "mobileNumber", default, deserialize_with = "lenient_text")]
    pub mobile_number: String,
    /// The contact entered by the volunteer.
    #[serde(rename = "phoneNumber", default, deserialize_with = "lenient_text")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub remark: String,
    #[serde(rename = "visitCount", default, deserialize_with = "lenient_count")]
    pub visit_count: u32,
}

impl Resident {
    pub fn is_visited(&self) -> bool {
        self.visit_count > 0
    }

    /// The table offset of this resident, when the serial number allows one.
    pub fn row_offset(&self) -> Option<u64> {
        self.serial_no.as_ref().and_then(|s| s.row_offset())
    }
}
