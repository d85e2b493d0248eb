//! Type definitions for sheet data

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::collections::BTreeMap;
use std::fmt;

/// Cell style presets written to `styles.xml`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellStyle {
    /// Default style - no formatting
    #[default]
    Default = 0,
    /// Black font on a solid pale-blue fill
    Header = 1,
}

impl CellStyle {
    /// Get the style index for XML
    pub fn index(&self) -> u32 {
        *self as u32
    }
}

/// Value read from a record field
///
/// Every value ends up as trimmed text in the sheet; the variants only
/// exist so accessors can hand back what they naturally hold.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Absent value, written as an empty string
    Empty,
    /// String value
    String(String),
    /// Signed integer value
    Int(i64),
    /// Unsigned integer value
    UInt(u64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without zone
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Text written into the cell: the value's display form, trimmed
    pub fn to_cell_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::UInt(u) => write!(f, "{}", u),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Date(d) => write!(f, "{}", d),
            CellValue::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::String(s.clone())
    }
}

impl From<char> for CellValue {
    fn from(c: char) -> Self {
        CellValue::String(c.to_string())
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for CellValue {
            fn from(v: $t) -> Self {
                CellValue::Int(v as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for CellValue {
            fn from(v: $t) -> Self {
                CellValue::UInt(v as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for CellValue {
    fn from(v: f32) -> Self {
        CellValue::Float(v as f64)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<NaiveTime> for CellValue {
    fn from(t: NaiveTime) -> Self {
        CellValue::String(t.to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for CellValue
where
    Tz::Offset: fmt::Display,
{
    fn from(dt: DateTime<Tz>) -> Self {
        CellValue::String(dt.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Empty, Into::into)
    }
}

/// A single text cell in a sheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCell {
    /// Trimmed cell text
    pub text: String,
    /// Cell style
    pub style: CellStyle,
}

impl SheetCell {
    pub fn new(text: impl Into<String>, style: CellStyle) -> Self {
        SheetCell {
            text: text.into(),
            style,
        }
    }
}

/// A row of cells, keyed by 0-based column index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// Row index (0-based, 0 is the header row)
    pub index: u32,
    cells: BTreeMap<u32, SheetCell>,
}

impl SheetRow {
    /// Create a new empty row
    pub fn new(index: u32) -> Self {
        SheetRow {
            index,
            cells: BTreeMap::new(),
        }
    }

    /// Set the cell at `col`, replacing any earlier value
    pub fn set(&mut self, col: u32, cell: SheetCell) {
        self.cells.insert(col, cell);
    }

    /// Get cell at column index
    pub fn get(&self, col: u32) -> Option<&SheetCell> {
        self.cells.get(&col)
    }

    /// Cells in ascending column order
    pub fn cells(&self) -> impl Iterator<Item = (u32, &SheetCell)> {
        self.cells.iter().map(|(col, cell)| (*col, cell))
    }

    /// Get number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert row to its cell texts in column order
    pub fn to_strings(&self) -> Vec<String> {
        self.cells.values().map(|c| c.text.clone()).collect()
    }
}

/// Append the column letters for a 0-based column (0 -> A, 25 -> Z, 26 -> AA)
pub(crate) fn push_column_letter(out: &mut String, col: u32) {
    let mut letters = [0u8; 4];
    let mut len = 0;
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters[len] = b'A' + rem as u8;
        len += 1;
        n = (n - 1) / 26;
    }
    for &b in letters[..len].iter().rev() {
        out.push(b as char);
    }
}
