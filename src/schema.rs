//! Header mapping discovery

use crate::error::{ExportError, Result};
use crate::record::RecordType;
use indexmap::IndexMap;

/// What to do when two fields display-case to the same header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CollisionPolicy {
    /// Fail discovery with [`ExportError::HeaderCollision`]
    #[default]
    Reject,
    /// Keep the header once, pointing at the later field's column
    LastWriteWins,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(CollisionPolicy::Reject),
            "last-write-wins" | "last_write_wins" => Ok(CollisionPolicy::LastWriteWins),
            other => Err(format!("unknown collision policy '{}'", other)),
        }
    }
}

/// Ordered mapping from display name to 0-based column index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMapping {
    columns: IndexMap<String, u32>,
    width: u32,
}

impl HeaderMapping {
    /// Display names with their column, in mapping order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), *col))
    }

    pub fn column(&self, header: &str) -> Option<u32> {
        self.columns.get(header).copied()
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of columns spanned, including columns orphaned by a collision
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }
}

/// Upper-case the first character, leaving the rest untouched
pub fn capitalize_initial_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Map every declared field to a column, in declaration order from 0
pub fn discover<T>(
    record_type: &RecordType<T>,
    policy: CollisionPolicy,
) -> Result<HeaderMapping> {
    let mut columns: IndexMap<String, u32> = IndexMap::with_capacity(record_type.fields().len());
    let mut owners: IndexMap<String, &str> = IndexMap::new();

    for (col, field) in record_type.fields().iter().enumerate() {
        let col = col as u32;
        let header = capitalize_initial_letter(field);

        if let Some(first) = owners.get(&header) {
            match policy {
                CollisionPolicy::Reject => {
                    return Err(ExportError::HeaderCollision {
                        header,
                        first: first.to_string(),
                        second: field.clone(),
                    });
                }
                CollisionPolicy::LastWriteWins => {
                    tracing::warn!(
                        header = %header,
                        dropped = %first,
                        kept = %field,
                        column = col,
                        "header collision, keeping later field"
                    );
                }
            }
        }

        owners.insert(header.clone(), field.as_str());
        columns.insert(header, col);
    }

    let mapping = HeaderMapping {
        width: record_type.fields().len() as u32,
        columns,
    };
    tracing::debug!(
        record_type = record_type.name(),
        headers = ?mapping.headers(),
        "discovered header mapping"
    );
    Ok(mapping)
}
