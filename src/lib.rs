//! # recordsheet
//!
//! Export sequences of uniformly-typed records to XLSX spreadsheets.
//!
//! ## Features
//!
//! - **Declared schemas**: a [`RecordType`] lists a type's fields and their
//!   `get<Field>` accessors; no runtime reflection
//! - **Deterministic columns**: headers follow field declaration order
//! - **Styled header row**: black text on a solid pale-blue fill
//! - **Text cells**: every value is written as its trimmed display text
//! - **Bounded memory**: rows beyond a window are spilled to a temp file
//! - **Safe materialization**: the file is staged next to the destination
//!   and renamed into place, so a failed export never leaves a broken file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recordsheet::{impl_record, Record, TabularExporter};
//!
//! #[derive(Clone)]
//! struct Invoice {
//!     number: String,
//!     customer: String,
//!     total: f64,
//!     paid: bool,
//! }
//!
//! impl_record!(Invoice { number, customer, total, paid });
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let invoices = vec![Invoice {
//!     number: "INV-001".into(),
//!     customer: "Acme".into(),
//!     total: 1250.0,
//!     paid: false,
//! }];
//!
//! let mut exporter = TabularExporter::<Invoice>::for_record("invoices.xlsx")?;
//! exporter.render_data(&invoices)?;
//! exporter.generate_excel_file()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exporter;
pub mod fast_writer;
pub mod record;
pub mod schema;
pub mod types;

pub use config::{ExportOptions, ExportOptionsBuilder};
pub use error::{AccessError, ExportError, Result};
pub use exporter::TabularExporter;
pub use record::{Accessor, Record, RecordType};
pub use schema::{CollisionPolicy, HeaderMapping};
pub use types::{CellStyle, CellValue, SheetCell, SheetRow};
