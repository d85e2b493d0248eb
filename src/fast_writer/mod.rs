//! XLSX container writing
//!
//! This module provides the pieces the exporter materializes through:
//! - A windowed sheet buffer that spills old rows to a temp file
//! - Direct XML generation with inline-string cells
//! - A single-sheet OOXML package written through a deflated zip

pub mod workbook;
pub mod worksheet;
pub mod xml_writer;

pub use workbook::SheetWorkbook;
pub use worksheet::WindowedSheet;
pub use xml_writer::XmlWriter;
