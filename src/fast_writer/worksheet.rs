//! Windowed worksheet buffer
//!
//! The most recent `window_size` rows stay in memory and can be inspected.
//! Older rows are serialized to an anonymous temp file as soon as they leave
//! the window, so memory stays flat for long exports. The temp file is
//! removed by the OS when the sheet is dropped, on success and on error.

use super::xml_writer::XmlWriter;
use crate::types::{push_column_letter, SheetRow};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};

/// Sheet rows split between an in-memory window and a spill file
pub struct WindowedSheet {
    window_size: usize,
    rows: VecDeque<SheetRow>,
    spill: Option<XmlWriter<File>>,
    spilled_rows: u32,
    row_count: u32,
    spill_failed: bool,
}

impl WindowedSheet {
    /// Create a sheet; a `window_size` of 0 never spills
    pub fn new(window_size: usize) -> Self {
        WindowedSheet {
            window_size,
            rows: VecDeque::new(),
            spill: None,
            spilled_rows: 0,
            row_count: 0,
            spill_failed: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_spill_file(window_size: usize, spill: File) -> Self {
        WindowedSheet {
            spill: Some(XmlWriter::new(spill)),
            ..WindowedSheet::new(window_size)
        }
    }

    /// Append an empty row and return it for filling
    ///
    /// Row indices must be strictly increasing. Once a spill write has
    /// failed the sheet is incomplete and every later call fails.
    pub fn create_row(&mut self, index: u32) -> io::Result<&mut SheetRow> {
        self.ensure_complete()?;
        if let Some(last) = self.rows.back() {
            if index <= last.index {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("row {} created after row {}", index, last.index),
                ));
            }
        }

        if self.window_size > 0 && self.rows.len() >= self.window_size {
            self.spill_oldest()?;
        }

        self.rows.push_back(SheetRow::new(index));
        self.row_count += 1;
        let len = self.rows.len();
        Ok(&mut self.rows[len - 1])
    }

    fn spill_oldest(&mut self) -> io::Result<()> {
        let Some(row) = self.rows.pop_front() else {
            return Ok(());
        };

        if self.spill.is_none() {
            tracing::debug!(row = row.index, "window full, spilling rows to disk");
            self.spill = Some(XmlWriter::new(tempfile::tempfile()?));
        }
        if let Some(spill) = self.spill.as_mut() {
            if let Err(e) = write_row_xml(spill, &row) {
                tracing::error!(row = row.index, error = %e, "unable to spill row");
                self.spill_failed = true;
                return Err(e);
            }
        }
        self.spilled_rows += 1;
        Ok(())
    }

    fn ensure_complete(&self) -> io::Result<()> {
        if self.spill_failed {
            return Err(io::Error::other(
                "sheet lost rows after an earlier spill write failure",
            ));
        }
        Ok(())
    }

    /// Row at `index` if it is still inside the window
    pub fn row(&self, index: u32) -> Option<&SheetRow> {
        self.rows.iter().find(|r| r.index == index)
    }

    /// Rows still held in memory, oldest first
    pub fn window(&self) -> impl Iterator<Item = &SheetRow> {
        self.rows.iter()
    }

    /// Total rows created, spilled or not
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn spilled_rows(&self) -> u32 {
        self.spilled_rows
    }

    /// Write the complete `<sheetData>` element
    pub fn write_sheet_data<W: Write>(&mut self, out: &mut XmlWriter<W>) -> io::Result<()> {
        self.ensure_complete()?;
        out.start_element("sheetData")?;
        out.close_start_tag()?;

        if let Some(spill) = self.spill.as_mut() {
            let file = spill.get_mut()?;
            file.seek(SeekFrom::Start(0))?;
            io::copy(file, out.get_mut()?)?;
            file.seek(SeekFrom::End(0))?;
        }

        for row in &self.rows {
            write_row_xml(out, row)?;
        }

        out.end_element("sheetData")
    }
}

/// Serialize one row as inline-string cells
pub(crate) fn write_row_xml<W: Write>(xml: &mut XmlWriter<W>, row: &SheetRow) -> io::Result<()> {
    let row_num = row.index + 1;
    let mut cell_ref = String::with_capacity(12);

    xml.start_element("row")?;
    xml.attribute_u32("r", row_num)?;
    xml.close_start_tag()?;

    for (col, cell) in row.cells() {
        cell_ref.clear();
        push_column_letter(&mut cell_ref, col);
        cell_ref.push_str(itoa::Buffer::new().format(row_num));

        xml.start_element("c")?;
        xml.attribute("r", &cell_ref)?;
        if cell.style.index() > 0 {
            xml.attribute_u32("s", cell.style.index())?;
        }
        xml.write_raw(b" t=\"inlineStr\"><is><t>")?;
        xml.write_escaped(&cell.text)?;
        xml.write_raw(b"</t></is></c>")?;
    }

    xml.end_element("row")
}
