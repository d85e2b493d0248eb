//! Single-sheet workbook and its OOXML package

use std::io::{self, Seek, Write};
use zip::result::ZipError;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::worksheet::WindowedSheet;
use super::xml_writer::XmlWriter;
use crate::types::SheetRow;

const SHEET_NAME_MAX_CHARS: usize = 31;
const SHEET_NAME_FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Workbook holding one windowed sheet
pub struct SheetWorkbook {
    sheet_name: String,
    sheet: WindowedSheet,
    compression_level: i64,
}

impl SheetWorkbook {
    /// Create a workbook; the sheet name must pass [`Self::validate_sheet_name`]
    pub fn new(sheet_name: &str, window_size: usize, compression_level: i64) -> Self {
        SheetWorkbook {
            sheet_name: sheet_name.to_string(),
            sheet: WindowedSheet::new(window_size),
            compression_level: compression_level.clamp(0, 9),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_spill_file(
        sheet_name: &str,
        window_size: usize,
        spill: std::fs::File,
    ) -> Self {
        SheetWorkbook {
            sheet_name: sheet_name.to_string(),
            sheet: WindowedSheet::with_spill_file(window_size, spill),
            compression_level: 6,
        }
    }

    /// Reason a name cannot be used for a worksheet, if any
    pub fn validate_sheet_name(name: &str) -> Option<&'static str> {
        if name.is_empty() {
            Some("sheet name is empty")
        } else if name.chars().count() > SHEET_NAME_MAX_CHARS {
            Some("sheet name is longer than 31 characters")
        } else if name.contains(&SHEET_NAME_FORBIDDEN[..]) {
            Some("sheet name contains one of [ ] : * ? / \\")
        } else if name.starts_with('\'') || name.ends_with('\'') {
            Some("sheet name starts or ends with an apostrophe")
        } else {
            None
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Append a row at `index` and return it for filling
    pub fn create_row(&mut self, index: u32) -> io::Result<&mut SheetRow> {
        self.sheet.create_row(index)
    }

    /// Row at `index` if it has not been spilled yet
    pub fn row(&self, index: u32) -> Option<&SheetRow> {
        self.sheet.row(index)
    }

    pub fn row_count(&self) -> u32 {
        self.sheet.row_count()
    }

    pub fn spilled_rows(&self) -> u32 {
        self.sheet.spilled_rows()
    }

    /// Write the full package to `writer` and hand the writer back
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> io::Result<W> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level));
        let mut zip = ZipWriter::new(writer);

        zip.start_file("[Content_Types].xml", options)
            .map_err(zip_to_io)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", options).map_err(zip_to_io)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("docProps/core.xml", options)
            .map_err(zip_to_io)?;
        Self::write_core_props(&mut zip)?;

        zip.start_file("docProps/app.xml", options)
            .map_err(zip_to_io)?;
        zip.write_all(APP_PROPS.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)
            .map_err(zip_to_io)?;
        self.write_workbook_xml(&mut zip)?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)
            .map_err(zip_to_io)?;
        zip.write_all(WORKBOOK_RELS.as_bytes())?;

        zip.start_file("xl/styles.xml", options)
            .map_err(zip_to_io)?;
        zip.write_all(STYLES.as_bytes())?;

        zip.start_file("xl/worksheets/sheet1.xml", options)
            .map_err(zip_to_io)?;
        self.write_worksheet_xml(&mut zip)?;

        zip.finish().map_err(zip_to_io)
    }

    fn write_core_props<W: Write>(writer: &mut W) -> io::Result<()> {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        write!(
            writer,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>recordsheet</dc:creator>
<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>
</cp:coreProperties>"#
        )
    }

    fn write_workbook_xml<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut xml = XmlWriter::new(writer);

        xml.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
        xml.start_element("workbook")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;

        xml.start_element("sheets")?;
        xml.close_start_tag()?;
        xml.start_element("sheet")?;
        xml.attribute("name", &self.sheet_name)?;
        xml.attribute_u32("sheetId", 1)?;
        xml.attribute("r:id", "rId1")?;
        xml.close_empty()?;
        xml.end_element("sheets")?;

        xml.end_element("workbook")?;
        xml.flush()
    }

    fn write_worksheet_xml<W: Write>(&mut self, writer: W) -> io::Result<()> {
        let mut xml = XmlWriter::new(writer);

        xml.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
        xml.start_element("worksheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;
        self.sheet.write_sheet_data(&mut xml)?;
        xml.end_element("worksheet")?;
        xml.flush()
    }
}

fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::other(other),
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>recordsheet</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
</Properties>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

// cellXfs order must match CellStyle discriminants.
// Header: indexed colour 8 is black, 44 is pale blue.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2">
<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
<font><sz val="11"/><color indexed="8"/><name val="Calibri"/><family val="2"/></font>
</fonts>
<fills count="3">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor indexed="44"/><bgColor indexed="64"/></patternFill></fill>
</fills>
<borders count="1">
<border><left/><right/><top/><bottom/><diagonal/></border>
</borders>
<cellStyleXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
</cellStyleXfs>
<cellXfs count="2">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>
</cellXfs>
<cellStyles count="1">
<cellStyle name="Normal" xfId="0" builtinId="0"/>
</cellStyles>
</styleSheet>"#;
