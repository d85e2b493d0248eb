//! Record-to-spreadsheet export
//!
//! A [`TabularExporter`] is bound to one destination path and one record
//! type when it is built. Building it checks that the destination can be
//! written, validates the sheet name, and discovers the header mapping.
//! [`TabularExporter::render_data`] fills the sheet in memory (spilling old
//! rows to a temp file once the window is full) and
//! [`TabularExporter::generate_excel_file`] writes the workbook out.

use crate::config::ExportOptions;
use crate::error::{AccessError, ExportError, Result};
use crate::fast_writer::SheetWorkbook;
use crate::record::{Record, RecordType};
use crate::schema::{self, HeaderMapping};
use crate::types::{CellStyle, SheetCell, SheetRow};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const STAGED_PREFIX: &str = ".recordsheet-";

/// Exports records of type `T` into a single-sheet XLSX file
///
/// # Examples
///
/// ```no_run
/// use recordsheet::{RecordType, TabularExporter};
///
/// struct Employee {
///     name: String,
///     salary: f64,
/// }
///
/// let record_type = RecordType::<Employee>::new("Employee")
///     .field("name", |e: &Employee| e.name.clone())
///     .field("salary", |e: &Employee| e.salary);
///
/// let staff = vec![Employee { name: "Ada".into(), salary: 5200.0 }];
///
/// let mut exporter = TabularExporter::new("staff.xlsx", record_type)?;
/// exporter.render_data(&staff)?;
/// exporter.generate_excel_file()?;
/// # Ok::<(), recordsheet::ExportError>(())
/// ```
pub struct TabularExporter<T> {
    path: PathBuf,
    record_type: RecordType<T>,
    mapping: HeaderMapping,
    workbook: SheetWorkbook,
    header_written: bool,
    rows_written: u32,
    failure: Option<String>,
}

impl<T> TabularExporter<T> {
    /// Create an exporter with default options
    pub fn new<P: AsRef<Path>>(path: P, record_type: RecordType<T>) -> Result<Self> {
        Self::with_options(path, record_type, ExportOptions::default())
    }

    /// Create an exporter with explicit options
    pub fn with_options<P: AsRef<Path>>(
        path: P,
        record_type: RecordType<T>,
        options: ExportOptions,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_writable(&path)?;

        if let Some(reason) = SheetWorkbook::validate_sheet_name(record_type.name()) {
            return Err(ExportError::InvalidSheetName {
                name: record_type.name().to_string(),
                reason,
            });
        }

        let mapping = schema::discover(&record_type, options.collision_policy)?;
        let workbook = SheetWorkbook::new(
            record_type.name(),
            options.window_size,
            options.compression_level,
        );

        tracing::debug!(
            path = %path.display(),
            sheet = record_type.name(),
            columns = mapping.len(),
            window_size = options.window_size,
            "exporter created"
        );

        Ok(TabularExporter {
            path,
            record_type,
            mapping,
            workbook,
            header_written: false,
            rows_written: 0,
            failure: None,
        })
    }

    /// Render, write and release in one call
    pub fn export<'a, P, I>(
        path: P,
        record_type: RecordType<T>,
        records: I,
        options: ExportOptions,
    ) -> Result<()>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut exporter = Self::with_options(path, record_type, options)?;
        exporter.render_data(records)?;
        exporter.generate_excel_file()
    }

    /// Write the header row (first call only) and one row per record
    ///
    /// A field that cannot be read aborts the call with
    /// [`ExportError::Conversion`] and invalidates the exporter: rows rendered
    /// so far stay inspectable, but nothing further can be rendered or written.
    /// A row that cannot be buffered invalidates it the same way.
    pub fn render_data<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.ensure_valid()?;

        if !self.header_written {
            self.render_header()?;
            self.header_written = true;
        }

        for record in records {
            self.rows_written += 1;
            let index = self.rows_written;

            let row = match self.workbook.create_row(index) {
                Ok(row) => row,
                Err(e) => {
                    tracing::error!(row = index, error = %e, "unable to buffer row");
                    self.failure =
                        Some(format!("row {} could not be buffered: {}", index, e));
                    return Err(ExportError::io(&self.path, e));
                }
            };

            if let Err((column, field, source)) =
                populate_row(&self.record_type, &self.mapping, row, record)
            {
                tracing::error!(
                    row = index,
                    column,
                    field = %field,
                    error = %source,
                    "unable to write record field"
                );
                self.failure = Some(format!("column {} field '{}'", column, field));
                return Err(ExportError::Conversion {
                    column,
                    field,
                    source,
                });
            }
        }

        tracing::info!(
            sheet = self.workbook.sheet_name(),
            rows_written = self.rows_written,
            "rows written"
        );
        Ok(())
    }

    fn render_header(&mut self) -> Result<()> {
        let row = match self.workbook.create_row(0) {
            Ok(row) => row,
            Err(e) => {
                self.failure = Some(format!("header row could not be buffered: {}", e));
                return Err(ExportError::io(&self.path, e));
            }
        };
        for (header, column) in self.mapping.iter() {
            row.set(column, SheetCell::new(header, CellStyle::Header));
        }
        Ok(())
    }

    /// Write the workbook to the bound path, replacing any existing file
    ///
    /// The header row is added first if `render_data` was never called.
    ///
    /// The workbook is written to a temp file next to the destination and
    /// renamed over it once complete, so a failed write leaves the
    /// destination untouched. Temp resources are released on every path.
    /// A symlinked destination is resolved and its target replaced. The new
    /// file keeps the permissions of the file it replaces; a fresh file gets
    /// the process default.
    pub fn generate_excel_file(mut self) -> Result<()> {
        self.ensure_valid()?;
        if !self.header_written {
            self.render_header()?;
            self.header_written = true;
        }

        let target =
            resolve_destination(&self.path).map_err(|e| ExportError::io(&self.path, e))?;
        let existing = fs::metadata(&target).ok().map(|meta| meta.permissions());
        let mut staged =
            stage_next_to(&target).map_err(|e| ExportError::io(&self.path, e))?;

        {
            let writer = BufWriter::with_capacity(64 * 1024, staged.as_file_mut());
            let mut writer = self
                .workbook
                .write_to(writer)
                .map_err(|e| ExportError::io(&self.path, e))?;
            writer
                .flush()
                .map_err(|e| ExportError::io(&self.path, e))?;
        }

        if let Some(permissions) = existing {
            staged
                .as_file()
                .set_permissions(permissions)
                .map_err(|e| ExportError::io(&self.path, e))?;
        }
        staged
            .as_file()
            .sync_all()
            .map_err(|e| ExportError::io(&self.path, e))?;
        staged
            .persist(&target)
            .map_err(|e| ExportError::io(&self.path, e.error))?;

        tracing::debug!(
            path = %self.path.display(),
            rows = self.workbook.row_count(),
            spilled = self.workbook.spilled_rows(),
            "excel file generated"
        );
        Ok(())
    }

    fn ensure_valid(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(ExportError::Invalidated {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_type(&self) -> &RecordType<T> {
        &self.record_type
    }

    /// Header mapping discovered at construction
    pub fn header_mapping(&self) -> &HeaderMapping {
        &self.mapping
    }

    /// In-memory workbook, including rows from a failed render
    pub fn workbook(&self) -> &SheetWorkbook {
        &self.workbook
    }

    /// Data rows created so far; a row that failed still counts
    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }

    pub fn is_invalidated(&self) -> bool {
        self.failure.is_some()
    }
}

impl<T: Record> TabularExporter<T> {
    /// Create an exporter using the type's own [`Record`] descriptor
    pub fn for_record<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(path, T::record_type())
    }
}

fn populate_row<T>(
    record_type: &RecordType<T>,
    mapping: &HeaderMapping,
    row: &mut SheetRow,
    record: &T,
) -> std::result::Result<(), (u32, String, AccessError)> {
    for (header, column) in mapping.iter() {
        let value = record_type
            .read(header, record)
            .map_err(|e| (column, header.to_string(), e))?;
        row.set(column, SheetCell::new(value.to_cell_text(), CellStyle::Default));
    }
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Follow a symlinked destination to the file it points at
fn resolve_destination(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path),
        _ => Ok(path.to_path_buf()),
    }
}

/// Create the staging file in the directory of `target`
///
/// On Unix it is opened with mode 0666 so the umask decides the final mode,
/// the same as for a file created in place.
fn stage_next_to(target: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGED_PREFIX).suffix(".xlsx.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(parent_dir(target))
}

/// Fail unless this process could create or overwrite `path`
///
/// An existing file is opened for writing without truncation, and a staging
/// file is created and removed in the destination directory. The destination
/// itself is never created.
fn check_writable(path: &Path) -> Result<()> {
    let target = resolve_destination(path).map_err(|e| ExportError::io(path, e))?;

    match fs::metadata(&target) {
        Ok(meta) => {
            if !meta.is_file() {
                return Err(ExportError::io(
                    path,
                    io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
                ));
            }
            if meta.permissions().readonly() {
                return Err(ExportError::io(
                    path,
                    io::Error::new(io::ErrorKind::PermissionDenied, "file is read-only"),
                ));
            }
            fs::OpenOptions::new()
                .write(true)
                .open(&target)
                .map_err(|e| ExportError::io(path, e))?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ExportError::io(path, e)),
    }

    let dir = parent_dir(&target);
    let meta = fs::metadata(dir).map_err(|e| ExportError::io(path, e))?;
    if !meta.is_dir() {
        return Err(ExportError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "parent is not a directory"),
        ));
    }
    if meta.permissions().readonly() {
        return Err(ExportError::io(
            path,
            io::Error::new(io::ErrorKind::PermissionDenied, "directory is read-only"),
        ));
    }
    stage_next_to(&target).map_err(|e| ExportError::io(path, e))?;
    Ok(())
}
