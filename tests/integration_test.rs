//! Integration tests for recordsheet

use chrono::NaiveDate;
use recordsheet::{
    impl_record, CollisionPolicy, ExportError, ExportOptions, Record, RecordType, TabularExporter,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn read_part(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Cell texts of every row in sheet1, in document order
fn sheet_rows(path: &Path) -> Vec<Vec<String>> {
    let xml = read_part(path, "xl/worksheets/sheet1.xml");
    xml.split("<row ")
        .skip(1)
        .map(|row| {
            let row = &row[..row.find("</row>").unwrap()];
            row.split("<c ")
                .skip(1)
                .map(|cell| {
                    let start = cell.find("<t>").unwrap() + 3;
                    let end = cell.find("</t>").unwrap();
                    unescape(&cell[start..end])
                })
                .collect()
        })
        .collect()
}

#[derive(Clone)]
struct Employee {
    id: u32,
    name: String,
    department: Option<String>,
    salary: f64,
    active: bool,
    hired: NaiveDate,
}

impl_record!(Employee {
    id,
    name,
    department,
    salary,
    active,
    hired
});

fn employees() -> Vec<Employee> {
    vec![
        Employee {
            id: 1,
            name: "  Alice Smith ".to_string(),
            department: Some("Engineering".to_string()),
            salary: 7250.5,
            active: true,
            hired: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
        },
        Employee {
            id: 2,
            name: "Bob".to_string(),
            department: None,
            salary: 4100.0,
            active: false,
            hired: NaiveDate::from_ymd_opt(2021, 11, 15).unwrap(),
        },
        Employee {
            id: 3,
            name: "Carol <QA> & \"Ops\"".to_string(),
            department: Some("Données ✓".to_string()),
            salary: 0.25,
            active: true,
            hired: NaiveDate::from_ymd_opt(2023, 1, 9).unwrap(),
        },
    ]
}

#[test]
fn test_export_header_and_rows() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("employees.xlsx");

    let mut exporter = TabularExporter::<Employee>::for_record(&path).unwrap();
    exporter.render_data(&employees()).unwrap();
    exporter.generate_excel_file().unwrap();

    let rows = sheet_rows(&path);
    assert_eq!(rows.len(), 4); // Header + 3 data rows
    assert_eq!(
        rows[0],
        vec!["Id", "Name", "Department", "Salary", "Active", "Hired"]
    );
    assert_eq!(
        rows[1],
        vec!["1", "Alice Smith", "Engineering", "7250.5", "true", "2019-04-01"]
    );
    assert_eq!(rows[2], vec!["2", "Bob", "", "4100", "false", "2021-11-15"]);
    assert_eq!(rows[3][1], "Carol <QA> & \"Ops\"");
    assert_eq!(rows[3][2], "Données ✓");
    for row in &rows {
        assert_eq!(row.len(), 6);
    }
}

#[test]
fn test_header_cells_are_styled() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("styled.xlsx");

    TabularExporter::export(
        &path,
        Employee::record_type(),
        &employees(),
        ExportOptions::default(),
    )
    .unwrap();

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert_eq!(sheet.matches(" s=\"1\"").count(), 6);
    assert!(sheet.contains("<c r=\"F1\" s=\"1\" t=\"inlineStr\"><is><t>Hired</t></is></c>"));
    assert!(sheet.contains("<c r=\"A2\" t=\"inlineStr\"><is><t>1</t></is></c>"));

    let styles = read_part(&path, "xl/styles.xml");
    assert!(styles.contains("<color indexed=\"8\"/>"));
    assert!(styles.contains("patternType=\"solid\"><fgColor indexed=\"44\"/>"));
}

#[test]
fn test_sheet_named_after_record_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("named.xlsx");

    TabularExporter::export(
        &path,
        Employee::record_type(),
        &employees(),
        ExportOptions::default(),
    )
    .unwrap();

    let workbook = read_part(&path, "xl/workbook.xml");
    assert!(workbook.contains("<sheet name=\"Employee\" sheetId=\"1\" r:id=\"rId1\"/>"));
}

#[test]
fn test_empty_record_list_writes_header_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");

    let mut exporter = TabularExporter::<Employee>::for_record(&path).unwrap();
    exporter.render_data(&[]).unwrap();
    exporter.generate_excel_file().unwrap();

    let rows = sheet_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 6);
}

#[test]
fn test_missing_accessor_fails_without_file() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");

    let record_type = Employee::record_type().declare("foo");
    let mut exporter = TabularExporter::new(&path, record_type).unwrap();

    let err = exporter.render_data(&employees()).unwrap_err();
    match &err {
        ExportError::Conversion { column, field, .. } => {
            assert_eq!(*column, 6);
            assert_eq!(field, "Foo");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("Foo"));
    assert!(err.to_string().contains("getFoo"));

    drop(exporter);
    assert!(!path.exists());
}

#[test]
fn test_spilled_export_keeps_every_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("large.xlsx");

    let records: Vec<Employee> = (0..1000)
        .map(|i| Employee {
            id: i,
            name: format!("Employee {}", i),
            department: None,
            salary: i as f64 * 1.5,
            active: i % 2 == 0,
            hired: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        })
        .collect();

    let options = ExportOptions::builder().with_window_size(10).build();
    let mut exporter =
        TabularExporter::with_options(&path, Employee::record_type(), options).unwrap();
    exporter.render_data(&records).unwrap();

    assert_eq!(exporter.workbook().spilled_rows(), 991);
    assert!(exporter.workbook().row(1).is_none());
    assert!(exporter.workbook().row(1000).is_some());
    exporter.generate_excel_file().unwrap();

    let rows = sheet_rows(&path);
    assert_eq!(rows.len(), 1001);
    assert_eq!(rows[1][1], "Employee 0");
    assert_eq!(rows[1000][1], "Employee 999");
    assert_eq!(rows[500][3], "748.5");
}

#[test]
fn test_collision_policies() {
    struct Pair {
        lower: String,
        upper: String,
    }

    let record_type = || {
        RecordType::<Pair>::new("Pair")
            .field("foo", |p: &Pair| p.lower.clone())
            .accessor("getFoo", |p: &Pair| p.upper.clone())
            .declare("Foo")
    };
    let data = vec![Pair {
        lower: "lower".to_string(),
        upper: "upper".to_string(),
    }];

    let dir = tempdir().unwrap();
    let path = dir.path().join("pair.xlsx");

    assert!(matches!(
        TabularExporter::new(&path, record_type()),
        Err(ExportError::HeaderCollision { .. })
    ));

    let options = ExportOptions::builder()
        .with_collision_policy(CollisionPolicy::LastWriteWins)
        .build();
    TabularExporter::export(&path, record_type(), &data, options).unwrap();

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"B1\" s=\"1\" t=\"inlineStr\"><is><t>Foo</t></is></c>"));
    assert!(!sheet.contains("r=\"A1\""));
    assert!(sheet.contains("<c r=\"B2\" t=\"inlineStr\"><is><t>upper</t></is></c>"));
}

#[test]
fn test_unwritable_destination_fails_at_construction() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("missing").join("out.xlsx");
    let err = TabularExporter::<Employee>::for_record(&missing)
        .err()
        .expect("construction should fail");
    assert!(matches!(err, ExportError::Io { .. }));
    assert!(!missing.exists());

    let locked = NamedTempFile::new_in(dir.path()).unwrap();
    let mut perms = locked.as_file().metadata().unwrap().permissions();
    perms.set_readonly(true);
    locked.as_file().set_permissions(perms).unwrap();

    let err = TabularExporter::<Employee>::for_record(locked.path())
        .err()
        .expect("construction should fail");
    assert!(err.to_string().contains("read-only"));
    assert_eq!(locked.as_file().metadata().unwrap().len(), 0);
}

#[test]
fn test_overwrites_existing_destination() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("again.xlsx");

    for batch in [employees(), employees()[..1].to_vec()] {
        TabularExporter::export(
            &path,
            Employee::record_type(),
            &batch,
            ExportOptions::default(),
        )
        .unwrap();
    }

    assert_eq!(sheet_rows(&path).len(), 2);
}

#[test]
fn test_text_shaped_like_an_escape_keeps_its_value() {
    struct Note {
        body: String,
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.xlsx");
    let notes = vec![Note {
        body: "_x0041_".to_string(),
    }];
    let record_type = RecordType::<Note>::new("Note").field("body", |n: &Note| n.body.clone());

    TabularExporter::export(&path, record_type, &notes, ExportOptions::default()).unwrap();

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"A2\" t=\"inlineStr\"><is><t>_x005F_x0041_</t></is></c>"));
}

#[cfg(unix)]
#[test]
fn test_overwrite_preserves_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.xlsx");
    std::fs::write(&path, b"old").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    TabularExporter::export(
        &path,
        Employee::record_type(),
        &employees(),
        ExportOptions::default(),
    )
    .unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}
