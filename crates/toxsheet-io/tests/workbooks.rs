use std::path::Path;

use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Format, Workbook};
use toxsheet_engine::{extract_single, ReportLayout};
use toxsheet_io::{load_dataset, load_layout, load_template, load_template_from_bytes, render_report, save_layout, IoError};
use toxsheet_model::{CellRef, DerivationMethod, HazardCategory, Range};

fn cell(a1: &str) -> CellRef {
    CellRef::from_a1(a1).unwrap()
}

fn write_database(path: &Path, observation_header: &[&str]) {
    let mut workbook = Workbook::new();

    let substances = workbook.add_worksheet();
    substances.set_name("물질정보").unwrap();
    for (col, header) in ["내부식별자", "CAS", "물질명", "분자식", "분자량"].iter().enumerate() {
        substances.write_string(0, col as u16, *header).unwrap();
    }
    substances.write_string(1, 0, "B-1").unwrap();
    substances.write_string(1, 1, "71-43-2").unwrap();
    substances.write_string(1, 2, "TestChem").unwrap();
    substances.write_string(1, 3, "C6H6").unwrap();
    substances.write_number(1, 4, 78.11).unwrap();

    let observations = workbook.add_worksheet();
    observations.set_name("유해성정보").unwrap();
    for (col, header) in observation_header.iter().enumerate() {
        observations.write_string(0, col as u16, *header).unwrap();
    }
    let rows: [[&str; 7]; 3] = [
        ["B-1", "급성경구독성", "실험값", "ECHA CHEM", "LD50", "Rat", "mg/kg"],
        ["B-1", "만성독성", "실험값", "ECHA CHEM", "NOAEL", "Rat", "mg/kg"],
        ["B-1", "어류급성독성", "Read across", "QSAR Toolbox v.4.8", "LC50", "", "mg/L"],
    ];
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                observations.write_string(r, col as u16, *value).unwrap();
            }
        }
    }
    // Result column
    if let Some(result_col) = observation_header.iter().position(|h| *h == "Result") {
        observations.write_number(1, result_col as u16, 500.0).unwrap();
        observations.write_number(2, result_col as u16, 20.0).unwrap();
        observations.write_number(3, result_col as u16, 12.5).unwrap();
    }

    workbook.save(path).unwrap();
}

const FULL_HEADER: [&str; 8] = [
    "내부식별자",
    "유해성항목",
    "결과도출방법",
    "출처",
    "Endpoint(표준)",
    "시험종(표준)",
    "단위",
    "Result",
];

#[test]
fn database_rows_are_loaded_by_header_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.xlsx");
    write_database(&path, &FULL_HEADER);

    let dataset = load_dataset(&path).unwrap();
    assert_eq!(dataset.substances.len(), 1);
    assert_eq!(dataset.substances[0].molecular_weight, "78.11");

    // The unknown category row is skipped.
    assert_eq!(dataset.observations.len(), 2);
    let oral = &dataset.observations[0];
    assert_eq!(oral.ordinal, 2);
    assert_eq!(oral.category, HazardCategory::AcuteOral);
    assert_eq!(oral.method, DerivationMethod::Experimental);
    assert_eq!(oral.result, "500");
    assert_eq!(oral.endpoint_standardized.as_deref(), Some("LD50"));
    assert_eq!(oral.endpoint, None);

    let fish = &dataset.observations[1];
    assert_eq!(fish.ordinal, 4);
    assert_eq!(fish.method, DerivationMethod::ReadAcross);
    assert_eq!(fish.species_standardized, None);
    assert_eq!(fish.result, "12.5");
}

#[test]
fn missing_required_column_names_sheet_and_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.xlsx");
    let header: Vec<&str> = FULL_HEADER.iter().copied().filter(|h| *h != "출처").collect();
    write_database(&path, &header);

    let err = load_dataset(&path).unwrap_err();
    match err {
        IoError::MissingColumn { sheet, column } => {
            assert_eq!(sheet, "유해성정보");
            assert_eq!(column, "출처");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_database_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, IoError::Open { .. }));
}

#[test]
fn template_values_and_merges_are_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("양식").unwrap();
    sheet.write_string(5, 2, "내부식별자").unwrap();
    sheet.merge_range(11, 2, 11, 3, "merged", &Format::new()).unwrap();
    workbook.save(&path).unwrap();

    let template = load_template(&path, None).unwrap();
    assert_eq!(template.name(), "양식");
    assert_eq!(template.value(cell("C6")), Some("내부식별자"));
    assert_eq!(template.merged_regions(), &[Range::new(cell("C12"), cell("D12"))]);
    assert_eq!(template.displayed_value(cell("D12")), Some("merged"));

    let err = load_template(&path, Some("없음")).unwrap_err();
    assert!(matches!(err, IoError::MissingSheet(name) if name == "없음"));
}

#[test]
fn filled_report_round_trips_through_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.xlsx");
    write_database(&db, &FULL_HEADER);
    let dataset = load_dataset(&db).unwrap();

    let layout = ReportLayout::single();
    let mut sheet = layout.blank_template();
    sheet.merge_range(Range::new(cell("B2"), cell("E2"))).unwrap();
    sheet.write(cell("B2"), "유해성 정보 요약");
    extract_single(&dataset, "B-1", &layout, &mut sheet).unwrap();

    let bytes = render_report(&sheet, &layout).unwrap();
    let reread = load_template_from_bytes(&bytes, None).unwrap();

    assert_eq!(reread.value(cell("C7")), Some("B-1"));
    assert_eq!(reread.value(cell("G7")), Some("78.11"));
    assert_eq!(reread.value(cell("D12")), Some("LD50 = 500 mg/kg (Rat)"));
    assert_eq!(reread.value(cell("I18")), Some("LC50 = 12.5 mg/L (Unknown)"));
    assert_eq!(reread.value(cell("B2")), Some("유해성 정보 요약"));
    assert_eq!(reread.merged_regions(), &[Range::new(cell("B2"), cell("E2"))]);
}

#[test]
fn layout_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");
    let mut layout = ReportLayout::paired_with_headers([3, 20]);
    layout.style.font_size = 10.0;
    save_layout(&path, &layout).unwrap();
    assert_eq!(load_layout(&path).unwrap(), layout);

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_layout(&path).unwrap_err(), IoError::LayoutJson { .. }));
}
