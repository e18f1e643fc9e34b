//! End-to-end preprocessing: find columns, apply the warranty rules, write
//! formulas, then display and persist the result

use chrono::NaiveDate;
use claimsheet::prelude::*;
use claimsheet::{Color, META_SHEET_NAME};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> CellValue {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().into()
}

/// Header on row 3, three claims below it with the vehicle merged down and a
/// footer note far enough below to sit outside the data region
fn claims_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();

    let headers = [
        "Vehicle",
        "Mileage",
        "Sale Date",
        "Repair Date",
        "Occurrence Amount",
        "Chargeback Rate",
        "Chargeback Amount",
    ];
    for (i, header) in headers.iter().enumerate() {
        sheet.set_cell_value_at(3, i as u16 + 1, *header).unwrap();
    }

    sheet.set_cell_value("A1", "Warranty claims").unwrap();
    sheet.set_cell_value("A4", "SUV").unwrap();
    sheet.merge("A4:A6").unwrap();

    sheet.set_cell_value("B4", 70000).unwrap();
    sheet.set_cell_value("C4", date(2022, 1, 1)).unwrap();
    sheet.set_cell_value("D4", date(2024, 6, 1)).unwrap();
    sheet.set_cell_value("E4", 100000).unwrap();
    sheet.set_cell_value("F4", 50).unwrap();

    sheet.set_cell_value("B5", "1,000").unwrap();
    sheet.set_cell_value("C5", "2024.01.01").unwrap();
    sheet.set_cell_value("D5", 20240601).unwrap();
    sheet.set_cell_value("E5", 50000).unwrap();
    sheet.set_cell_value("F5", 50).unwrap();

    sheet.set_cell_value("B6", 20000).unwrap();
    sheet.set_cell_value("C6", date(2023, 5, 1)).unwrap();
    sheet.set_cell_value("D6", date(2024, 5, 1)).unwrap();
    sheet.set_cell_value("E6", 30000).unwrap();
    sheet.set_cell_value("F6", "30").unwrap();

    sheet.set_cell_value("A50", "Prepared by: claims team").unwrap();

    workbook
}

fn config() -> PreprocessConfig {
    PreprocessConfig {
        mileage_threshold: 60000,
        warranty_years: 2.0,
        ..PreprocessConfig::default()
    }
}

fn highlighted(sheet: &Worksheet, addr: &str) -> bool {
    let addr = CellAddress::parse(addr).unwrap();
    sheet.style_at(addr.row, addr.col).fill_rgb() == Some(Color::YELLOW)
}

#[test]
fn test_preprocess_applies_rules_and_formulas() {
    let mut workbook = claims_workbook();
    let report = preprocess(&mut workbook, &config()).unwrap();

    assert_eq!(report.last_row, 6);
    assert_eq!(report.layout.anchor, 4);
    assert_eq!(report.layout.rate, 6);
    assert_eq!(report.layout.mileage, 2);
    assert_eq!(report.layout.chargeback, 7);
    assert_eq!(report.data_rows, vec![4, 5, 6]);
    assert_eq!(report.changed_rows.iter().collect::<Vec<_>>(), vec![4]);

    let sheet = workbook.worksheet(0).unwrap();

    // Over mileage and out of warranty (882 days)
    assert!(highlighted(sheet, "B4"));
    assert!(highlighted(sheet, "C4"));
    assert!(!highlighted(sheet, "D4"));
    assert!(highlighted(sheet, "F4"));
    assert_eq!(sheet.value("F4").unwrap(), &CellValue::Number(0.0));
    assert!(!highlighted(sheet, "B5"));
    assert!(!highlighted(sheet, "F5"));

    // Vehicle column expanded
    assert!(sheet.merged_regions().is_empty());
    for addr in ["A4", "A5", "A6"] {
        assert_eq!(sheet.value(addr).unwrap().as_text(), Some("SUV"));
    }

    assert_eq!(
        sheet.value("G4").unwrap(),
        &CellValue::Formula("=E4*(F4/100)".into())
    );
    assert_eq!(sheet.value("E9").unwrap(), &CellValue::Formula("=SUM(E4:E6)".into()));
    assert_eq!(sheet.value("D9").unwrap().as_text(), Some("발생금액"));
    assert_eq!(sheet.value("G10").unwrap(), &CellValue::Formula("=SUM(G4:G6)".into()));
    assert_eq!(
        sheet.value("G2").unwrap(),
        &CellValue::Formula("=SUBTOTAL(109,G4:G6)".into())
    );
    assert_eq!(sheet.value("A1").unwrap().as_text(), Some("Warranty claims"));
    assert_eq!(sheet.value("A7").unwrap(), &CellValue::Empty);

    assert!(PreprocessGuard::is_preprocessed(&workbook));
}

#[test]
fn test_display_after_preprocess() {
    let mut session = Session::new(claims_workbook(), config()).unwrap();
    session.preprocess().unwrap();

    assert_eq!(session.display_value(4, 7), "0");
    assert_eq!(session.display_value(5, 7), "25,000");
    assert_eq!(session.display_value(6, 7), "9,000");
    assert_eq!(session.display_value(9, 5), "180,000");
    assert_eq!(session.display_value(2, 7), "34,000");
    assert_eq!(session.display_value(4, 3), "2022-01-01");

    // The rate column is editable; the chargeback follows
    assert!(session.set_cell(5, 6, "10"));
    assert_eq!(session.display_value(5, 7), "5,000");
    assert_eq!(session.display_value(10, 7), "14,000");

    let mut filter = RowFilter::new();
    filter.set_column(2, ["20,000"]);
    session.set_filter(filter);
    assert_eq!(session.display_value(2, 7), "9,000");
    assert_eq!(session.display_value(10, 7), "14,000");
}

#[test]
fn test_second_run_is_refused_without_changes() {
    let mut workbook = claims_workbook();
    preprocess(&mut workbook, &config()).unwrap();
    let after_first = workbook.clone();

    let err = preprocess(&mut workbook, &config()).unwrap_err();
    assert!(matches!(err, PreprocessError::AlreadyPreprocessed));
    assert_eq!(workbook, after_first);
}

#[test]
fn test_marker_survives_save_and_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claims.xlsx");

    let mut session = Session::new(claims_workbook(), config()).unwrap();
    session.preprocess().unwrap();
    session.save(&path).unwrap();

    let mut reopened = Workbook::open(&path).unwrap();
    assert!(PreprocessGuard::is_preprocessed(&reopened));
    assert_eq!(
        reopened.worksheet_by_name(META_SHEET_NAME).unwrap().state(),
        claimsheet::SheetState::Hidden
    );

    let sheet = reopened.worksheet(0).unwrap();
    assert_eq!(sheet.value("C4").unwrap(), &date(2022, 1, 1));
    assert_eq!(
        sheet.value("G4").unwrap(),
        &CellValue::Formula("=E4*(F4/100)".into())
    );
    assert!(highlighted(sheet, "B4"));

    assert!(matches!(
        preprocess(&mut reopened, &config()),
        Err(PreprocessError::AlreadyPreprocessed)
    ));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claims.csv");
    assert!(matches!(
        Workbook::new().save(&path),
        Err(Error::UnsupportedFormat(_))
    ));
    assert!(matches!(
        Workbook::open(&path),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_background_preprocess() {
    let mut session = Session::new(claims_workbook(), config()).unwrap();
    assert!(session.set_cell(6, 6, "0"));

    let pending = session.into_background_preprocess().unwrap();
    let outcome = pending.join().unwrap();
    let report = outcome.report.unwrap();

    // The flushed edit was already at 0, so only row 4 changed
    assert_eq!(report.changed_rows.iter().collect::<Vec<_>>(), vec![4]);
    assert_eq!(outcome.session.display_value(6, 7), "0");
    assert!(!outcome.session.is_dirty(6, 6));

    let again = outcome.session.into_background_preprocess().unwrap().join().unwrap();
    assert!(matches!(
        again.report,
        Err(Error::Preprocess(PreprocessError::AlreadyPreprocessed))
    ));
}
