//! Write a workbook to disk and read it back

use chrono::NaiveDate;
use claimsheet_core::{CellRange, CellValue, Color, NumberFormat, SheetState, Style, Workbook};
use claimsheet_xlsx::{read_xlsx, write_xlsx};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn claims_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();

    sheet.set_cell_value("A3", "Vehicle").unwrap();
    sheet.set_cell_value("B3", "Sale Date").unwrap();
    sheet.set_cell_value("C3", "Occurrence Amount").unwrap();
    sheet.set_cell_value("A4", "SUV").unwrap();
    sheet.merge("A4:A5").unwrap();
    sheet
        .set_cell_value("B4", NaiveDate::from_ymd_opt(2021, 3, 15).unwrap())
        .unwrap();
    sheet.set_cell_value("C4", 1_000_000).unwrap();
    sheet.set_cell_value("C5", 250_000.5).unwrap();
    sheet.set_cell_value("C8", CellValue::formula("SUBTOTAL(109,C4:C5)")).unwrap();
    sheet.set_cell_value("D4", true).unwrap();
    sheet
        .set_fill_at(4, 2, claimsheet_core::FillStyle::solid(Color::YELLOW))
        .unwrap();
    sheet.set_row_hidden(5, true);

    let meta = workbook.add_worksheet_with_name("_META").unwrap();
    let meta = workbook.worksheet_mut(meta).unwrap();
    meta.set_cell_value("A1", "1").unwrap();
    meta.set_state(SheetState::Hidden);

    workbook
}

#[test]
fn test_roundtrip_preserves_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claims.xlsx");

    write_xlsx(&claims_workbook(), &path).unwrap();
    let workbook = read_xlsx(&path).unwrap();

    assert_eq!(workbook.sheet_count(), 2);
    let sheet = workbook.worksheet(0).unwrap();
    assert_eq!(sheet.value_at(3, 3).as_text(), Some("Occurrence Amount"));
    assert_eq!(sheet.value_at(4, 1).as_text(), Some("SUV"));
    assert_eq!(sheet.value_at(4, 3), &CellValue::Number(1_000_000.0));
    assert_eq!(sheet.value_at(5, 3), &CellValue::Number(250_000.5));
    assert_eq!(
        sheet.value_at(8, 3),
        &CellValue::Formula("=SUBTOTAL(109,C4:C5)".into())
    );
    assert_eq!(sheet.value_at(4, 4), &CellValue::Boolean(true));
    assert_eq!(
        sheet.value_at(4, 2),
        &CellValue::from(NaiveDate::from_ymd_opt(2021, 3, 15).unwrap())
    );
    assert_eq!(sheet.merged_regions(), &[CellRange::parse("A4:A5").unwrap()]);
    assert!(sheet.is_row_hidden(5));
    assert!(!sheet.is_row_hidden(4));

    let style = sheet.style_at(4, 2);
    assert_eq!(style.fill_rgb(), Some(Color::YELLOW));
    assert!(style.number_format.is_date_format());

    let meta = workbook.worksheet_by_name("_META").unwrap();
    assert_eq!(meta.state(), SheetState::Hidden);
    assert_eq!(meta.value_at(1, 1).as_text(), Some("1"));
}

#[test]
fn test_existing_date_format_is_kept() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    let slashed = Style::new().with_number_format(NumberFormat::Custom("yyyy/mm/dd".into()));
    sheet.set_cell_style_at(2, 1, &slashed).unwrap();
    sheet
        .set_cell_value_at(2, 1, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("dates.xlsx");
    write_xlsx(&workbook, &path).unwrap();

    let sheet = read_xlsx(&path).unwrap().worksheet(0).unwrap().clone();
    assert_eq!(sheet.style_at(2, 1), slashed);
    assert!(matches!(sheet.value_at(2, 1), CellValue::Date(_)));
}
