//! Grid model properties: merged cells read and lock as one, and history
//! replays back to the same overlay

use claimsheet::{CellValue, EditableColumns, GridModel, InvalidEdit, Worksheet};
use proptest::prelude::*;

/// Header on row 3; B5:C7 and E4:E5 merged
fn sheet() -> Worksheet {
    let mut sheet = Worksheet::new("Claims");
    for col in 1..=6u16 {
        sheet.set_cell_value_at(3, col, format!("Column {}", col)).unwrap();
    }
    for row in 4..=10u32 {
        for col in 1..=6u16 {
            sheet
                .set_cell_value_at(row, col, f64::from(row * 10 + u32::from(col)))
                .unwrap();
        }
    }
    sheet.merge("B5:C7").unwrap();
    sheet.merge("E4:E5").unwrap();
    sheet
}

fn edit_all_model(sheet: &Worksheet) -> GridModel {
    let mut model = GridModel::new(sheet, 3, EditableColumns::default());
    model.set_edit_all(true);
    model
}

fn edit() -> impl Strategy<Value = (u32, u16, Option<i32>)> {
    (1u32..=12, 1u16..=7, proptest::option::of(-5i32..5))
}

fn value(v: Option<i32>) -> CellValue {
    v.map(|n| CellValue::Number(f64::from(n)))
        .unwrap_or(CellValue::Empty)
}

#[test]
fn test_header_and_merged_secondaries_are_locked() {
    let sheet = sheet();
    let mut model = edit_all_model(&sheet);

    assert_eq!(model.check_editable(3, 1), Err(InvalidEdit::HeaderRow));
    assert_eq!(model.check_editable(7, 3), Err(InvalidEdit::SecondaryMergedCell));
    assert!(!model.set(&sheet, 3, 2, CellValue::Number(1.0)));
    assert!(!model.set(&sheet, 6, 2, CellValue::Number(1.0)));
    assert!(model.overlay().is_empty());
}

proptest! {
    #[test]
    fn prop_merged_cells_read_and_lock_as_one(
        edits in proptest::collection::vec(edit(), 0..20),
        row in 5u32..=7,
        col in 2u16..=3,
    ) {
        let sheet = sheet();
        let mut model = edit_all_model(&sheet);
        for (r, c, v) in edits {
            model.set(&sheet, r, c, value(v));
        }

        prop_assert_eq!(model.get(&sheet, row, col), model.get(&sheet, 5, 2));
        prop_assert_eq!(model.get(&sheet, 5, 5), model.get(&sheet, 4, 5));

        if (row, col) != (5, 2) {
            let before = model.overlay().clone();
            prop_assert!(!model.set(&sheet, row, col, CellValue::text("x")));
            prop_assert_eq!(model.overlay(), &before);
        }
    }

    #[test]
    fn prop_overlay_is_keyed_by_anchor(edits in proptest::collection::vec(edit(), 0..30)) {
        let sheet = sheet();
        let mut model = edit_all_model(&sheet);
        for (r, c, v) in edits {
            model.set(&sheet, r, c, value(v));
        }
        for &(r, c) in model.overlay().keys() {
            prop_assert_eq!(model.canonical(r, c), (r, c));
        }
    }

    #[test]
    fn prop_undo_all_then_redo_all_restores_overlay(
        edits in proptest::collection::vec(edit(), 0..40),
    ) {
        let sheet = sheet();
        let mut model = edit_all_model(&sheet);
        for (r, c, v) in edits {
            model.set(&sheet, r, c, value(v));
        }
        let after_edits = model.overlay().clone();

        let mut undone = 0;
        while model.undo().is_some() {
            undone += 1;
        }
        prop_assert!(model.overlay().is_empty());

        for _ in 0..undone {
            prop_assert!(model.redo().is_some());
        }
        prop_assert_eq!(model.overlay(), &after_edits);
    }
}
