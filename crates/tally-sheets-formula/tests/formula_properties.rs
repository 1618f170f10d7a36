//! End-to-end behaviour of the formula engine against an in-memory sheet

use pretty_assertions::assert_eq;
use tally_sheets_core::{CellError, GridAccessor, Sheet};
use tally_sheets_formula::{
    parse_formula, Dimension, DisplayMode, FormulaEngine, FormulaExpr,
};

/// A1=10, B1=20, A2=30, B2=40 on a 5x5 sheet
fn sample_sheet() -> Sheet {
    let mut sheet = Sheet::new(5, 5);
    sheet.set_cell_value("A1", "10").unwrap();
    sheet.set_cell_value("B1", "20").unwrap();
    sheet.set_cell_value("A2", "30").unwrap();
    sheet.set_cell_value("B2", "40").unwrap();
    sheet
}

#[test]
fn test_sum_over_range() {
    let sheet = sample_sheet();
    let mut engine = FormulaEngine::new();
    assert_eq!(engine.evaluate("=SUM(A1:B2)", &sheet), "100");
}

#[test]
fn test_multiplication_before_addition() {
    let sheet = sample_sheet();
    let mut engine = FormulaEngine::new();
    assert_eq!(engine.evaluate("=A1+B1*2", &sheet), "50");
}

#[test]
fn test_max_over_mixed_arguments() {
    let sheet = sample_sheet();
    let mut engine = FormulaEngine::new();
    assert_eq!(engine.evaluate("=MAX(A1,B1,5)", &sheet), "20");
}

#[test]
fn test_error_codes() {
    let mut sheet = sample_sheet();
    sheet.set_cell_value("C1", "-3.5").unwrap();
    let mut engine = FormulaEngine::new();

    assert_eq!(engine.evaluate("=A1/0", &sheet), "#DIV/0!");
    assert_eq!(engine.evaluate("=C1/0", &sheet), "#DIV/0!");
    assert_eq!(engine.evaluate("=0^0", &sheet), "#NUM!");
    assert_eq!(engine.evaluate("=Z99", &sheet), "#REF!");
    assert_eq!(engine.evaluate("=SQRT(4)", &sheet), "#NAME?");
    assert_eq!(engine.evaluate("=(1+2", &sheet), "#ERROR!");
}

#[test]
fn test_circular_references() {
    let mut sheet = Sheet::new(5, 5);
    sheet.set_cell_formula("A1", "=B1").unwrap();
    sheet.set_cell_formula("B1", "=A1").unwrap();
    let mut engine = FormulaEngine::new();

    assert_eq!(engine.evaluate("=A1", &sheet), "#CIRCULAR!");
    assert_eq!(engine.evaluate("=B1", &sheet), "#CIRCULAR!");
    let a1 = sheet.stored_formula(0, 0).unwrap().to_string();
    assert_eq!(engine.evaluate(&a1, &sheet), "#CIRCULAR!");
}

#[test]
fn test_evaluation_is_idempotent() {
    let mut sheet = sample_sheet();
    sheet.set_cell_formula("C3", "=AVERAGE(A1:B2)/2").unwrap();
    let before = sheet.clone();
    let mut engine = FormulaEngine::new();

    let first = engine.evaluate("=C3+SUM(A1:B2)", &sheet);
    let second = engine.evaluate("=C3+SUM(A1:B2)", &sheet);
    assert_eq!(first, "112.5");
    assert_eq!(first, second);
    assert_eq!(sheet, before);
}

#[test]
fn test_delete_row_invalidates_only_that_reference() {
    let mut sheet = sample_sheet();
    sheet.set_cell_formula("D1", "=A2+SUM(B1,A1)").unwrap();
    sheet.delete_row(1).unwrap();

    let mut engine = FormulaEngine::new();
    let rewrites = engine.on_dimension_deleted(Dimension::Row, 1, &sheet, DisplayMode::Values);
    assert_eq!(rewrites.len(), 1);

    let rewritten = parse_formula(&rewrites[0].formula).unwrap();
    match rewritten {
        FormulaExpr::BinaryOp { left, right, .. } => {
            assert_eq!(*left, FormulaExpr::Error(CellError::Ref));
            assert_eq!(
                *right,
                FormulaExpr::Function {
                    name: "SUM".into(),
                    args: vec![
                        FormulaExpr::CellRef("B1".into()),
                        FormulaExpr::CellRef("A1".into()),
                    ],
                }
            );
        }
        other => panic!("expected a binary operation, got {:?}", other),
    }
}

#[test]
fn test_delete_column_invalidates_range() {
    let mut sheet = sample_sheet();
    sheet.set_cell_formula("E5", "=SUM(A1:B2)+A1").unwrap();
    sheet.delete_column(1).unwrap();

    let mut engine = FormulaEngine::new();
    let rewrites =
        engine.on_dimension_deleted(Dimension::Column, 1, &sheet, DisplayMode::Values);
    assert_eq!(rewrites.len(), 1);
    assert_eq!((rewrites[0].row, rewrites[0].col), (4, 3));
    assert_eq!(rewrites[0].formula, "=SUM(#REF!)+A1");
    assert_eq!(rewrites[0].display, None);
    assert_eq!(engine.evaluate(&rewrites[0].formula, &sheet), "#REF!");
}

#[test]
fn test_unchanged_formulas_are_not_rewritten() {
    let mut sheet = sample_sheet();
    sheet.set_cell_formula("C1", "=A1*2").unwrap();
    sheet.delete_row(4).unwrap();

    let mut engine = FormulaEngine::new();
    let rewrites = engine.on_dimension_deleted(Dimension::Row, 4, &sheet, DisplayMode::Values);
    assert!(rewrites.is_empty());
}
