use casegrid_primitives::CellRange;
use casegrid_sheet::{Book, CellStyle, CellValue, ConditionalRule, Result, Rgb, Sheet, SheetError};
use chrono::NaiveDate;
use tempfile::tempdir;

fn report() -> Book {
    let mut gain = Sheet::with_name("Прирост");
    gain.set_value(0, 0, "Регион");
    gain.set_value(0, 1, NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
    gain.set_value(0, 2, NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());
    gain.set_value(1, 1, CellValue::formula("=Случаев!C2-Случаев!B2"));
    gain.set_value(1, 2, CellValue::formula("=Случаев!D2-Случаев!C2"));

    let mut delta = Sheet::with_name("дельта за сутки");
    delta.set_value(2, 2, CellValue::formula("=Прирост!C2-Прирост!B2"));
    delta.add_conditional_format(ConditionalRule::new(
        CellRange::from_a1("C3:C3").unwrap(),
        "C3>0",
        Rgb::from_hex("F1CCB1").unwrap(),
    ));

    let mut book = Book::new();
    book.add_sheet("Прирост", gain).unwrap();
    book.add_sheet("дельта за сутки", delta).unwrap();
    book
}

#[test]
fn test_sheet_order_is_preserved() {
    let book = report();
    assert_eq!(book.sheet_names(), vec!["Прирост", "дельта за сутки"]);
    assert_eq!(book.sheet_count(), 2);
    assert!(book.has_sheet("Прирост"));
}

#[test]
fn test_column_insert_updates_dependants() -> Result<()> {
    let mut book = report();
    book.insert_columns("Прирост", 2, 1)?;

    let gain = book.get_sheet("Прирост")?;
    assert!(gain.value(0, 2).is_null());
    assert_eq!(
        gain.value(0, 3).as_date(),
        NaiveDate::from_ymd_opt(2021, 1, 3)
    );
    // References to another sheet do not move
    assert_eq!(
        gain.value(1, 3).formula_source(),
        Some("=Случаев!D2-Случаев!C2")
    );

    let delta = book.get_sheet("дельта за сутки")?;
    assert_eq!(
        delta.value(2, 2).formula_source(),
        Some("=Прирост!D2-Прирост!B2")
    );
    // A rule on another sheet keeps its own range
    assert_eq!(delta.conditional_formats()[0].range.to_a1(), "C3:C3");
    Ok(())
}

#[test]
fn test_row_insert_on_missing_sheet() {
    let mut book = report();
    let err = book.insert_rows("Rt", 0, 1).unwrap_err();
    assert!(matches!(err, SheetError::SheetNotFound { .. }));
}

#[test]
fn test_json_round_trip_preserves_everything() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("report.json");

    let mut book = report();
    book.get_sheet_mut("Прирост")?.set_style(
        0,
        1,
        Some(CellStyle::default().with_number_format("DD.MM")),
    );
    book.save_json(&path)?;

    let loaded = Book::from_json_file(&path)?;
    assert_eq!(loaded, book);
    assert_eq!(
        loaded
            .get_sheet("Прирост")?
            .cell(0, 1)
            .style
            .as_ref()
            .and_then(|s| s.number_format.as_deref()),
        Some("DD.MM")
    );
    Ok(())
}

#[test]
fn test_xlsx_export_then_import() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("report.xlsx");
    report().save_as_xlsx(&path)?;

    let loaded = Book::from_xlsx(&path)?;
    assert_eq!(loaded.sheet_names(), vec!["Прирост", "дельта за сутки"]);
    let delta = loaded.get_sheet("дельта за сутки")?;
    assert_eq!(
        delta.value(2, 2).formula_source(),
        Some("=Прирост!C2-Прирост!B2")
    );
    // Import does not carry conditional rules
    assert!(delta.conditional_formats().is_empty());
    Ok(())
}
