use casegrid_report::{
    compute_horizon, Dataset, EntityIndex, KeyNormalizer, Record, Refresher, ReportError,
    ReportLayout,
};
use casegrid_sheet::{Book, CellValue, Sheet};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::json;

const LAYOUT: &str = r#"
anchor:
  sheet: Случаев
  header_row: 1
report_day: 5
sheets:
  - sheet: Прирост
    strategy:
      kind: daily_formulas
      header_rows: [1]
      placement: first_empty
      rows: ["2-3"]
      publish_frontier: gain
  - sheet: Случаев
    strategy:
      kind: daily_values
      header_row: 1
      label_col: 1
      rows: ["2-3"]
      metric: cases
      formula_rows: [4]
  - sheet: Прирост нед
    strategy:
      kind: weekly_formulas
      counter_rows: [1]
      placement: first_empty
      insert: true
      rows: ["2-3"]
      anchored:
        rows: ["2-3"]
        frontier: gain
"#;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
}

fn refresher() -> Refresher {
    Refresher::new(ReportLayout::from_yaml_str(LAYOUT).unwrap()).unwrap()
}

/// Feed covering Jan 1 to Jan `last`; Moscow reports 100 * day, the
/// Moscow region 10 * day.
fn feed(last: u32) -> Dataset {
    feed_with_history(last, last)
}

/// Same feed, but each record only carries the most recent `history` days.
fn feed_with_history(last: u32, history: u32) -> Dataset {
    let dates: Vec<String> = (1..=last).map(|d| day(d).to_string()).collect();
    let series =
        |scale: u32| (last - history + 1..=last).map(|d| vec![d * scale]).collect::<Vec<_>>();
    let doc = json!({
        "russia_stat_struct": {
            "dates": dates,
            "data": {
                "77": {
                    "info": { "name": "Москва", "short_name": "Москва" },
                    "cases": series(100),
                },
                "50": {
                    "info": { "name": "Московская область", "short_name": "Подмосковье" },
                    "cases": series(10),
                    "population": 7_700_000,
                },
            },
        },
    });
    Dataset::from_feed_json(&doc.to_string()).unwrap()
}

/// Workbook recorded up to Jan 3.
fn workbook(moscow_region_label: &str) -> Book {
    let mut cases = Sheet::with_name("Случаев");
    cases.set_value(0, 0, "Регион");
    cases.set_value(1, 0, "Москва");
    cases.set_value(2, 0, moscow_region_label);
    cases.set_value(3, 0, "Итого");
    for d in 1..=3 {
        let col = d as usize;
        cases.set_value(0, col, day(d));
        cases.set_value(1, col, i64::from(d) * 100);
        cases.set_value(2, col, i64::from(d) * 10);
        let letter = char::from(b'A' + col as u8);
        cases.set_value(3, col, CellValue::formula(format!("=SUM({letter}2:{letter}3)")));
    }

    let mut gain = Sheet::with_name("Прирост");
    gain.set_value(0, 0, "Регион");
    gain.set_value(0, 1, day(2));
    gain.set_value(0, 2, day(3));
    for row in 1..=2 {
        let n = row + 1;
        gain.set_value(row, 0, cases.value(row, 0).clone());
        gain.set_value(row, 1, CellValue::formula(format!("=Случаев!C{n}-Случаев!B{n}")));
        gain.set_value(row, 2, CellValue::formula(format!("=Случаев!D{n}-Случаев!C{n}")));
    }

    let mut weekly = Sheet::with_name("Прирост нед");
    weekly.set_value(0, 0, "Регион");
    weekly.set_value(0, 1, 1);
    for row in 1..=2 {
        let n = row + 1;
        weekly.set_value(row, 0, cases.value(row, 0).clone());
        weekly.set_value(row, 1, CellValue::formula(format!("=SUM(Прирост!$B{n}:$C{n})")));
    }

    let mut book = Book::new();
    book.add_sheet("Случаев", cases).unwrap();
    book.add_sheet("Прирост", gain).unwrap();
    book.add_sheet("Прирост нед", weekly).unwrap();
    book
}

#[test]
fn test_two_day_horizon_fills_from_the_end_of_each_record() {
    let mut book = workbook("Московская обл.");
    let summary = refresher().run(&mut book, &feed(5)).unwrap();
    assert_eq!(summary.plan.horizon, 2);
    assert_eq!(summary.plan.new_periods, vec![day(4), day(5)]);

    let cases = book.get_sheet("Случаев").unwrap();
    assert_eq!(cases.value(0, 4), &CellValue::Date(day(4)));
    assert_eq!(cases.value(0, 5), &CellValue::Date(day(5)));
    assert_eq!(cases.value(1, 4), &CellValue::Int(400));
    assert_eq!(cases.value(1, 5), &CellValue::Int(500));
    assert_eq!(cases.value(2, 5), &CellValue::Int(50));
    assert_eq!(cases.value(3, 4).formula_source(), Some("=SUM(E2:E3)"));
    assert_eq!(cases.value(3, 5).formula_source(), Some("=SUM(F2:F3)"));

    let gain = book.get_sheet("Прирост").unwrap();
    assert_eq!(gain.value(1, 4).formula_source(), Some("=Случаев!F2-Случаев!E2"));
}

#[test]
fn test_unresolved_row_aborts_without_mutation() {
    let mut book = workbook("Атлантида");
    let before = book.clone();
    let err = refresher().run(&mut book, &feed(5)).unwrap_err();
    assert!(matches!(err, ReportError::UnresolvedEntity { ref label, .. } if label == "Атлантида"));
    // the gain sheet ran first and was extended on the staged copy only
    assert_eq!(book, before);
}

#[test]
fn test_weekly_sheet_untouched_before_report_day() {
    let mut book = workbook("Московская обл.");
    let weekly_before = book.get_sheet("Прирост нед").unwrap().clone();
    // Jan 4 to Jan 7 2021 run Monday to Thursday
    let summary = refresher().run(&mut book, &feed(7)).unwrap();
    assert!(summary.plan.trigger_periods.is_empty());
    assert_eq!(book.get_sheet("Прирост нед").unwrap(), &weekly_before);
    assert_eq!(summary.sheets[2].columns_added, 0);
}

#[test]
fn test_weekly_sheet_repoints_to_gain_frontier() {
    let mut book = workbook("Московская обл.");
    let summary = refresher().run(&mut book, &feed(8)).unwrap();
    assert_eq!(summary.plan.trigger_periods, vec![day(8)]);
    assert_eq!(summary.columns_added(), 5 + 5 + 1);

    // Jan 8 landed in column H of the gain sheet
    let gain = book.get_sheet("Прирост").unwrap();
    assert_eq!(gain.value(0, 7), &CellValue::Date(day(8)));

    let weekly = book.get_sheet("Прирост нед").unwrap();
    assert_eq!(weekly.value(0, 2), &CellValue::Int(2));
    assert_eq!(weekly.value(1, 2).formula_source(), Some("=SUM(Прирост!$B2:$H2)"));
    assert_eq!(weekly.value(2, 2).formula_source(), Some("=SUM(Прирост!$B3:$H3)"));
    assert_eq!(weekly.value(1, 1).formula_source(), Some("=SUM(Прирост!$B2:$C2)"));
}

#[test]
fn test_short_history_aborts_without_mutation() {
    let mut book = workbook("Московская обл.");
    let before = book.clone();
    // five new days, three days of history per record
    let err = refresher().run(&mut book, &feed_with_history(8, 3)).unwrap_err();
    assert!(matches!(
        err,
        ReportError::MetricIndexOutOfRange { ref metric, len: 3, .. } if metric == "cases"
    ));
    assert_eq!(book, before);
}

#[test]
fn test_offset_past_history_is_out_of_range() {
    let mut metrics = IndexMap::new();
    metrics.insert("cases".to_string(), (1..=5).map(|n| vec![Some(f64::from(n))]).collect());
    let record = Record {
        id: "16".to_string(),
        name: "Республика Татарстан".to_string(),
        short_name: "Татарстан".to_string(),
        metrics,
        auxiliary: serde_json::Map::new(),
    };
    assert_eq!(record.metric("cases", -5).unwrap(), CellValue::Int(1));
    assert!(matches!(
        record.metric("cases", -6),
        Err(ReportError::MetricIndexOutOfRange { offset: -6, len: 5, .. })
    ));
}

#[test]
fn test_long_and_short_labels_resolve_alike() {
    let dataset = feed(3);
    let normalizer = KeyNormalizer::default();
    let index = EntityIndex::build(&dataset, &normalizer, &IndexMap::new());
    let long = index.resolve("Московская область").unwrap();
    let short = index.resolve("Подмосковье").unwrap();
    assert_eq!(long, short);
    assert_eq!(index.resolve("Московская обл.").unwrap().id, "50");
    assert_eq!(
        normalizer.normalize("Московская обл."),
        normalizer.normalize("Московская обл.")
    );
}

#[test]
fn test_horizon_properties() {
    for k in 0..40 {
        let later = day(1) + chrono::Days::new(k);
        assert_eq!(u64::from(compute_horizon(day(1), later).unwrap()), k);
    }
    assert!(matches!(
        compute_horizon(day(2), day(1)),
        Err(ReportError::StalePeriodPrecondition { .. })
    ));
}
