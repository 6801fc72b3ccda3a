use casegrid_formulas::{translate, translate_formula, Formula, Offset, TranslationMode};

const RELATIVE_FORMULAS: &[&str] = &[
    "=C5-B5",
    "=SUM(C2:C86)",
    "=IF(Случаев!D5=0,0,(Случаев!E5-Случаев!D5)/Случаев!D5)",
    "=AVERAGE('прирост 7дн'!C3:I3)*$B$1",
    "=SUM(D:D)-SUM(4:6)",
];

#[test]
fn test_shift_round_trip_restores_source() {
    for source in RELATIVE_FORMULAS {
        for offset in [Offset::new(0, 1), Offset::new(1, 0), Offset::new(3, 2)] {
            let there = translate_formula(source, offset, TranslationMode::Shift).unwrap();
            let back = translate_formula(&there, offset.inverse(), TranslationMode::Shift).unwrap();
            assert_eq!(&back, source, "offset {offset:?}");
        }
    }
}

#[test]
fn test_shift_is_deterministic() {
    let formula = Formula::parse(RELATIVE_FORMULAS[2]).unwrap();
    let first = translate(&formula, Offset::new(0, 1), TranslationMode::Shift).unwrap();
    let second = translate(&formula, Offset::new(0, 1), TranslationMode::Shift).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_repoint_with_unchanged_frontier_keeps_anchor() {
    let source = "=SUM(Прирост!$C5:$AB5)/SUM(Прирост!$C$88:$AB$88)";
    // AB is column index 27.
    let out = translate_formula(
        source,
        Offset::new(0, 1),
        TranslationMode::AnchorRepoint { frontier_col: 27 },
    )
    .unwrap();
    assert_eq!(out, source);
}

#[test]
fn test_repoint_follows_advancing_frontier() {
    let source = "=SUM(Прирост!$C5:$AB5)/SUM(Прирост!$C$88:$AB$88)";
    let mut previous = source.to_string();
    for frontier_col in 28..32 {
        let out = translate_formula(
            source,
            Offset::new(0, 1),
            TranslationMode::AnchorRepoint { frontier_col },
        )
        .unwrap();
        assert_ne!(out, previous);
        let formula = Formula::parse(&out).unwrap();
        for reference in formula.references() {
            let end_col = reference.end.and_then(|end| end.column()).unwrap();
            assert_eq!(end_col.index, frontier_col);
            assert!(end_col.absolute);
            assert_eq!(reference.start.column().unwrap().index, 2);
        }
        previous = out;
    }
}

#[test]
fn test_shift_does_not_move_pinned_window_end() {
    // Plain shifting would leave the window stuck; this is why repointing exists.
    let source = "=SUM(Прирост!$C5:$AB5)";
    let out = translate_formula(source, Offset::new(0, 1), TranslationMode::Shift).unwrap();
    assert_eq!(out, source);
}
