use casegrid_primitives::address::{
    column_index_to_letter, column_letter_to_index, desanitize_sheet_name,
};
use casegrid_primitives::{AddressError, CellAddress, CellRange};

#[test]
fn test_column_letters_round_trip_edges() {
    assert_eq!(column_index_to_letter(0), "A");
    assert_eq!(column_index_to_letter(25), "Z");
    assert_eq!(column_index_to_letter(26), "AA");
    assert_eq!(column_index_to_letter(701), "ZZ");
    assert_eq!(column_index_to_letter(702), "AAA");

    assert_eq!(column_letter_to_index("A").unwrap(), 0);
    assert_eq!(column_letter_to_index("ab").unwrap(), 27);
    assert_eq!(column_letter_to_index("XFD").unwrap(), 16_383);
}

#[test]
fn test_column_letters_reject_out_of_grid() {
    assert!(matches!(
        column_letter_to_index("XFE"),
        Err(AddressError::InvalidColumn(_))
    ));
    assert!(column_letter_to_index("").is_err());
    assert!(column_letter_to_index("A1").is_err());
}

#[test]
fn test_sheet_name_quoting() {
    assert_eq!(desanitize_sheet_name("'O''Brien'"), "O'Brien");
    assert_eq!(desanitize_sheet_name("Rt"), "Rt");
}

#[test]
fn test_range_from_a1() {
    let range = CellRange::from_a1("C87:C3").unwrap();
    assert_eq!(range.start, CellAddress::new(2, 2));
    assert_eq!(range.end, CellAddress::new(86, 2));
    assert_eq!(CellRange::from_a1("B2").unwrap().rows(), 1);
}
