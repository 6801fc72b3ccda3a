use casegrid_primitives::CellAddress;
use casegrid_sheet::Sheet;
use chrono::{Days, NaiveDate};

use crate::error::{ReportError, Result};

/// Whole days from `last_recorded` to `last_available`.
///
/// Stale data (available before recorded) is an error rather than zero.
pub fn compute_horizon(last_recorded: NaiveDate, last_available: NaiveDate) -> Result<u32> {
    let days = (last_available - last_recorded).num_days();
    if days < 0 {
        return Err(ReportError::StalePeriodPrecondition {
            recorded: last_recorded,
            available: last_available,
        });
    }
    Ok(u32::try_from(days).unwrap_or(u32::MAX))
}

/// The `horizon` days following `last_recorded`, oldest first.
pub fn new_periods(last_recorded: NaiveDate, horizon: u32) -> Vec<NaiveDate> {
    (1..=u64::from(horizon))
        .map_while(|step| last_recorded.checked_add_days(Days::new(step)))
        .collect()
}

/// Last recorded period of a sheet: the last filled cell of its header row,
/// which must hold a date.
pub fn recorded_period(sheet: &Sheet, header_row: usize) -> Result<(usize, NaiveDate)> {
    let violation = |col: usize, detail: String| ReportError::ContiguityViolation {
        sheet: sheet.name().to_string(),
        cell: CellAddress::new(header_row as u32, col as u32).to_a1(),
        detail,
    };
    let col = sheet
        .last_filled_in_row(header_row)
        .ok_or_else(|| violation(0, "header row is empty".to_string()))?;
    let value = sheet.value(header_row, col);
    let date = value
        .as_date()
        .ok_or_else(|| violation(col, format!("last header {value:?} is not a date")))?;
    Ok((col, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegrid_sheet::CellValue;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    #[test]
    fn test_same_period_is_zero() {
        assert_eq!(compute_horizon(day(3), day(3)).unwrap(), 0);
    }

    #[test]
    fn test_counts_whole_days() {
        for k in 0..20u32 {
            let later = day(1).checked_add_days(Days::new(u64::from(k))).unwrap();
            assert_eq!(compute_horizon(day(1), later).unwrap(), k);
        }
        // Across a month boundary
        let feb = NaiveDate::from_ymd_opt(2021, 2, 2).unwrap();
        assert_eq!(compute_horizon(day(30), feb).unwrap(), 3);
    }

    #[test]
    fn test_stale_data_is_an_error() {
        let err = compute_horizon(day(5), day(4)).unwrap_err();
        assert!(matches!(
            err,
            ReportError::StalePeriodPrecondition { recorded, available }
                if recorded == day(5) && available == day(4)
        ));
    }

    #[test]
    fn test_new_periods() {
        assert_eq!(new_periods(day(3), 2), vec![day(4), day(5)]);
        assert!(new_periods(day(3), 0).is_empty());
    }

    #[test]
    fn test_recorded_period_reads_last_header() {
        let sheet = Sheet::from_values(
            "Случаев",
            vec![vec![
                CellValue::from("Регион"),
                CellValue::from(day(2)),
                CellValue::from(day(3)),
            ]],
        );
        assert_eq!(recorded_period(&sheet, 0).unwrap(), (2, day(3)));

        let mut broken = sheet.clone();
        broken.set_value(0, 3, "итого");
        assert!(matches!(
            recorded_period(&broken, 0),
            Err(ReportError::ContiguityViolation { .. })
        ));
        assert!(matches!(
            recorded_period(&sheet, 5),
            Err(ReportError::ContiguityViolation { .. })
        ));
    }
}
