use casegrid_formulas::{adjust_for_insertion, Axis, Formula, Insertion};
use casegrid_primitives::{CellAddress, CellRange};
use serde::{Deserialize, Serialize};

use crate::cell::Rgb;
use crate::error::{Result, SheetError};

/// Expression-driven highlighting over a rectangular range.
///
/// `expression` is written relative to the range's top-left cell, without a
/// leading `=` (e.g. `F3>0`), and the fill applies to every cell for which it
/// holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRule {
    #[serde(with = "a1_range")]
    pub range: CellRange,
    pub expression: String,
    pub fill: Rgb,
}

impl ConditionalRule {
    pub fn new(range: CellRange, expression: impl Into<String>, fill: Rgb) -> Self {
        Self {
            range: range.normalized(),
            expression: expression.into(),
            fill,
        }
    }

    /// Shift the range and expression references for an insertion on `target`.
    pub(crate) fn adjust_for_insertion(
        &mut self,
        home: &str,
        target: &str,
        insertion: Insertion,
    ) -> Result<()> {
        if home.to_lowercase() == target.to_lowercase() {
            self.range = CellRange::new(
                push(self.range.start, insertion),
                push(self.range.end, insertion),
            );
        }
        let formula = Formula::parse(&self.expression).map_err(|source| SheetError::Formula {
            sheet: home.to_string(),
            cell: self.range.to_a1(),
            source,
        })?;
        let adjusted = adjust_for_insertion(&formula, insertion, |prefix| match prefix {
            Some(prefix) => prefix.matches(target),
            None => home.to_lowercase() == target.to_lowercase(),
        })
        .map_err(|source| SheetError::Formula {
            sheet: home.to_string(),
            cell: self.range.to_a1(),
            source,
        })?;
        self.expression = adjusted.to_string();
        Ok(())
    }
}

fn push(addr: CellAddress, insertion: Insertion) -> CellAddress {
    match insertion.axis {
        Axis::Column if addr.col >= insertion.at => {
            CellAddress::new(addr.row, addr.col + insertion.count)
        }
        Axis::Row if addr.row >= insertion.at => {
            CellAddress::new(addr.row + insertion.count, addr.col)
        }
        _ => addr,
    }
}

mod a1_range {
    use casegrid_primitives::CellRange;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(range: &CellRange, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&range.to_a1())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CellRange, D::Error> {
        let text = String::deserialize(deserializer)?;
        CellRange::from_a1(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> ConditionalRule {
        ConditionalRule::new(
            CellRange::from_a1("F3:F87").unwrap(),
            "F3>0",
            Rgb::from_hex("F1CCB1").unwrap(),
        )
    }

    #[test]
    fn test_serializes_range_as_a1() {
        let json = serde_json::to_string(&rule()).unwrap();
        assert_eq!(json, r#"{"range":"F3:F87","expression":"F3>0","fill":"F1CCB1"}"#);
        let back: ConditionalRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule());
    }

    #[test]
    fn test_insertion_before_range_moves_it() {
        let mut rule = rule();
        let insertion = Insertion {
            axis: Axis::Column,
            at: 2,
            count: 1,
        };
        rule.adjust_for_insertion("дельта", "дельта", insertion).unwrap();
        assert_eq!(rule.range.to_a1(), "G3:G87");
        assert_eq!(rule.expression, "G3>0");
    }

    #[test]
    fn test_insertion_on_other_sheet_leaves_rule() {
        let mut rule = rule();
        let insertion = Insertion {
            axis: Axis::Row,
            at: 0,
            count: 4,
        };
        rule.adjust_for_insertion("дельта", "Rt", insertion).unwrap();
        assert_eq!(rule, self::tests::rule());
    }
}
