use serde::Serialize;

use super::comparison::{Cell, coverage_change};
use crate::services::flags::{FlagComparison, FlagTotals};

/// One row of the pull request flags card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagRow {
    pub name: String,
    pub head: Cell,
    pub patch: Cell,
    /// Head minus base; absent unless both are known.
    pub change: Option<f64>,
}

pub fn create_flags_table_data(flags: &[Option<FlagComparison>]) -> Vec<FlagRow> {
    flags.iter().flatten().map(flag_row).collect()
}

fn percent(totals: Option<&FlagTotals>) -> Option<f64> {
    totals.and_then(|t| t.percent_covered)
}

fn flag_row(flag: &FlagComparison) -> FlagRow {
    let head = percent(flag.head_totals.as_ref());
    let base = percent(flag.base_totals.as_ref());

    FlagRow {
        name: flag.name.clone(),
        head: Cell::from_option(head),
        patch: Cell::from_option(percent(flag.patch_totals.as_ref())),
        change: coverage_change(head, base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(percent_covered: Option<f64>) -> Option<FlagTotals> {
        Some(FlagTotals { percent_covered })
    }

    #[test]
    fn test_flag_row() {
        let flags = vec![Some(FlagComparison {
            name: "secondTest".to_string(),
            head_totals: totals(Some(82.71)),
            base_totals: totals(Some(80.0)),
            patch_totals: totals(Some(59.0)),
        })];

        let rows = create_flags_table_data(&flags);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "secondTest");
        assert_eq!(rows[0].head.to_string(), "82.71%");
        assert_eq!(rows[0].patch.to_string(), "59.00%");
        let change = rows[0].change.expect("change");
        assert!((change - 2.71).abs() < 1e-9);
    }

    #[test]
    fn test_missing_base_leaves_change_absent() {
        let flags = vec![
            None,
            Some(FlagComparison {
                name: "unit".to_string(),
                head_totals: totals(Some(50.0)),
                base_totals: totals(None),
                patch_totals: None,
            }),
        ];

        let rows = create_flags_table_data(&flags);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].change, None);
        assert_eq!(rows[0].patch, Cell::Placeholder);
    }

    #[test]
    fn test_no_flags() {
        assert!(create_flags_table_data(&[]).is_empty());
    }
}
