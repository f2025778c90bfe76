//! Reconciling forecast values between two versions of a P&L statement.
//!
//! The stages run in order on in-memory rows:
//! 1. [`match_rows`] pairs target rows with source rows by account identity,
//! 2. [`apply_forecast`] copies the source's forecast months onto matched rows,
//! 3. [`plan_merge`] inserts unmatched source detail rows into the target's sections,
//! 4. [`recalculate_totals`] recomputes every total from its section,
//! 5. [`diff_rows`] reduces the result to the field changes worth writing.
//!
//! Nothing here touches the store; see [`crate::fill`] for the persisted operation.

mod diff;
mod matching;
mod merge;
mod sections;
#[cfg(test)]
pub(crate) mod testing;
mod totals;

pub use diff::diff_rows;
pub use matching::{MatchResult, MatchTier, RowMatch, match_rows};
pub use merge::{MergePlan, MergedRow, plan_merge};
pub use sections::{SectionIndex, normalize, section_key, section_span};
pub use totals::{recalculate_totals, sum_details};

use std::collections::HashMap;

use crate::model::{LineItem, Month, RowPatch};

/// Copy `months` and the pct pair from each matched source row onto its target row.
///
/// Header rows carry no values and are never written.
pub fn apply_forecast(
    target: &mut [LineItem],
    source: &[LineItem],
    matches: &MatchResult,
    months: &[Month],
) {
    for (i, row) in target.iter_mut().enumerate() {
        if row.row_type.is_header() {
            continue;
        }
        let Some(from) = matches.source_of(i).map(|s| &source[s]) else {
            continue;
        };
        for &month in months {
            row.months.set(month, from.months.get(month));
        }
        row.pct = from.pct.clone();
    }
}

/// Outcome of reconciling a target statement against a source statement.
#[derive(Debug)]
pub struct Reconciliation {
    /// Value changes of rows that already exist in the target.
    pub patches: Vec<RowPatch>,
    /// The merged target: row order changes and the rows to insert.
    pub plan: MergePlan,
    pub matched: usize,
    pub recalculated: usize,
}

/// Run every stage on `target` (sorted by row order), rewriting only `forecast` months.
pub fn reconcile(
    source: &[LineItem],
    mut target: Vec<LineItem>,
    forecast: &[Month],
) -> Reconciliation {
    let original: HashMap<_, _> = target.iter().map(|row| (row.id, row.clone())).collect();

    let matches = match_rows(source, &target);
    apply_forecast(&mut target, source, &matches, forecast);

    let mut plan = plan_merge(source, &matches.consumed, target, forecast);
    let recalculated = recalculate_totals(&mut plan.rows, forecast);
    let patches = diff_rows(&original, plan.existing(), forecast);

    Reconciliation {
        patches,
        plan,
        matched: matches.matched_count(),
        recalculated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MonthValues, PctBasis, RowId};
    use crate::reconcile::testing::{
        WithMonth, detail, header, render, scope, statement_at, sub_header, total,
    };
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    /// The target as it would be stored after persisting `result`.
    fn persisted(result: Reconciliation, mut next_id: RowId) -> Vec<LineItem> {
        result
            .plan
            .rows
            .into_iter()
            .map(|row| match row {
                MergedRow::Existing(row) => row,
                MergedRow::Inserted(row) => {
                    next_id += 1;
                    row.into_line_item(next_id, scope().draft())
                }
            })
            .collect()
    }

    fn income_source() -> Vec<LineItem> {
        statement_at(
            1,
            Some(7),
            vec![
                header("Income"),
                detail("Rent", Some("R1")).with(Month::Feb, dec!(150)),
                detail("Parking", Some("R2")).with(Month::Feb, dec!(50)),
                total("Total Income").with(Month::Feb, dec!(200)),
            ],
        )
    }

    #[test]
    fn fills_inserts_and_recalculates() {
        let source = income_source();
        let target = statement_at(
            100,
            None,
            vec![
                header("Income"),
                detail("Rent", Some("R1")).with(Month::Jan, dec!(100)),
                total("Total Income").with(Month::Jan, dec!(100)),
            ],
        );
        let forecast = Month::forecast(1).unwrap();

        let result = reconcile(&source, target, forecast);
        assert_eq!(result.matched, 3);
        assert_eq!(result.recalculated, 1);
        assert_eq!(result.plan.reorders, vec![(102, 4)]);
        assert_eq!(result.plan.inserted_count(), 1);

        let patched: Vec<_> = result
            .patches
            .iter()
            .map(|patch| (patch.row_id, patch.months.clone()))
            .collect();
        assert_eq!(
            patched,
            vec![
                (101, BTreeMap::from([(Month::Feb, dec!(150))])),
                (102, BTreeMap::from([(Month::Feb, dec!(200))])),
            ]
        );

        let rows = persisted(result, 102);
        insta::assert_snapshot!(render(&rows, &[Month::Jan, Month::Feb]), @r"
        1  section  Income            jan=0.00 feb=0.00
        2  detail   Rent              jan=100.00 feb=150.00
        3  detail   Parking           jan=0.00 feb=50.00
        4  total    Total Income      jan=100.00 feb=200.00
        ");
    }

    #[test]
    fn second_run_changes_nothing() {
        let source = income_source();
        let target = statement_at(
            100,
            None,
            vec![
                header("Income"),
                detail("Rent", Some("R1")).with(Month::Jan, dec!(100)),
                total("Total Income").with(Month::Jan, dec!(100)),
            ],
        );
        let forecast = Month::forecast(1).unwrap();

        let first = reconcile(&source, target, forecast);
        let rows = persisted(first, 102);

        let second = reconcile(&source, rows, forecast);
        assert!(second.patches.is_empty());
        assert!(second.plan.reorders.is_empty());
        assert_eq!(second.plan.inserted_count(), 0);
    }

    #[test]
    fn totals_equal_sum_of_details_after_fill() {
        let source = statement_at(
            1,
            Some(3),
            vec![
                header("Expenses"),
                sub_header("Vehicles"),
                detail("Fuel", Some("6000"))
                    .with(Month::Oct, dec!(410.333))
                    .with(Month::Dec, dec!(0.005)),
                detail("Repairs", Some("6100")).with(Month::Oct, dec!(89.90)),
                total("Total Vehicles"),
                detail("Insurance", Some("6500")).with(Month::Dec, dec!(1200)),
                total("Total Expenses"),
            ],
        );
        let target = statement_at(
            50,
            None,
            vec![
                header("Expenses"),
                sub_header("Vehicles"),
                detail("Fuel", Some("6000")).with(Month::Oct, dec!(1)),
                total("Total Vehicles").with(Month::Oct, dec!(1)),
                total("Total Expenses").with(Month::Oct, dec!(1)),
            ],
        );
        let forecast = Month::forecast(9).unwrap();

        let result = reconcile(&source, target, forecast);
        let rows = persisted(result, 54);

        // account headers do not anchor inserts: Repairs lands before the section total

        insta::assert_snapshot!(render(&rows, forecast), @r"
        1  section  Expenses          oct=0.00 nov=0.00 dec=0.00
        2  account  Vehicles          oct=0.00 nov=0.00 dec=0.00
        3  detail   Fuel              oct=410.33 nov=0.00 dec=0.01
        4  total    Total Vehicles    oct=410.33 nov=0.00 dec=0.01
        5  detail   Repairs           oct=89.90 nov=0.00 dec=0.00
        6  detail   Insurance         oct=0.00 nov=0.00 dec=1200.00
        7  total    Total Expenses    oct=500.23 nov=0.00 dec=1200.01
        ");
    }

    #[test]
    fn pct_pair_follows_the_source() {
        let mut source = statement_at(1, Some(2), vec![detail("Burden", Some("7100"))]);
        source[0].pct = PctBasis {
            pct_of_total: Some(dec!(12.5)),
            pct_source: Some("Wages".to_owned()),
        };
        let target = statement_at(10, None, vec![detail("Burden", Some("7100"))]);

        let result = reconcile(&source, target, &Month::ALL);
        assert_eq!(result.patches.len(), 1);
        assert_eq!(result.patches[0].pct, Some(source[0].pct.clone()));
    }

    #[test]
    fn headers_are_never_filled() {
        let mut source = statement_at(1, Some(2), vec![header("Income")]);
        source[0].months = MonthValues::default().with(Month::Dec, dec!(5));
        let target = statement_at(10, None, vec![header("Income")]);

        let result = reconcile(&source, target, &Month::ALL);
        assert_eq!(result.matched, 1);
        assert!(result.patches.is_empty());
    }
}
