use super::sections::SectionIndex;
use crate::Decimal;
use crate::model::{Month, MonthValues, RowType, StatementRow};

/// Sum of the `detail` rows in `rows` for each of `months`. Other months stay zero.
pub fn sum_details<R: StatementRow>(rows: &[R], months: &[Month]) -> MonthValues {
    let mut sums = MonthValues::default();
    for &month in months {
        let sum: Decimal = rows
            .iter()
            .filter(|row| row.row_type() == RowType::Detail)
            .map(|row| row.months().get(month))
            .sum();
        sums.set(month, sum);
    }
    sums
}

/// Recompute the given months of every total row from the detail rows of its section.
///
/// Totals are visited bottom to top. A total whose header cannot be found keeps its
/// current values. Returns the number of totals that were recomputed.
pub fn recalculate_totals<R: StatementRow>(rows: &mut [R], months: &[Month]) -> usize {
    let index = SectionIndex::build(rows);
    let mut recalculated = 0;

    for t in (0..rows.len()).rev() {
        if rows[t].row_type() != RowType::Total {
            continue;
        }
        let Some(header) = index.header_of_total(t) else {
            tracing::debug!(
                total = rows[t].account_name(),
                "no matching header for total row, leaving it unchanged"
            );
            continue;
        };

        let sums = sum_details(&rows[header + 1..t], months);
        let values = rows[t].months_mut();
        for &month in months {
            values.set(month, sums.get(month));
        }
        recalculated += 1;
    }

    recalculated
}
