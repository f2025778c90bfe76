use std::collections::{BTreeMap, HashMap};

use crate::model::{LineItem, Month, RowId, RowPatch};

/// Field changes between the rows as loaded and their working copies.
///
/// Only `months` and the pct pair are compared. Rows that are unchanged or unknown to
/// `original` produce no patch.
pub fn diff_rows<'a>(
    original: &HashMap<RowId, LineItem>,
    working: impl IntoIterator<Item = &'a LineItem>,
    months: &[Month],
) -> Vec<RowPatch> {
    working
        .into_iter()
        .filter_map(|row| {
            let before = original.get(&row.id)?;

            let changed: BTreeMap<_, _> = months
                .iter()
                .map(|&month| (month, row.months.get(month)))
                .filter(|&(month, value)| value != before.months.get(month))
                .collect();
            let pct = (row.pct != before.pct).then(|| row.pct.clone());

            if changed.is_empty() && pct.is_none() {
                return None;
            }
            Some(RowPatch {
                row_id: row.id,
                months: changed,
                pct,
            })
        })
        .collect()
}
