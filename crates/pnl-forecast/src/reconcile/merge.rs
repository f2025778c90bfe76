use std::collections::{HashMap, HashSet};

use super::sections::SectionIndex;
use crate::model::{
    LineItem, Month, MonthValues, NewLineItem, RowId, RowType, SideCar, StatementRow,
};

/// A row of the merged statement: already persisted, or about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedRow {
    Existing(LineItem),
    Inserted(NewLineItem),
}

impl MergedRow {
    pub fn row_order(&self) -> u32 {
        match self {
            MergedRow::Existing(row) => row.row_order,
            MergedRow::Inserted(row) => row.row_order,
        }
    }

    fn set_row_order(&mut self, order: u32) {
        match self {
            MergedRow::Existing(row) => row.row_order = order,
            MergedRow::Inserted(row) => row.row_order = order,
        }
    }
}

impl StatementRow for MergedRow {
    fn row_type(&self) -> RowType {
        match self {
            MergedRow::Existing(row) => row.row_type,
            MergedRow::Inserted(row) => row.row_type,
        }
    }

    fn account_name(&self) -> &str {
        match self {
            MergedRow::Existing(row) => &row.account_name,
            MergedRow::Inserted(row) => &row.account_name,
        }
    }

    fn months(&self) -> &MonthValues {
        match self {
            MergedRow::Existing(row) => &row.months,
            MergedRow::Inserted(row) => &row.months,
        }
    }

    fn months_mut(&mut self) -> &mut MonthValues {
        match self {
            MergedRow::Existing(row) => &mut row.months,
            MergedRow::Inserted(row) => &mut row.months,
        }
    }
}

/// The target statement after merging in unmatched source rows, renumbered `1..=N`.
#[derive(Debug, Default)]
pub struct MergePlan {
    pub rows: Vec<MergedRow>,
    /// `(row id, new row order)` of persisted rows whose position changed.
    pub reorders: Vec<(RowId, u32)>,
}

impl MergePlan {
    pub fn existing(&self) -> impl Iterator<Item = &LineItem> {
        self.rows.iter().filter_map(|row| match row {
            MergedRow::Existing(row) => Some(row),
            MergedRow::Inserted(_) => None,
        })
    }

    pub fn inserted_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row, MergedRow::Inserted(_)))
            .count()
    }

    pub fn into_inserted(self) -> Vec<NewLineItem> {
        self.rows
            .into_iter()
            .filter_map(|row| match row {
                MergedRow::Inserted(row) => Some(row),
                MergedRow::Existing(_) => None,
            })
            .collect()
    }
}

/// Insert the source's unconsumed detail rows into `target`.
///
/// Each row goes right before the target total closing the section the row sits in
/// within the source. Rows whose section has no total in the target are appended.
/// Inserted rows carry the source values of `carried_months` and zero elsewhere.
pub fn plan_merge(
    source: &[LineItem],
    consumed: &HashSet<RowId>,
    target: Vec<LineItem>,
    carried_months: &[Month],
) -> MergePlan {
    let source_index = SectionIndex::build(source);
    let target_index = SectionIndex::build(&target);

    let mut before_anchor: HashMap<usize, Vec<NewLineItem>> = HashMap::new();
    let mut at_end = Vec::new();

    for (i, row) in source.iter().enumerate() {
        if row.row_type != RowType::Detail || consumed.contains(&row.id) {
            continue;
        }
        let section = source_index.enclosing_section(i);
        let inserted = new_row(row, carried_months);

        match section.and_then(|section| target_index.total_of_section(section)) {
            Some(anchor) => before_anchor.entry(anchor).or_default().push(inserted),
            None => {
                tracing::debug!(
                    account = %row.account_name,
                    section = section.unwrap_or("<none>"),
                    "no section total in target, appending row at the end"
                );
                at_end.push(inserted);
            }
        }
    }

    let inserted: usize = before_anchor.values().map(Vec::len).sum::<usize>() + at_end.len();
    let mut rows = Vec::with_capacity(target.len() + inserted);
    for (i, row) in target.into_iter().enumerate() {
        if let Some(group) = before_anchor.remove(&i) {
            rows.extend(group.into_iter().map(MergedRow::Inserted));
        }
        rows.push(MergedRow::Existing(row));
    }
    rows.extend(at_end.into_iter().map(MergedRow::Inserted));

    let mut reorders = Vec::new();
    for (i, row) in rows.iter_mut().enumerate() {
        let order = i as u32 + 1;
        if let MergedRow::Existing(existing) = row
            && existing.row_order != order
        {
            reorders.push((existing.id, order));
        }
        row.set_row_order(order);
    }

    MergePlan { rows, reorders }
}

fn new_row(source: &LineItem, carried_months: &[Month]) -> NewLineItem {
    NewLineItem {
        row_order: 0,
        account_code: source.account_code.clone(),
        account_name: source.account_name.clone(),
        full_label: source.full_label.clone(),
        row_type: RowType::Detail,
        indent_level: source.indent_level,
        months: source.months.retain(carried_months),
        pct: source.pct.clone(),
        extra: SideCar::new(),
    }
}
