use std::fmt::Write as _;

use crate::Decimal;
use crate::model::{
    LineItem, Month, MonthValues, PctBasis, RowId, RowType, SideCar, StatementScope, VersionId,
};

pub fn scope() -> StatementScope {
    StatementScope::new("north", "maintenance", 2025)
}

fn row(row_type: RowType, name: &str, code: Option<&str>) -> LineItem {
    LineItem {
        id: 0,
        statement: scope().draft(),
        row_order: 0,
        account_code: code.map(str::to_owned),
        account_name: name.to_owned(),
        full_label: None,
        row_type,
        indent_level: 0,
        months: MonthValues::default(),
        pct: PctBasis::default(),
        extra: SideCar::new(),
    }
}

pub fn header(name: &str) -> LineItem {
    row(RowType::SectionHeader, name, None)
}

pub fn sub_header(name: &str) -> LineItem {
    row(RowType::AccountHeader, name, None)
}

pub fn detail(name: &str, code: Option<&str>) -> LineItem {
    row(RowType::Detail, name, code)
}

pub fn total(name: &str) -> LineItem {
    row(RowType::Total, name, None)
}

pub trait WithMonth {
    fn with(self, month: Month, value: Decimal) -> Self;
}

impl WithMonth for LineItem {
    fn with(mut self, month: Month, value: Decimal) -> Self {
        self.months.set(month, value);
        self
    }
}

/// Draft rows with ids and row orders assigned from 1.
pub fn statement(rows: Vec<LineItem>) -> Vec<LineItem> {
    statement_at(1, None, rows)
}

/// Rows with ids counting up from `first_id` and row orders from 1.
pub fn statement_at(
    first_id: RowId,
    version: Option<VersionId>,
    rows: Vec<LineItem>,
) -> Vec<LineItem> {
    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.id = first_id + i as RowId;
            row.row_order = i as u32 + 1;
            row.statement.version_id = version;
            row
        })
        .collect()
}

fn row_type_label(row_type: RowType) -> &'static str {
    match row_type {
        RowType::Detail => "detail",
        RowType::Total => "total",
        RowType::SectionHeader => "section",
        RowType::AccountHeader => "account",
        RowType::Calculated => "calculated",
    }
}

/// One line per row: order, type, name and the values of `months`.
pub fn render(rows: &[LineItem], months: &[Month]) -> String {
    let mut out = String::new();
    for row in rows {
        let mut line = format!(
            "{:<3}{:<9}{:<17}",
            row.row_order,
            row_type_label(row.row_type),
            row.account_name
        );
        for &month in months {
            let _ = write!(line, " {month}={:.2}", row.months.get(month));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
