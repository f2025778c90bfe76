//! Rows, versions and import records of a P&L statement.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::Decimal;

pub type RowId = i64;
pub type VersionId = i64;

/// Calendar month, in canonical January-first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The months following the first `actual_months` months of the year.
    ///
    /// Returns `None` when `actual_months` is larger than twelve.
    pub fn forecast(actual_months: usize) -> Option<&'static [Month]> {
        Month::ALL.get(actual_months..)
    }

    pub fn key(self) -> &'static str {
        match self {
            Month::Jan => "jan",
            Month::Feb => "feb",
            Month::Mar => "mar",
            Month::Apr => "apr",
            Month::May => "may",
            Month::Jun => "jun",
            Month::Jul => "jul",
            Month::Aug => "aug",
            Month::Sep => "sep",
            Month::Oct => "oct",
            Month::Nov => "nov",
            Month::Dec => "dec",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Twelve monthly values. Every write is rounded to two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MonthFields", into = "MonthFields")]
pub struct MonthValues([Decimal; 12]);

impl MonthValues {
    pub fn get(&self, month: Month) -> Decimal {
        self.0[month.index()]
    }

    pub fn set(&mut self, month: Month, value: Decimal) {
        self.0[month.index()] = round_cents(value);
    }

    pub fn with(mut self, month: Month, value: Decimal) -> Self {
        self.set(month, value);
        self
    }

    /// Keep only the given months, zeroing every other one.
    pub fn retain(&self, months: &[Month]) -> Self {
        let mut kept = MonthValues::default();
        for &month in months {
            kept.set(month, self.get(month));
        }
        kept
    }

    pub fn add(&mut self, other: &MonthValues) {
        for month in Month::ALL {
            self.set(month, self.get(month) + other.get(month));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, Decimal)> + '_ {
        Month::ALL.into_iter().map(|month| (month, self.get(month)))
    }
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct MonthFields {
    jan: Decimal,
    feb: Decimal,
    mar: Decimal,
    apr: Decimal,
    may: Decimal,
    jun: Decimal,
    jul: Decimal,
    aug: Decimal,
    sep: Decimal,
    oct: Decimal,
    nov: Decimal,
    dec: Decimal,
}

impl From<MonthFields> for MonthValues {
    fn from(f: MonthFields) -> Self {
        let raw = [
            f.jan, f.feb, f.mar, f.apr, f.may, f.jun, f.jul, f.aug, f.sep, f.oct, f.nov, f.dec,
        ];
        MonthValues(raw.map(round_cents))
    }
}

impl From<MonthValues> for MonthFields {
    fn from(MonthValues(v): MonthValues) -> Self {
        MonthFields {
            jan: v[0],
            feb: v[1],
            mar: v[2],
            apr: v[3],
            may: v[4],
            jun: v[5],
            jul: v[6],
            aug: v[7],
            sep: v[8],
            oct: v[9],
            nov: v[10],
            dec: v[11],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowType {
    Detail,
    Total,
    SectionHeader,
    AccountHeader,
    Calculated,
}

impl RowType {
    pub fn is_header(self) -> bool {
        matches!(self, RowType::SectionHeader | RowType::AccountHeader)
    }
}

/// `(branch, department, year)`: the statements of one department and year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementScope {
    pub branch_id: String,
    pub department: String,
    pub year: i32,
}

impl StatementScope {
    pub fn new(branch_id: impl Into<String>, department: impl Into<String>, year: i32) -> Self {
        StatementScope {
            branch_id: branch_id.into(),
            department: department.into(),
            year,
        }
    }

    pub fn draft(&self) -> StatementRef {
        StatementRef {
            scope: self.clone(),
            version_id: None,
        }
    }

    pub fn version(&self, version_id: VersionId) -> StatementRef {
        StatementRef {
            scope: self.clone(),
            version_id: Some(version_id),
        }
    }
}

impl fmt::Display for StatementScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.branch_id, self.department, self.year)
    }
}

/// One statement: the draft (`version_id = None`) or a saved version of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRef {
    #[serde(flatten)]
    pub scope: StatementScope,
    #[serde(default)]
    pub version_id: Option<VersionId>,
}

impl fmt::Display for StatementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version_id {
            Some(id) => write!(f, "{}@v{id}", self.scope),
            None => write!(f, "{}@draft", self.scope),
        }
    }
}

/// Alternate valuation of a detail row as a percentage of another row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PctBasis {
    #[serde(default)]
    pub pct_of_total: Option<Decimal>,
    #[serde(default)]
    pub pct_source: Option<String>,
}

/// Business fields the reconciler never interprets (cell notes, admin flag, ...).
pub type SideCar = serde_json::Map<String, serde_json::Value>;

/// A persisted statement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: RowId,
    #[serde(flatten)]
    pub statement: StatementRef,
    pub row_order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_label: Option<String>,
    pub row_type: RowType,
    #[serde(default)]
    pub indent_level: u8,
    #[serde(flatten)]
    pub months: MonthValues,
    #[serde(flatten)]
    pub pct: PctBasis,
    #[serde(default, skip_serializing_if = "SideCar::is_empty")]
    pub extra: SideCar,
}

impl LineItem {
    /// The row's fields without its identity, for copying into another statement.
    pub fn to_new(&self) -> NewLineItem {
        NewLineItem {
            row_order: self.row_order,
            account_code: self.account_code.clone(),
            account_name: self.account_name.clone(),
            full_label: self.full_label.clone(),
            row_type: self.row_type,
            indent_level: self.indent_level,
            months: self.months,
            pct: self.pct.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// A row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub row_order: u32,
    #[serde(default)]
    pub account_code: Option<String>,
    pub account_name: String,
    #[serde(default)]
    pub full_label: Option<String>,
    pub row_type: RowType,
    #[serde(default)]
    pub indent_level: u8,
    #[serde(flatten)]
    pub months: MonthValues,
    #[serde(flatten)]
    pub pct: PctBasis,
    #[serde(default)]
    pub extra: SideCar,
}

impl NewLineItem {
    pub fn into_line_item(self, id: RowId, statement: StatementRef) -> LineItem {
        LineItem {
            id,
            statement,
            row_order: self.row_order,
            account_code: self.account_code,
            account_name: self.account_name,
            full_label: self.full_label,
            row_type: self.row_type,
            indent_level: self.indent_level,
            months: self.months,
            pct: self.pct,
            extra: self.extra,
        }
    }
}

/// What the reconciler needs to see of a row, persisted or not.
pub trait StatementRow {
    fn row_type(&self) -> RowType;
    fn account_name(&self) -> &str;
    fn months(&self) -> &MonthValues;
    fn months_mut(&mut self) -> &mut MonthValues;
}

impl StatementRow for LineItem {
    fn row_type(&self) -> RowType {
        self.row_type
    }
    fn account_name(&self) -> &str {
        &self.account_name
    }
    fn months(&self) -> &MonthValues {
        &self.months
    }
    fn months_mut(&mut self) -> &mut MonthValues {
        &mut self.months
    }
}

impl StatementRow for NewLineItem {
    fn row_type(&self) -> RowType {
        self.row_type
    }
    fn account_name(&self) -> &str {
        &self.account_name
    }
    fn months(&self) -> &MonthValues {
        &self.months
    }
    fn months_mut(&mut self) -> &mut MonthValues {
        &mut self.months
    }
}

/// Field changes for one persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPatch {
    pub row_id: RowId,
    pub months: BTreeMap<Month, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct: Option<PctBasis>,
}

impl RowPatch {
    pub fn apply_to(&self, row: &mut LineItem) {
        for (&month, &value) in &self.months {
            row.months.set(month, value);
        }
        if let Some(pct) = &self.pct {
            row.pct = pct.clone();
        }
    }
}

/// Metadata of a saved statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: VersionId,
    #[serde(flatten)]
    pub scope: StatementScope,
    pub version_name: String,
    pub actual_months: u8,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Version {
    pub fn statement(&self) -> StatementRef {
        self.scope.version(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    #[serde(flatten)]
    pub scope: StatementScope,
    pub version_name: String,
    pub actual_months: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The most recent external import into a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    #[serde(flatten)]
    pub scope: StatementScope,
    pub file_name: String,
    pub months_included: Vec<Month>,
    pub imported_at: DateTime<Utc>,
}
