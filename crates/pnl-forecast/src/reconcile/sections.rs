use std::collections::HashMap;
use std::ops::Range;

use crate::model::{RowType, StatementRow};

/// Lowercase and trim a row name, canonicalizing `total - `/`total-` to `total `.
pub fn normalize(name: &str) -> String {
    let name = name.trim().to_lowercase();
    if let Some(rest) = name.strip_prefix("total")
        && let Some(rest) = rest.trim_start().strip_prefix('-')
    {
        let rest = rest.trim_start();
        return if rest.is_empty() {
            "total".to_owned()
        } else {
            format!("total {rest}")
        };
    }
    name
}

/// The section a total row closes: its normalized name without the `total ` prefix.
pub fn section_key(total_name: &str) -> String {
    let name = normalize(total_name);
    match name.strip_prefix("total ") {
        Some(section) => section.trim_start().to_owned(),
        None => name,
    }
}

/// Section structure of one statement, computed in a single pass over its rows.
#[derive(Debug, Default)]
pub struct SectionIndex {
    header_of_total: HashMap<usize, usize>,
    enclosing_section: Vec<Option<String>>,
    first_total_by_section: HashMap<String, usize>,
}

impl SectionIndex {
    /// `rows` must be sorted by row order.
    pub fn build<R: StatementRow>(rows: &[R]) -> Self {
        let mut index = SectionIndex {
            enclosing_section: Vec::with_capacity(rows.len()),
            ..SectionIndex::default()
        };
        let mut last_header: HashMap<String, usize> = HashMap::new();
        let mut current_section: Option<String> = None;

        for (i, row) in rows.iter().enumerate() {
            match row.row_type() {
                RowType::SectionHeader => {
                    let name = normalize(row.account_name());
                    last_header.insert(name.clone(), i);
                    current_section = Some(name);
                }
                RowType::AccountHeader => {
                    last_header.insert(normalize(row.account_name()), i);
                }
                RowType::Total => {
                    let key = section_key(row.account_name());
                    if let Some(&header) = last_header.get(&key) {
                        index.header_of_total.insert(i, header);
                    }
                    index.first_total_by_section.entry(key).or_insert(i);
                }
                RowType::Detail | RowType::Calculated => {}
            }
            index.enclosing_section.push(current_section.clone());
        }

        index
    }

    /// The nearest preceding header whose name matches the total row at `total`.
    pub fn header_of_total(&self, total: usize) -> Option<usize> {
        self.header_of_total.get(&total).copied()
    }

    /// Normalized name of the nearest `section_header` at or before `row`.
    pub fn enclosing_section(&self, row: usize) -> Option<&str> {
        self.enclosing_section.get(row)?.as_deref()
    }

    /// The first total row closing the (normalized) section `section`.
    pub fn total_of_section(&self, section: &str) -> Option<usize> {
        self.first_total_by_section.get(section).copied()
    }
}

/// The rows inside the section headed `section`.
///
/// The span starts after the first matching `section_header` and ends at the
/// section's total row or at the next `section_header`, whichever comes first.
pub fn section_span<R: StatementRow>(rows: &[R], section: &str) -> Option<Range<usize>> {
    let section = normalize(section);
    let start = rows.iter().position(|row| {
        row.row_type() == RowType::SectionHeader && normalize(row.account_name()) == section
    })? + 1;

    let end = rows[start..]
        .iter()
        .position(|row| match row.row_type() {
            RowType::SectionHeader => true,
            RowType::Total => section_key(row.account_name()) == section,
            _ => false,
        })
        .map_or(rows.len(), |offset| start + offset);

    Some(start..end)
}
