use std::collections::{HashMap, HashSet};

use super::sections::normalize;
use crate::model::{LineItem, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    AccountCode,
    AccountName,
    NormalizedName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMatch {
    /// Index into the source rows.
    pub source: usize,
    pub tier: MatchTier,
}

/// Correspondence of target rows to source rows.
#[derive(Debug, Default)]
pub struct MatchResult {
    /// One entry per target row, in target order.
    pub matches: Vec<Option<RowMatch>>,
    /// Source rows matched by at least one target row.
    pub consumed: HashSet<RowId>,
}

impl MatchResult {
    pub fn source_of(&self, target: usize) -> Option<usize> {
        self.matches.get(target).copied().flatten().map(|m| m.source)
    }

    pub fn matched_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }
}

/// Lookup of source rows by identity. Within a key, the first row in source order wins.
struct SourceKeys {
    by_code: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
}

impl SourceKeys {
    fn new(source: &[LineItem]) -> Self {
        let mut keys = SourceKeys {
            by_code: HashMap::new(),
            by_name: HashMap::new(),
            by_normalized: HashMap::new(),
        };
        for (i, row) in source.iter().enumerate() {
            if let Some(code) = account_code(row) {
                keys.by_code.entry(code.to_owned()).or_insert(i);
            }
            keys.by_name
                .entry(row.account_name.to_lowercase())
                .or_insert(i);
            keys.by_normalized
                .entry(normalize(&row.account_name))
                .or_insert(i);
        }
        keys
    }

    fn lookup(&self, target: &LineItem) -> Option<RowMatch> {
        let by_code = account_code(target)
            .and_then(|code| self.by_code.get(code))
            .map(|&source| RowMatch {
                source,
                tier: MatchTier::AccountCode,
            });
        by_code
            .or_else(|| {
                let source = *self.by_name.get(&target.account_name.to_lowercase())?;
                Some(RowMatch {
                    source,
                    tier: MatchTier::AccountName,
                })
            })
            .or_else(|| {
                let source = *self.by_normalized.get(&normalize(&target.account_name))?;
                Some(RowMatch {
                    source,
                    tier: MatchTier::NormalizedName,
                })
            })
    }
}

fn account_code(row: &LineItem) -> Option<&str> {
    row.account_code.as_deref().filter(|code| !code.is_empty())
}

/// Match every target row to a source row by account code, then name, then normalized name.
///
/// Several target rows may match the same source row.
pub fn match_rows(source: &[LineItem], target: &[LineItem]) -> MatchResult {
    let keys = SourceKeys::new(source);

    let matches: Vec<_> = target.iter().map(|row| keys.lookup(row)).collect();
    let consumed = matches
        .iter()
        .flatten()
        .map(|m| source[m.source].id)
        .collect();

    MatchResult { matches, consumed }
}
