// In-memory cross-filter over normalized records

use crate::filter::{DimensionKey, Filter};
use crate::record::Record;
use eyre::{Result, eyre};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Derived key used for filtering and grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Month,
    Hour,
    DayOfWeek,
    SearchType,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Month,
        Dimension::Hour,
        Dimension::DayOfWeek,
        Dimension::SearchType,
    ];

    pub fn key(self, record: &Record) -> DimensionKey {
        match self {
            Dimension::Month => DimensionKey::Month(record.month()),
            Dimension::Hour => DimensionKey::Hour(record.hour),
            Dimension::DayOfWeek => DimensionKey::Day(record.day_of_week),
            Dimension::SearchType => DimensionKey::SearchType(record.search_type.clone()),
        }
    }

    /// Whether `key` is the kind of key this dimension produces
    pub fn owns(self, key: &DimensionKey) -> bool {
        matches!(
            (self, key),
            (Dimension::Month, DimensionKey::Month(_))
                | (Dimension::Hour, DimensionKey::Hour(_))
                | (Dimension::DayOfWeek, DimensionKey::Day(_))
                | (Dimension::SearchType, DimensionKey::SearchType(_))
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Month => "month",
            Dimension::Hour => "hour",
            Dimension::DayOfWeek => "dow",
            Dimension::SearchType => "type",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dimension {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "month" => Ok(Dimension::Month),
            "hour" => Ok(Dimension::Hour),
            "dow" | "day" => Ok(Dimension::DayOfWeek),
            "type" | "search_type" => Ok(Dimension::SearchType),
            other => Err(eyre!("Unknown dimension: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub key: DimensionKey,
    pub count: usize,
}

/// Key -> count for one dimension, ordered by key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub dimension: Dimension,
    pub entries: Vec<GroupEntry>,
}

impl Group {
    pub fn get(&self, key: &DimensionKey) -> usize {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cross-filter index over one load of records.
///
/// Records are stored once. Each dimension keeps its precomputed keys, its
/// active filter and a pass bitmap. A group folds over the records that pass
/// every other dimension's bitmap, so a dimension is never narrowed by its own
/// selection.
#[derive(Debug, Clone)]
pub struct CrossFilter {
    records: Vec<Record>,
    keys: [Vec<DimensionKey>; 4],
    filters: [Filter; 4],
    passes: [Vec<bool>; 4],
}

impl CrossFilter {
    pub fn build(records: Vec<Record>) -> Self {
        let keys = Dimension::ALL.map(|dim| records.iter().map(|r| dim.key(r)).collect::<Vec<_>>());
        let passes = Dimension::ALL.map(|_| vec![true; records.len()]);

        debug!(records = records.len(), "Built cross-filter index");

        Self {
            records,
            keys,
            filters: Default::default(),
            passes,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record of the load, ignoring filters
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self, dim: Dimension) -> &Filter {
        &self.filters[dim.slot()]
    }

    /// Replace a dimension's filter
    pub fn set_filter(&mut self, dim: Dimension, filter: Filter) -> Result<()> {
        if let Some(bad) = filter.keys().into_iter().find(|k| !dim.owns(k)) {
            return Err(eyre!("Key {:?} does not belong to dimension {}", bad, dim));
        }

        let slot = dim.slot();
        for (pass, key) in self.passes[slot].iter_mut().zip(&self.keys[slot]) {
            *pass = filter.accepts(key);
        }

        debug!(dimension = %dim, filter = %filter, "Dimension filter changed");
        self.filters[slot] = filter;
        Ok(())
    }

    /// Clear one dimension's filter
    pub fn filter_all(&mut self, dim: Dimension) {
        let slot = dim.slot();
        self.passes[slot].iter_mut().for_each(|p| *p = true);
        self.filters[slot] = Filter::All;
    }

    /// Restrict a dimension to keys in `[lo, hi)`
    pub fn filter_range(&mut self, dim: Dimension, lo: DimensionKey, hi: DimensionKey) -> Result<()> {
        self.set_filter(dim, Filter::Range { lo, hi })
    }

    pub fn filter_exact(&mut self, dim: Dimension, key: DimensionKey) -> Result<()> {
        self.set_filter(dim, Filter::Exact(key))
    }

    pub fn filter_in(&mut self, dim: Dimension, keys: Vec<DimensionKey>) -> Result<()> {
        self.set_filter(dim, Filter::In(keys))
    }

    pub fn clear_all(&mut self) {
        for dim in Dimension::ALL {
            self.filter_all(dim);
        }
    }

    fn passes_except(&self, i: usize, skip: Option<Dimension>) -> bool {
        Dimension::ALL
            .iter()
            .filter(|d| Some(**d) != skip)
            .all(|d| self.passes[d.slot()][i])
    }

    /// Live group for a dimension under every other dimension's filter
    pub fn current_group(&self, dim: Dimension) -> Group {
        let slot = dim.slot();
        let mut counts: BTreeMap<&DimensionKey, usize> = BTreeMap::new();

        for (i, key) in self.keys[slot].iter().enumerate() {
            let count = counts.entry(key).or_insert(0);
            if self.passes_except(i, Some(dim)) {
                *count += 1;
            }
        }

        Group {
            dimension: dim,
            entries: counts
                .into_iter()
                .map(|(key, count)| GroupEntry { key: key.clone(), count })
                .collect(),
        }
    }

    /// Records passing every active filter
    pub fn all_filtered(&self) -> Vec<&Record> {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| self.passes_except(*i, None))
            .map(|(_, r)| r)
            .collect()
    }

    pub fn filtered_len(&self) -> usize {
        (0..self.records.len()).filter(|i| self.passes_except(*i, None)).count()
    }
}
