// Dimension keys and filter predicates

use crate::record::DayOfWeek;
use chrono::NaiveDate;
use serde::Serialize;

/// Key derived from a record by one dimension
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum DimensionKey {
    /// First day of the month
    Month(NaiveDate),
    Hour(u32),
    Day(DayOfWeek),
    SearchType(String),
}

impl std::fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimensionKey::Month(d) => write!(f, "{}", d.format("%Y-%m")),
            DimensionKey::Hour(h) => write!(f, "{}", h),
            DimensionKey::Day(d) => write!(f, "{}", d),
            DimensionKey::SearchType(s) => write!(f, "{}", s),
        }
    }
}

/// Active selection on a dimension
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No selection
    #[default]
    All,
    /// Single key (row/pie click)
    Exact(DimensionKey),
    /// Half-open `lo <= key < hi` (brush)
    Range { lo: DimensionKey, hi: DimensionKey },
    /// Any of several keys (multi-slice selection)
    In(Vec<DimensionKey>),
}

impl Filter {
    pub fn accepts(&self, key: &DimensionKey) -> bool {
        match self {
            Filter::All => true,
            Filter::Exact(k) => k == key,
            Filter::Range { lo, hi } => lo <= key && key < hi,
            Filter::In(keys) => keys.contains(key),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Keys referenced by this filter
    pub fn keys(&self) -> Vec<&DimensionKey> {
        match self {
            Filter::All => Vec::new(),
            Filter::Exact(k) => vec![k],
            Filter::Range { lo, hi } => vec![lo, hi],
            Filter::In(keys) => keys.iter().collect(),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "*"),
            Filter::Exact(k) => write!(f, "= {}", k),
            Filter::Range { lo, hi } => write!(f, "[{}, {})", lo, hi),
            Filter::In(keys) => {
                let joined: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                write!(f, "in {{{}}}", joined.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_all_accepts_everything() {
        assert!(Filter::All.accepts(&DimensionKey::Hour(3)));
        assert!(Filter::All.accepts(&DimensionKey::SearchType("autor".to_string())));
        assert!(Filter::default().is_all());
    }

    #[test]
    fn test_filter_range_is_half_open() {
        let filter = Filter::Range {
            lo: DimensionKey::Hour(8),
            hi: DimensionKey::Hour(12),
        };

        assert!(!filter.accepts(&DimensionKey::Hour(7)));
        assert!(filter.accepts(&DimensionKey::Hour(8)));
        assert!(filter.accepts(&DimensionKey::Hour(11)));
        assert!(!filter.accepts(&DimensionKey::Hour(12)));
    }

    #[test]
    fn test_filter_exact_and_in() {
        let autor = DimensionKey::SearchType("autor".to_string());
        let titulo = DimensionKey::SearchType("titulo".to_string());
        let materia = DimensionKey::SearchType("materia".to_string());

        assert!(Filter::Exact(autor.clone()).accepts(&autor));
        assert!(!Filter::Exact(autor.clone()).accepts(&titulo));

        let set = Filter::In(vec![autor.clone(), titulo.clone()]);
        assert!(set.accepts(&titulo));
        assert!(!set.accepts(&materia));
    }

    #[test]
    fn test_day_keys_order_by_week() {
        let lo = DimensionKey::Day(DayOfWeek::Monday);
        let hi = DimensionKey::Day(DayOfWeek::Saturday);
        let filter = Filter::Range { lo, hi };

        assert!(filter.accepts(&DimensionKey::Day(DayOfWeek::Friday)));
        assert!(!filter.accepts(&DimensionKey::Day(DayOfWeek::Sunday)));
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(Filter::All.to_string(), "*");
        assert_eq!(Filter::Exact(DimensionKey::Hour(5)).to_string(), "= 5");
        let month = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert_eq!(DimensionKey::Month(month).to_string(), "2023-02");
        let range = Filter::Range {
            lo: DimensionKey::Hour(1),
            hi: DimensionKey::Hour(4),
        };
        assert_eq!(range.to_string(), "[1, 4)");
    }
}
