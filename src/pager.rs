// Year pagination for the monthly chart

use crate::record::Record;
use std::collections::BTreeSet;

/// Label shown when the load produced no records
pub const NO_DATA_LABEL: &str = "Sin datos";

/// Which year's months are on display. Independent of cross-filter state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearPager {
    years: Vec<i32>,
    current: usize,
}

impl YearPager {
    /// Distinct years of the whole load, ascending, positioned on the first
    pub fn init(records: &[Record]) -> Self {
        let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
        Self {
            years: years.into_iter().collect(),
            current: 0,
        }
    }

    pub fn available_years(&self) -> &[i32] {
        &self.years
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        if self.years.is_empty() { None } else { Some(self.current) }
    }

    /// None means there is no data to page through
    pub fn current_year(&self) -> Option<i32> {
        self.years.get(self.current).copied()
    }

    pub fn has_prev(&self) -> bool {
        !self.years.is_empty() && self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.years.len()
    }

    /// Step forward one year. Returns false at the last year.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Step back one year. Returns false at the first year.
    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Jump to a specific year if it is present
    pub fn select(&mut self, year: i32) -> bool {
        match self.years.binary_search(&year) {
            Ok(idx) if idx != self.current => {
                self.current = idx;
                true
            }
            _ => false,
        }
    }

    pub fn label(&self) -> String {
        match self.current_year() {
            Some(year) => year.to_string(),
            None => NO_DATA_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawRow, normalize};

    fn records_for(dates: &[&str]) -> Vec<Record> {
        let rows: Vec<RawRow> = dates.iter().map(|d| RawRow::new(d, Some("autor"), None)).collect();
        normalize(&rows)
    }

    #[test]
    fn test_init_sorts_and_dedups_years() {
        let pager = YearPager::init(&records_for(&[
            "2023-05-01 10:00:00",
            "2021-01-01 10:00:00",
            "2023-01-01 10:00:00",
            "2022-07-01 10:00:00",
        ]));

        assert_eq!(pager.available_years(), &[2021, 2022, 2023]);
        assert_eq!(pager.current_index(), Some(0));
        assert_eq!(pager.current_year(), Some(2021));
    }

    #[test]
    fn test_navigation_stops_at_boundaries() {
        let mut pager = YearPager::init(&records_for(&["2022-03-01 10:00:00", "2023-03-01 10:00:00"]));

        assert!(!pager.has_prev());
        assert!(!pager.prev());
        assert_eq!(pager.current_year(), Some(2022));

        assert!(pager.next());
        assert_eq!(pager.current_year(), Some(2023));

        assert!(!pager.has_next());
        assert!(!pager.next());
        assert_eq!(pager.current_year(), Some(2023));

        assert!(pager.prev());
        assert_eq!(pager.current_year(), Some(2022));
    }

    #[test]
    fn test_empty_pager() {
        let mut pager = YearPager::init(&[]);
        assert!(pager.is_empty());
        assert_eq!(pager.current_index(), None);
        assert_eq!(pager.current_year(), None);
        assert!(!pager.has_prev());
        assert!(!pager.has_next());
        assert!(!pager.next());
        assert!(!pager.prev());
        assert_eq!(pager.label(), NO_DATA_LABEL);
    }

    #[test]
    fn test_select_year() {
        let mut pager = YearPager::init(&records_for(&[
            "2021-01-01 10:00:00",
            "2022-01-01 10:00:00",
            "2023-01-01 10:00:00",
        ]));

        assert!(pager.select(2023));
        assert_eq!(pager.current_index(), Some(2));
        assert!(!pager.select(2023));
        assert!(!pager.select(1999));
        assert_eq!(pager.label(), "2023");
    }
}
