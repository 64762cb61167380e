// Date-range bounds for loads and queries

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static DMY_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));

/// User-facing rejection of the filter inputs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Fecha de inicio inválida. Use formato AAAA-MM-DD.")]
    InvalidStart(String),
    #[error("Fecha de fin inválida. Use formato AAAA-MM-DD.")]
    InvalidEnd(String),
    #[error("La fecha de inicio no puede ser mayor que la fecha de fin.")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

/// Inclusive date bounds. A missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn parse_iso(input: &str) -> Option<NaiveDate> {
    if !ISO_DATE.is_match(input) {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Accept `YYYY-MM-DD`, `DD/MM/YYYY` or a full RFC 3339 timestamp
pub fn normalize_date_param(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if DMY_DATE.is_match(s) {
        return NaiveDate::parse_from_str(s, "%d/%m/%Y").ok();
    }
    if ISO_DATE.is_match(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Validate the two date inputs of the filter form.
    ///
    /// Empty inputs leave that side open. Non-empty inputs must be `YYYY-MM-DD`
    /// calendar dates, and start may not come after end.
    pub fn from_inputs(start: &str, end: &str) -> Result<Self, RangeError> {
        let start = start.trim();
        let end = end.trim();

        let start_date = match start {
            "" => None,
            s => Some(parse_iso(s).ok_or_else(|| RangeError::InvalidStart(s.to_string()))?),
        };
        let end_date = match end {
            "" => None,
            s => Some(parse_iso(s).ok_or_else(|| RangeError::InvalidEnd(s.to_string()))?),
        };

        if let (Some(s), Some(e)) = (start_date, end_date) {
            if s > e {
                return Err(RangeError::StartAfterEnd { start: s, end: e });
            }
        }

        Ok(Self::new(start_date, end_date))
    }

    /// Lenient parsing of query parameters; anything unparseable is unbounded
    pub fn from_query(start: Option<&str>, end: Option<&str>) -> Self {
        Self::new(
            start.and_then(normalize_date_param),
            end.and_then(normalize_date_param),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "..".to_string());
        write!(f, "{} / {}", side(self.start), side(self.end))
    }
}
