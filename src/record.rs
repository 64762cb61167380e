// Search-log rows and their normalized form

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Category substituted when a row carries no `tipo_busqueda`
pub const MISSING_SEARCH_TYPE: &str = "sin informacion";

/// A row as returned by the data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub tipo_busqueda: Option<String>,
    #[serde(default)]
    pub criterio_texto: Option<String>,
}

impl RawRow {
    pub fn new(fecha: &str, tipo_busqueda: Option<&str>, criterio_texto: Option<&str>) -> Self {
        Self {
            fecha: Some(fecha.to_string()),
            tipo_busqueda: tipo_busqueda.map(str::to_string),
            criterio_texto: criterio_texto.map(str::to_string),
        }
    }
}

/// Day of the week, declared in display order (Monday first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Names indexed by the raw weekday number (Sunday = 0)
const DAY_NAMES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

impl DayOfWeek {
    /// Fixed week order used by every chart and group
    pub const WEEK: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Map a Sunday=0 weekday number to a day
    pub fn from_sunday_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(DayOfWeek::Sunday),
            1..=6 => Some(Self::WEEK[index as usize - 1]),
            _ => None,
        }
    }

    /// Sunday=0 weekday number
    pub fn sunday_index(self) -> u32 {
        (self.position() as u32 + 1) % 7
    }

    /// Position in the fixed week order (Monday = 0)
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        DAY_NAMES[self.sunday_index() as usize]
    }

    /// Reverse lookup by display name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        let idx = DAY_NAMES.iter().position(|n| n.to_lowercase() == name)?;
        Self::from_sunday_index(idx as u32)
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A normalized search-log entry. Only rows with a parseable `fecha` become records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDateTime,
    pub year: i32,
    pub hour: u32,
    pub day_of_week: DayOfWeek,
    pub search_type: String,
    pub free_text: String,
}

impl Record {
    /// First day of the record's month
    pub fn month(&self) -> NaiveDate {
        first_of_month(self.date.date())
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Parse a source timestamp into local wall-clock time.
///
/// Timestamps carrying an offset are converted to the local time zone.
/// Naive timestamps are taken as already local. A bare date means local midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Local).naive_local());
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Build a record from one raw row, or None if its date does not parse
pub fn normalize_row(row: &RawRow) -> Option<Record> {
    let date = parse_timestamp(row.fecha.as_deref()?)?;
    let day_of_week = DayOfWeek::from_sunday_index(date.weekday().num_days_from_sunday())?;

    let search_type = match row.tipo_busqueda.as_deref() {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => MISSING_SEARCH_TYPE.to_string(),
    };

    Some(Record {
        date,
        year: date.year(),
        hour: date.hour(),
        day_of_week,
        search_type,
        free_text: row.criterio_texto.clone().unwrap_or_default(),
    })
}

/// Normalize raw rows, silently dropping those with unparseable dates
pub fn normalize(rows: &[RawRow]) -> Vec<Record> {
    let records: Vec<Record> = rows.iter().filter_map(normalize_row).collect();

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!(dropped, kept = records.len(), "Dropped rows with unparseable fecha");
    }

    records
}
