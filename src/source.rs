// Data source boundary

use crate::range::DateRange;
use crate::record::{RawRow, parse_timestamp};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// Supplies raw search-log rows for a date range
pub trait DataSource {
    /// Rows whose date falls in `range` (inclusive). No ordering is guaranteed.
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawRow>>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawRow>> {
        (**self).fetch(range)
    }
}

/// Wire shape of a row listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<RawRow>,
}

/// Rows held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<RawRow>,
}

impl MemorySource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

/// Whether the row's parsed date falls in `range`. Rows without a readable date never do.
pub fn row_in_range(row: &RawRow, range: &DateRange) -> bool {
    row.fecha
        .as_deref()
        .and_then(parse_timestamp)
        .is_some_and(|dt| range.contains(dt.date()))
}

impl DataSource for MemorySource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawRow>> {
        if range.is_unbounded() {
            return Ok(self.rows.clone());
        }

        Ok(self.rows.iter().filter(|row| row_in_range(row, range)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows() -> Vec<RawRow> {
        vec![
            RawRow::new("2023-01-01 08:00:00", Some("autor"), None),
            RawRow::new("2023-01-15 08:00:00", Some("autor"), None),
            RawRow::new("2023-02-01 08:00:00", Some("titulo"), None),
            RawRow::new("sin fecha", Some("titulo"), None),
        ]
    }

    #[test]
    fn test_memory_source_unbounded_returns_all() {
        let source = MemorySource::new(rows());
        assert_eq!(source.fetch(&DateRange::unbounded()).unwrap().len(), 4);
    }

    #[test]
    fn test_memory_source_applies_range() {
        let source = MemorySource::new(rows());
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1),
            NaiveDate::from_ymd_opt(2023, 1, 31),
        );

        let fetched = source.fetch(&range).unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().all(|r| r.tipo_busqueda.as_deref() == Some("autor")));
    }

    #[test]
    fn test_data_response_json_shape() {
        let json = r#"{"data":[{"fecha":"2023-01-01T08:00:00","tipo_busqueda":null,"criterio_texto":"mapas"}]}"#;
        let response: DataResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].criterio_texto.as_deref(), Some("mapas"));
        assert_eq!(response.data[0].tipo_busqueda, None);
    }
}
