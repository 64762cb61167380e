// JSONL row files used to seed the search log

use crate::record::RawRow;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Read one raw row per line, skipping blank and malformed lines
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open JSONL file {:?}", path))?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                skipped += 1;
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<RawRow>(&line) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
                skipped += 1;
            }
        }
    }

    info!(file = ?path, count = rows.len(), skipped, "Loaded rows from JSONL");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("busquedas.jsonl");

        fs::write(
            &path,
            r#"{"fecha":"2023-01-02 10:00:00","tipo_busqueda":"autor","criterio_texto":"mistral"}

{"fecha":"2023-01-03 11:00:00","tipo_busqueda":null}
"#,
        )
        .unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tipo_busqueda.as_deref(), Some("autor"));
        assert_eq!(rows[1].criterio_texto, None);
    }

    #[test]
    fn test_read_rows_skips_malformed_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("busquedas.jsonl");

        fs::write(
            &path,
            r#"{"fecha":"2023-01-02 10:00:00","tipo_busqueda":"autor"}
{malformed json}
{"fecha":"2023-01-04 12:00:00","tipo_busqueda":"titulo"}
"#,
        )
        .unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].tipo_busqueda.as_deref(), Some("titulo"));
    }

    #[test]
    fn test_read_rows_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(read_rows(&temp.path().join("nope.jsonl")).is_err());
    }
}
