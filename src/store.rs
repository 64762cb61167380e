// SQLite-backed search log and its aggregate queries

use crate::range::DateRange;
use crate::record::{DayOfWeek, MISSING_SEARCH_TYPE, RawRow, parse_timestamp};
use crate::source::{DataSource, row_in_range};
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, ToSql};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Table holding the classified search log
pub const TABLE: &str = "busquedas_clasificadas_v2";

/// Default row limit for `sample`
pub const DEFAULT_SAMPLE_LIMIT: usize = 200;

/// Form `fecha` is stored in when it parses
const STORED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Monthly bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    /// `YYYY-MM`
    pub mes: String,
    pub anio: i32,
    pub mes_num: u32,
    pub total: i64,
}

/// Monthly buckets plus the rounded average of their totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub data: Vec<MonthlyRow>,
    pub promedio: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub hour: u32,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DowRow {
    /// Sunday = 0
    pub dow: u32,
    pub dia: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRow {
    pub tipo_busqueda: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub id: i64,
    pub fecha: Option<String>,
    pub tipo_busqueda: Option<String>,
    pub criterio_texto: Option<String>,
}

/// Search log stored in SQLite
pub struct SearchLog {
    db: Connection,
}

/// WHERE clause with its positional parameters
struct Conditions {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    fn new() -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Only rows stored in canonical form, which are exactly the rows that normalize
    fn valid_dates(mut self) -> Self {
        self.clauses.push("datetime(fecha) = fecha".to_string());
        self
    }

    fn range(mut self, range: &DateRange) -> Self {
        if let Some(start) = range.start {
            self.params.push(Box::new(start.format("%Y-%m-%d").to_string()));
            self.clauses.push(format!("date(fecha) >= date(?{})", self.params.len()));
        }
        if let Some(end) = range.end {
            self.params.push(Box::new(end.format("%Y-%m-%d").to_string()));
            self.clauses.push(format!("date(fecha) <= date(?{})", self.params.len()));
        }
        self
    }

    fn search_type(mut self, tipo: Option<&str>) -> Self {
        if let Some(tipo) = tipo {
            self.params.push(Box::new(tipo.to_string()));
            self.clauses.push(format!("tipo_busqueda = ?{}", self.params.len()));
        }
        self
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

impl SearchLog {
    /// Open or create a search log database at the given file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db = Connection::open(path).context("Failed to open SQLite database")?;
        let log = Self { db };
        log.create_schema()?;

        info!(path = ?path, "Opened search log");
        Ok(log)
    }

    /// Throwaway database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let log = Self { db };
        log.create_schema()?;
        Ok(log)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {TABLE} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fecha TEXT,
                tipo_busqueda TEXT,
                criterio_texto TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_{TABLE}_fecha ON {TABLE}(fecha);
            CREATE INDEX IF NOT EXISTS idx_{TABLE}_tipo ON {TABLE}(tipo_busqueda);
            "#
        ))?;

        Ok(())
    }

    /// Append rows in one transaction. Returns the number inserted.
    ///
    /// Parseable dates are stored as local `YYYY-MM-DD HH:MM:SS`; anything else is kept verbatim.
    pub fn insert_rows(&mut self, rows: &[RawRow]) -> Result<usize> {
        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {TABLE} (fecha, tipo_busqueda, criterio_texto) VALUES (?1, ?2, ?3)"
            ))?;
            for row in rows {
                let fecha = row.fecha.as_deref().map(stored_fecha);
                stmt.execute(rusqlite::params![fecha, row.tipo_busqueda, row.criterio_texto])?;
            }
        }
        tx.commit()?;

        debug!(count = rows.len(), "Inserted rows");
        Ok(rows.len())
    }

    pub fn count(&self) -> Result<i64> {
        let n = self
            .db
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(n)
    }

    /// Raw rows in range, newest first.
    ///
    /// The range is applied on the parsed date, so rows written by other tools in any
    /// accepted timestamp form are placed the same way the normalizer places them.
    pub fn rows(&self, range: &DateRange) -> Result<Vec<RawRow>> {
        let sql = format!("SELECT fecha, tipo_busqueda, criterio_texto FROM {TABLE} ORDER BY fecha DESC");

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                fecha: row.get(0)?,
                tipo_busqueda: row.get(1)?,
                criterio_texto: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            let row = row?;
            if range.is_unbounded() || row_in_range(&row, range) {
                out.push(row);
            }
        }
        debug!(range = %range, count = out.len(), "Fetched rows");
        Ok(out)
    }

    /// Searches per month, with the rounded monthly average
    pub fn monthly(&self, range: &DateRange, tipo: Option<&str>) -> Result<MonthlySummary> {
        let cond = Conditions::new().valid_dates().range(range).search_type(tipo);
        let sql = format!(
            "SELECT strftime('%Y-%m', fecha) AS mes, COUNT(*) AS total
             FROM {TABLE} {}
             GROUP BY mes
             ORDER BY mes",
            cond.where_sql()
        );

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map(cond.param_refs().as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut data = Vec::new();
        for row in rows {
            let (mes, total) = row?;
            let (anio, mes_num) = split_month(&mes)?;
            data.push(MonthlyRow {
                mes,
                anio,
                mes_num,
                total,
            });
        }

        let promedio = if data.is_empty() {
            0
        } else {
            let sum: i64 = data.iter().map(|r| r.total).sum();
            (sum as f64 / data.len() as f64).round() as i64
        };

        Ok(MonthlySummary { data, promedio })
    }

    /// Searches per hour of day, all 24 hours present
    pub fn hourly(&self, range: &DateRange, tipo: Option<&str>) -> Result<Vec<HourlyRow>> {
        let cond = Conditions::new().valid_dates().range(range).search_type(tipo);
        let sql = format!(
            "SELECT CAST(strftime('%H', fecha) AS INTEGER) AS hour, COUNT(*) AS total
             FROM {TABLE} {}
             GROUP BY hour
             ORDER BY hour",
            cond.where_sql()
        );

        let mut all: Vec<HourlyRow> = (0..24).map(|hour| HourlyRow { hour, total: 0 }).collect();

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map(cond.param_refs().as_slice(), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (hour, total) = row?;
            let slot = all
                .get_mut(hour as usize)
                .ok_or_else(|| eyre!("Hour out of range: {}", hour))?;
            slot.total = total;
        }

        Ok(all)
    }

    /// Searches per weekday, Monday first, all seven days present
    pub fn dow(&self, range: &DateRange, tipo: Option<&str>) -> Result<Vec<DowRow>> {
        let cond = Conditions::new().valid_dates().range(range).search_type(tipo);
        let sql = format!(
            "SELECT CAST(strftime('%w', fecha) AS INTEGER) AS dow, COUNT(*) AS total
             FROM {TABLE} {}
             GROUP BY dow",
            cond.where_sql()
        );

        let mut totals = [0i64; 7];
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map(cond.param_refs().as_slice(), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (dow, total) = row?;
            let slot = totals
                .get_mut(dow as usize)
                .ok_or_else(|| eyre!("Weekday out of range: {}", dow))?;
            *slot = total;
        }

        Ok(DayOfWeek::WEEK
            .iter()
            .map(|day| DowRow {
                dow: day.sunday_index(),
                dia: day.name().to_string(),
                total: totals[day.sunday_index() as usize],
            })
            .collect())
    }

    /// Searches per type, most frequent first. Missing types count under the sentinel.
    pub fn types(&self, range: &DateRange) -> Result<Vec<TypeRow>> {
        let cond = Conditions::new().valid_dates().range(range);
        let sql = format!(
            "SELECT COALESCE(NULLIF(tipo_busqueda, ''), '{MISSING_SEARCH_TYPE}') AS tipo, COUNT(*) AS total
             FROM {TABLE} {}
             GROUP BY tipo
             ORDER BY total DESC, tipo",
            cond.where_sql()
        );

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map(cond.param_refs().as_slice(), |row| {
            Ok(TypeRow {
                tipo_busqueda: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Most recent rows, at most `limit`
    pub fn sample(&self, range: &DateRange, tipo: Option<&str>, limit: usize) -> Result<Vec<SampleRow>> {
        let mut cond = Conditions::new().range(range).search_type(tipo);
        cond.params.push(Box::new(limit as i64));
        let sql = format!(
            "SELECT id, fecha, tipo_busqueda, criterio_texto
             FROM {TABLE} {}
             ORDER BY julianday(fecha) DESC, id DESC
             LIMIT ?{}",
            cond.where_sql(),
            cond.params.len()
        );

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map(cond.param_refs().as_slice(), |row| {
            Ok(SampleRow {
                id: row.get(0)?,
                fecha: row.get(1)?,
                tipo_busqueda: row.get(2)?,
                criterio_texto: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl DataSource for SearchLog {
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawRow>> {
        self.rows(range).context("Failed to fetch search-log rows")
    }
}

fn stored_fecha(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format(STORED_DATE_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

fn split_month(mes: &str) -> Result<(i32, u32)> {
    let (y, m) = mes
        .split_once('-')
        .ok_or_else(|| eyre!("Invalid month bucket: {}", mes))?;
    Ok((y.parse()?, m.parse()?))
}
