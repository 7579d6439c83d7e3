use crate::errors::{AppError, AppResult};
use crate::models::{CellValue, Table};
use crate::redaction::redact;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Executes one SQL string against the warehouse. Implementations hold no
/// connection between calls and never return partial rows.
pub trait DataSource {
    fn fetch(&self, sql: &str) -> AppResult<Table>;

    fn describe(&self) -> String {
        "warehouse".to_string()
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn fetch(&self, sql: &str) -> AppResult<Table> {
        (**self).fetch(sql)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Read-only SQLite warehouse. Every query opens its own connection, which is
/// closed when it goes out of scope on every return path.
#[derive(Debug, Clone)]
pub struct SqliteDataSource {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteDataSource {
    pub fn new(path: &Path) -> Self {
        Self {
            db_path: path.to_path_buf(),
            busy_timeout: Duration::from_millis(5000),
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn connect(&self) -> AppResult<Connection> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            AppError::Connectivity(redact(&format!(
                "cannot open warehouse {}: {}",
                self.db_path.display(),
                err
            )))
        })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|err| AppError::Connectivity(redact(&err.to_string())))?;
        Ok(conn)
    }
}

impl DataSource for SqliteDataSource {
    fn fetch(&self, sql: &str) -> AppResult<Table> {
        let started = Instant::now();
        let conn = self.connect()?;
        let table =
            read_table(&conn, sql).map_err(|err| AppError::Query(redact(&err.to_string())))?;
        tracing::debug!(
            rows = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "warehouse query completed"
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }
}

fn read_table(conn: &Connection, sql: &str) -> Result<Table, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|index| row.get_ref(index).map(cell_from_ref))
                .collect::<Result<Vec<_>, _>>()
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table::new(columns, rows))
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(value) => CellValue::Integer(value),
        ValueRef::Real(value) => CellValue::Real(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
