//! SQLite-backed country storage
//!
//! Names are unique up to case. Uniqueness is enforced on `name_key`, the
//! Unicode-lowercased name, so "Åland Islands" and "åland islands" collide
//! just like "Chad" and "CHAD" do.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use countryfx_common::{CountryRecord, SortOrder, StatusResponse};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task;

use super::types::{CountryFilter, SummaryStats};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT    NOT NULL,
    name_key          TEXT    NOT NULL UNIQUE,
    capital           TEXT,
    region            TEXT,
    population        INTEGER NOT NULL CHECK (population >= 0),
    currency_code     TEXT,
    exchange_rate     REAL,
    estimated_gdp     REAL,
    flag_url          TEXT,
    last_refreshed_at TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_countries_region ON countries (region COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_countries_currency ON countries (currency_code COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_countries_gdp ON countries (estimated_gdp);
"#;

const RECORD_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

/// Lookup key for a country name.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CountryRecord> {
    Ok(CountryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        capital: row.get(2)?,
        region: row.get(3)?,
        population: row.get(4)?,
        currency_code: row.get(5)?,
        exchange_rate: row.get(6)?,
        estimated_gdp: row.get(7)?,
        flag_url: row.get(8)?,
        last_refreshed_at: row.get(9)?,
    })
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Name => "name COLLATE NOCASE ASC, id ASC",
        SortOrder::GdpDesc => "estimated_gdp DESC, name COLLATE NOCASE ASC",
        SortOrder::GdpAsc => "estimated_gdp ASC, name COLLATE NOCASE ASC",
        SortOrder::PopulationDesc => "population DESC, name COLLATE NOCASE ASC",
        SortOrder::PopulationAsc => "population ASC, name COLLATE NOCASE ASC",
    }
}

/// Shared handle; clones point at the same connection.
///
/// Every operation takes the connection lock, so readers never observe a
/// batch that is still being written.
#[derive(Clone)]
pub struct CountryStore {
    conn: Arc<Mutex<Connection>>,
}

impl CountryStore {
    /// Open (or create) the database file and bootstrap the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path).context(format!("Failed to open database: {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("Failed to bootstrap country schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("country store lock poisoned"))
    }

    /// Run `f` inside one transaction. Commits on `Ok`, rolls back on `Err`.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<anyhow::Error>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .context("Failed to begin transaction")?;

        let value = f(&tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        count_rows(&conn)
    }

    pub fn status(&self) -> Result<StatusResponse> {
        let conn = self.lock()?;
        read_status(&conn)
    }

    pub fn list(&self, filter: &CountryFilter) -> Result<Vec<CountryRecord>> {
        let sql = format!(
            "SELECT {} FROM countries \
             WHERE (?1 IS NULL OR region = ?1 COLLATE NOCASE) \
               AND (?2 IS NULL OR currency_code = ?2 COLLATE NOCASE) \
             ORDER BY {}",
            RECORD_COLUMNS,
            order_clause(filter.sort)
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).context("Failed to prepare country listing")?;
        let records = stmt
            .query_map(params![filter.region, filter.currency], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list countries")?;
        Ok(records)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let sql = format!("SELECT {} FROM countries WHERE name_key = ?1", RECORD_COLUMNS);
        let conn = self.lock()?;
        let record = conn
            .query_row(&sql, [name_key(name)], row_to_record)
            .optional()
            .context(format!("Failed to look up country '{}'", name))?;
        Ok(record)
    }

    /// Returns whether a row was removed.
    pub fn delete_by_name(&self, name: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM countries WHERE name_key = ?1", [name_key(name)])
            .context(format!("Failed to delete country '{}'", name))?;
        Ok(removed > 0)
    }

    /// Highest `estimated_gdp` first; nulls excluded, ties by name.
    pub fn top_by_estimated_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>> {
        let conn = self.lock()?;
        read_top_by_estimated_gdp(&conn, limit)
    }

    /// Count and ranking read under one lock, so they always agree.
    pub fn summary(&self, top_n: usize) -> Result<SummaryStats> {
        let conn = self.lock()?;
        let status = read_status(&conn)?;
        let top = read_top_by_estimated_gdp(&conn, top_n)?;
        Ok(SummaryStats {
            total_countries: status.total_countries,
            last_refreshed_at: status.last_refreshed_at,
            top,
        })
    }

    /// Run blocking storage work on tokio's blocking pool.
    pub async fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<anyhow::Error> + Send + 'static,
        F: FnOnce(&CountryStore) -> Result<T, E> + Send + 'static,
    {
        let store = self.clone();
        task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to execute storage task: {}", e))?
    }
}

/// Row count on an open connection or transaction.
pub fn count_rows(conn: &Connection) -> Result<u64> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
        .context("Failed to count countries")?;
    Ok(count as u64)
}

// ── private helpers ──────────────────────────────────────────────────────────

fn read_status(conn: &Connection) -> Result<StatusResponse> {
    let (count, last): (i64, Option<DateTime<Utc>>) = conn
        .query_row(
            "SELECT COUNT(*), MAX(last_refreshed_at) FROM countries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .context("Failed to read store status")?;

    Ok(StatusResponse {
        total_countries: count as u64,
        last_refreshed_at: last,
    })
}

fn read_top_by_estimated_gdp(conn: &Connection, limit: usize) -> Result<Vec<CountryRecord>> {
    let sql = format!(
        "SELECT {} FROM countries WHERE estimated_gdp IS NOT NULL \
         ORDER BY estimated_gdp DESC, name COLLATE NOCASE ASC, id ASC LIMIT ?1",
        RECORD_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map([limit as i64], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to rank countries")?;
    Ok(records)
}
