//! SQLite-backed repository
//!
//! One connection guarded by a mutex. Multi-row writes run inside a
//! transaction; dropping an uncommitted transaction rolls it back, which is
//! what keeps a failed cascade from leaving orphans or half-deleted series.
//!
//! `series.name` and `users.username` carry UNIQUE constraints and
//! `measurements.series_id` a foreign key, so the database refuses duplicate
//! names and orphaned measurements even if a caller skips the stores.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::repository::Repository;
use crate::storage::types::{
    Measurement, MeasurementId, MeasurementQuery, MeasurementRecord, NewMeasurement, NewSeries,
    NewUser, Series, SeriesId, SortOrder, User, UserId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS series (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        min_value REAL NOT NULL,
        max_value REAL NOT NULL,
        color TEXT NOT NULL,
        CHECK (min_value < max_value)
    );

    CREATE TABLE IF NOT EXISTS measurements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        value REAL NOT NULL,
        timestamp INTEGER NOT NULL,
        series_id INTEGER NOT NULL REFERENCES series(id)
    );

    CREATE INDEX IF NOT EXISTS idx_measurements_series ON measurements(series_id);
    CREATE INDEX IF NOT EXISTS idx_measurements_timestamp ON measurements(timestamp);

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    );
";

const MEASUREMENT_RECORD_COLUMNS: &str =
    "m.id, m.value, m.timestamp, m.series_id, s.name, s.color";

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Private in-memory database, gone when the repository is dropped
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Interpret a configured path; `:memory:` selects an in-memory database
    pub fn from_config(path: &str) -> Self {
        if path == ":memory:" {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(PathBuf::from(path))
        }
    }
}

/// SQLite implementation of [`Repository`]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    location: DatabaseLocation,
}

impl SqliteRepository {
    /// Open (creating if needed) a database file
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init(conn, DatabaseLocation::File(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, DatabaseLocation::Memory)
    }

    /// Open whatever a config string points at
    pub fn open_location(location: &DatabaseLocation, busy_timeout: Duration) -> StorageResult<Self> {
        match location {
            DatabaseLocation::Memory => Self::open_in_memory(),
            DatabaseLocation::File(path) => Self::open(path, busy_timeout),
        }
    }

    fn init(conn: Connection, location: DatabaseLocation) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(location = ?location, "Opened SQLite repository");

        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(format!("SQLite connection poisoned: {}", e)))
    }
}

fn series_from_row(row: &Row<'_>) -> rusqlite::Result<Series> {
    Ok(Series {
        id: SeriesId(row.get(0)?),
        name: row.get(1)?,
        min_value: row.get(2)?,
        max_value: row.get(3)?,
        color: row.get(4)?,
    })
}

fn measurement_from_row(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: MeasurementId(row.get(0)?),
        value: row.get(1)?,
        timestamp: row.get(2)?,
        series_id: SeriesId(row.get(3)?),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MeasurementRecord> {
    Ok(MeasurementRecord {
        id: MeasurementId(row.get(0)?),
        value: row.get(1)?,
        timestamp: row.get(2)?,
        series_id: SeriesId(row.get(3)?),
        series_name: row.get(4)?,
        series_color: row.get(5)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

/// Build the WHERE/ORDER BY tail and bound values for a measurement listing
fn measurement_query_sql(query: &MeasurementQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if !query.series_ids.is_empty() {
        let placeholders = vec!["?"; query.series_ids.len()].join(", ");
        clauses.push(format!("m.series_id IN ({})", placeholders));
        values.extend(query.series_ids.iter().map(|id| Value::Integer(id.0)));
    }
    if let Some(start) = query.start {
        clauses.push("m.timestamp >= ?".to_string());
        values.push(Value::Integer(start));
    }
    if let Some(end) = query.end {
        clauses.push("m.timestamp <= ?".to_string());
        values.push(Value::Integer(end));
    }

    let mut sql = String::new();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    sql.push_str(match query.order {
        SortOrder::Ascending => " ORDER BY m.timestamp ASC, m.id ASC",
        SortOrder::Descending => " ORDER BY m.timestamp DESC, m.id DESC",
    });

    (sql, values)
}

impl Repository for SqliteRepository {
    fn list_series(&self) -> StorageResult<Vec<Series>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, min_value, max_value, color FROM series ORDER BY id",
        )?;
        let rows = stmt.query_map([], series_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_series(&self, id: SeriesId) -> StorageResult<Option<Series>> {
        let conn = self.conn()?;
        let series = conn
            .query_row(
                "SELECT id, name, min_value, max_value, color FROM series WHERE id = ?",
                params![id.0],
                series_from_row,
            )
            .optional()?;
        Ok(series)
    }

    fn find_series_by_name(&self, name: &str) -> StorageResult<Option<Series>> {
        let conn = self.conn()?;
        let series = conn
            .query_row(
                "SELECT id, name, min_value, max_value, color FROM series WHERE name = ?",
                params![name],
                series_from_row,
            )
            .optional()?;
        Ok(series)
    }

    fn insert_series(&self, series: &NewSeries) -> StorageResult<Series> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO series (name, min_value, max_value, color) VALUES (?, ?, ?, ?)",
            params![series.name, series.min_value, series.max_value, series.color],
        )
        .map_err(StorageError::from_sqlite)?;

        Ok(Series {
            id: SeriesId(conn.last_insert_rowid()),
            name: series.name.clone(),
            min_value: series.min_value,
            max_value: series.max_value,
            color: series.color.clone(),
        })
    }

    fn update_series(&self, series: &Series) -> StorageResult<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE series SET name = ?, min_value = ?, max_value = ?, color = ? WHERE id = ?",
                params![
                    series.name,
                    series.min_value,
                    series.max_value,
                    series.color,
                    series.id.0
                ],
            )
            .map_err(StorageError::from_sqlite)?;
        Ok(changed > 0)
    }

    fn delete_series_cascade(&self, id: SeriesId) -> StorageResult<Option<usize>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM series WHERE id = ?)",
            params![id.0],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(None);
        }

        let removed = tx.execute("DELETE FROM measurements WHERE series_id = ?", params![id.0])?;
        tx.execute("DELETE FROM series WHERE id = ?", params![id.0])?;
        tx.commit()?;

        Ok(Some(removed))
    }

    fn measurement_extent(&self, id: SeriesId) -> StorageResult<Option<(f64, f64)>> {
        let conn = self.conn()?;
        let extent: (Option<f64>, Option<f64>) = conn.query_row(
            "SELECT MIN(value), MAX(value) FROM measurements WHERE series_id = ?",
            params![id.0],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(match extent {
            (Some(low), Some(high)) => Some((low, high)),
            _ => None,
        })
    }

    fn list_measurements(&self, query: &MeasurementQuery) -> StorageResult<Vec<MeasurementRecord>> {
        let (tail, values) = measurement_query_sql(query);
        let sql = format!(
            "SELECT {} FROM measurements m JOIN series s ON s.id = m.series_id{}",
            MEASUREMENT_RECORD_COLUMNS, tail
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_measurement(&self, id: MeasurementId) -> StorageResult<Option<Measurement>> {
        let conn = self.conn()?;
        let measurement = conn
            .query_row(
                "SELECT id, value, timestamp, series_id FROM measurements WHERE id = ?",
                params![id.0],
                measurement_from_row,
            )
            .optional()?;
        Ok(measurement)
    }

    fn insert_measurement(&self, measurement: &NewMeasurement) -> StorageResult<Measurement> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO measurements (value, timestamp, series_id) VALUES (?, ?, ?)",
            params![
                measurement.value,
                measurement.timestamp,
                measurement.series_id.0
            ],
        )
        .map_err(StorageError::from_sqlite)?;

        Ok(Measurement {
            id: MeasurementId(conn.last_insert_rowid()),
            value: measurement.value,
            timestamp: measurement.timestamp,
            series_id: measurement.series_id,
        })
    }

    fn update_measurement(&self, measurement: &Measurement) -> StorageResult<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE measurements SET value = ?, timestamp = ?, series_id = ? WHERE id = ?",
                params![
                    measurement.value,
                    measurement.timestamp,
                    measurement.series_id.0,
                    measurement.id.0
                ],
            )
            .map_err(StorageError::from_sqlite)?;
        Ok(changed > 0)
    }

    fn delete_measurement(&self, id: MeasurementId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM measurements WHERE id = ?", params![id.0])?;
        Ok(removed > 0)
    }

    fn count_measurements(&self) -> StorageResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StorageError::Corruption(format!("negative row count {}", count)))
    }

    fn find_user(&self, username: &str) -> StorageResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?",
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> StorageResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE id = ?",
                params![id.0],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn insert_user(&self, user: &NewUser) -> StorageResult<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?, ?)",
            params![user.username, user.password_hash],
        )
        .map_err(StorageError::from_sqlite)?;

        Ok(User {
            id: UserId(conn.last_insert_rowid()),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
        })
    }

    fn update_password(&self, id: UserId, password_hash: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![password_hash, id.0],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_series(name: &str, min: f64, max: f64) -> NewSeries {
        NewSeries {
            name: name.to_string(),
            min_value: min,
            max_value: max,
            color: "#000000".to_string(),
        }
    }

    fn new_measurement(series_id: SeriesId, value: f64, timestamp: i64) -> NewMeasurement {
        NewMeasurement {
            value,
            timestamp,
            series_id,
        }
    }

    #[test]
    fn test_series_round_trip() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let created = repo.insert_series(&new_series("Temp", -20.0, 50.0)).unwrap();

        let fetched = repo.get_series(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(repo.find_series_by_name("Temp").unwrap(), Some(created));
        assert_eq!(repo.find_series_by_name("temp").unwrap(), None);
    }

    #[test]
    fn test_duplicate_series_name_is_constraint_error() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.insert_series(&new_series("Temp", 0.0, 1.0)).unwrap();

        let err = repo.insert_series(&new_series("Temp", 0.0, 1.0)).unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_check_constraint_rejects_inverted_bounds() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = repo.insert_series(&new_series("Bad", 5.0, 1.0)).unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_foreign_key_rejects_orphan_measurement() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = repo
            .insert_measurement(&new_measurement(SeriesId(99), 1.0, 0))
            .unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_cascade_delete_removes_measurements() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let temp = repo.insert_series(&new_series("Temp", -20.0, 50.0)).unwrap();
        let hum = repo.insert_series(&new_series("Humidity", 0.0, 100.0)).unwrap();

        for i in 0..5 {
            repo.insert_measurement(&new_measurement(temp.id, i as f64, i)).unwrap();
        }
        repo.insert_measurement(&new_measurement(hum.id, 40.0, 1)).unwrap();

        assert_eq!(repo.delete_series_cascade(temp.id).unwrap(), Some(5));
        assert_eq!(repo.get_series(temp.id).unwrap(), None);
        assert_eq!(repo.count_measurements().unwrap(), 1);

        let remaining = repo
            .list_measurements(&MeasurementQuery::new().series(temp.id))
            .unwrap();
        assert!(remaining.is_empty());

        assert_eq!(repo.delete_series_cascade(temp.id).unwrap(), None);
    }

    #[test]
    fn test_failed_cascade_leaves_state_intact() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let temp = repo.insert_series(&new_series("Temp", -20.0, 50.0)).unwrap();
        for i in 0..3 {
            repo.insert_measurement(&new_measurement(temp.id, 1.0, i)).unwrap();
        }

        // Fail the second statement of the cascade, after measurements are gone
        repo.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER refuse_series_delete BEFORE DELETE ON series
                 BEGIN SELECT RAISE(ABORT, 'storage unavailable'); END;",
            )
            .unwrap();

        assert!(repo.delete_series_cascade(temp.id).is_err());
        assert!(repo.get_series(temp.id).unwrap().is_some());
        assert_eq!(repo.count_measurements().unwrap(), 3);
    }

    #[test]
    fn test_list_measurements_filters_and_orders() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.insert_series(&new_series("A", 0.0, 100.0)).unwrap();
        let b = repo.insert_series(&new_series("B", 0.0, 100.0)).unwrap();

        repo.insert_measurement(&new_measurement(a.id, 1.0, 100)).unwrap();
        repo.insert_measurement(&new_measurement(b.id, 2.0, 200)).unwrap();
        repo.insert_measurement(&new_measurement(a.id, 3.0, 300)).unwrap();
        repo.insert_measurement(&new_measurement(b.id, 4.0, 400)).unwrap();

        let all = repo.list_measurements(&MeasurementQuery::new()).unwrap();
        let timestamps: Vec<i64> = all.iter().map(|m| m.timestamp).collect();
        assert_eq!(timestamps, vec![400, 300, 200, 100]);
        assert_eq!(all[0].series_name, "B");

        let window = repo
            .list_measurements(
                &MeasurementQuery::new()
                    .start(200)
                    .end(300)
                    .order(SortOrder::Ascending),
            )
            .unwrap();
        let timestamps: Vec<i64> = window.iter().map(|m| m.timestamp).collect();
        assert_eq!(timestamps, vec![200, 300]);

        let only_a = repo
            .list_measurements(&MeasurementQuery::new().series(a.id))
            .unwrap();
        assert!(only_a.iter().all(|m| m.series_id == a.id));
        assert_eq!(only_a.len(), 2);
    }

    #[test]
    fn test_measurement_extent() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.insert_series(&new_series("A", 0.0, 100.0)).unwrap();
        assert_eq!(repo.measurement_extent(a.id).unwrap(), None);

        repo.insert_measurement(&new_measurement(a.id, 12.0, 1)).unwrap();
        repo.insert_measurement(&new_measurement(a.id, 70.0, 2)).unwrap();
        assert_eq!(repo.measurement_extent(a.id).unwrap(), Some((12.0, 70.0)));
    }

    #[test]
    fn test_users_and_password_update() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let user = repo
            .insert_user(&NewUser {
                username: "admin".to_string(),
                password_hash: "h1".to_string(),
            })
            .unwrap();

        assert!(repo.update_password(user.id, "h2").unwrap());
        let stored = repo.find_user("admin").unwrap().unwrap();
        assert_eq!(stored.password_hash, "h2");
        assert!(!repo.update_password(UserId(999), "h").unwrap());
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("gaugeboard.db");

        {
            let repo = SqliteRepository::open(&path, Duration::from_millis(500)).unwrap();
            repo.insert_series(&new_series("Pressure", 900.0, 1100.0)).unwrap();
        }

        let repo = SqliteRepository::open(&path, Duration::from_millis(500)).unwrap();
        let series = repo.list_series().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "Pressure");
        assert_eq!(repo.location(), &DatabaseLocation::File(path));
    }

    #[test]
    fn test_location_from_config() {
        assert_eq!(DatabaseLocation::from_config(":memory:"), DatabaseLocation::Memory);
        assert_eq!(
            DatabaseLocation::from_config("data/db.sqlite"),
            DatabaseLocation::File(PathBuf::from("data/db.sqlite"))
        );
    }
}
