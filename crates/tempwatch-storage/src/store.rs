use std::path::Path;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use thiserror::Error;

use tempwatch_weather::types::TemperatureSample;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// One persisted daily reading.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRecord {
    pub description: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Narrow persistence boundary consumed by the app.
pub trait Storage: Send + Sync {
    /// Persist one resolved batch for the given day. Re-running a batch for
    /// the same day overwrites the previous readings.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails; the batch is applied
    /// atomically.
    fn save_daily(
        &self,
        date: NaiveDate,
        samples: &[TemperatureSample],
    ) -> Result<(), StorageError>;

    /// Every persisted reading, oldest day first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    fn all(&self) -> Result<Vec<TemperatureRecord>, StorageError>;
}

/// Local SQLite storage for daily temperatures.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create the database.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be opened or the schema
    /// cannot be initialized.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// In-memory database, used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the schema cannot be initialized.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.lock().execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_temperature (
                description TEXT NOT NULL,
                day TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (description, day)
            );",
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn save_daily(
        &self,
        date: NaiveDate,
        samples: &[TemperatureSample],
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for sample in samples {
            tx.execute(
                "INSERT OR REPLACE INTO daily_temperature (description, day, value)
                 VALUES (?1, ?2, ?3)",
                params![sample.description(), date, sample.value],
            )?;
        }
        tx.commit()?;

        tracing::debug!(rows = samples.len(), %date, "daily readings saved");
        Ok(())
    }

    fn all(&self) -> Result<Vec<TemperatureRecord>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT description, day, value FROM daily_temperature
             ORDER BY day, description",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TemperatureRecord {
                description: row.get(0)?,
                date: row.get(1)?,
                value: row.get(2)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempwatch_weather::types::{Coordinate, Location};

    fn sample(description: &str, value: f64) -> TemperatureSample {
        TemperatureSample {
            location: Arc::new(Location {
                description: description.into(),
                coordinates: vec![Coordinate {
                    latitude: 0.0,
                    longitude: 0.0,
                }],
            }),
            value,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn round_trips_a_batch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("temps.db")).unwrap();

        storage
            .save_daily(
                date(2024, 5, 14),
                &[sample("North branch", 12.5), sample("East branch", 14.0)],
            )
            .unwrap();

        let records = storage.all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "East branch");
        assert_eq!(records[0].value, 14.0);
        assert_eq!(records[0].date, date(2024, 5, 14));
    }

    #[test]
    fn rerunning_a_day_overwrites_previous_readings() {
        let storage = SqliteStorage::open_in_memory().unwrap();

        storage
            .save_daily(date(2024, 5, 14), &[sample("North branch", 10.0)])
            .unwrap();
        storage
            .save_daily(date(2024, 5, 14), &[sample("North branch", 11.0)])
            .unwrap();

        let records = storage.all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 11.0);
    }

    #[test]
    fn distinct_days_accumulate() {
        let storage = SqliteStorage::open_in_memory().unwrap();

        storage
            .save_daily(date(2024, 5, 13), &[sample("North branch", 9.0)])
            .unwrap();
        storage
            .save_daily(date(2024, 5, 14), &[sample("North branch", 10.0)])
            .unwrap();

        assert_eq!(storage.all().unwrap().len(), 2);
    }
}
