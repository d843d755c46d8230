use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

use crate::cache::{CacheResult, SearchCacheStore, expiry_after};
use crate::clock::{Clock, SystemClock};
use crate::models::SearchError;
use crate::sqlite::migrations::{SqliteMigration, current_schema_version, migration, migrations};

const MIGRATIONS_TABLE: &str = "instasearch_schema_migrations";

/// Cache entries persisted in a SQLite database so they survive restarts and
/// can be shared between processes. Each operation opens its own connection.
pub struct SqliteSearchCache {
    database_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SqliteSearchCache {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self::with_clock(database_path, Arc::new(SystemClock))
    }

    pub fn with_clock(database_path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            database_path: database_path.into(),
            clock,
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn planned_migrations(&self, from_version: i64) -> Vec<&'static SqliteMigration> {
        migrations()
            .iter()
            .filter(|entry| entry.version > from_version)
            .collect()
    }

    pub fn migrate_to_latest(&self) -> CacheResult<()> {
        self.apply_migration(current_schema_version())
    }

    pub fn current_version(&self) -> CacheResult<i64> {
        self.with_connection("current_version", |connection| {
            ensure_migrations_table(connection)?;
            read_current_version(connection)
        })
    }

    pub fn apply_migration(&self, target_version: i64) -> CacheResult<()> {
        if target_version < 0 || target_version > current_schema_version() {
            return Err(SearchError::storage(
                "apply_migration",
                format!("invalid migration target version '{target_version}'"),
            ));
        }

        if target_version > 0 && migration(target_version).is_none() {
            return Err(SearchError::storage(
                "apply_migration",
                format!("migration version '{target_version}' is not defined"),
            ));
        }

        self.with_connection("apply_migration", |connection| {
            ensure_migrations_table(connection)?;
            let current_version = read_current_version(connection)?;

            if target_version > current_version {
                for version in (current_version + 1)..=target_version {
                    apply_up_migration(connection, defined_migration(version)?)?;
                }
            } else {
                for version in ((target_version + 1)..=current_version).rev() {
                    apply_down_migration(connection, defined_migration(version)?)?;
                }
            }

            Ok(())
        })
    }

    /// Deletes every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let now = to_unix_seconds(self.clock.now());
        self.with_connection("purge_expired", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "DELETE FROM search_response_cache WHERE expires_at_unix <= ?1",
                [now?],
            )
        })
    }

    fn with_connection<T>(
        &self,
        operation_name: &str,
        operation: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> CacheResult<T> {
        let mut connection = open_connection(&self.database_path)
            .map_err(|error| storage_error(operation_name, error))?;
        operation(&mut connection).map_err(|error| storage_error(operation_name, error))
    }
}

impl SearchCacheStore for SqliteSearchCache {
    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = to_unix_seconds(self.clock.now());
        let stored = self.with_connection("get", |connection| {
            ensure_schema_ready(connection)?;
            let now = now?;
            let row: Option<(String, i64)> = connection
                .query_row(
                    "SELECT response_json, expires_at_unix FROM search_response_cache WHERE cache_key = ?1",
                    [key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((_, expires_at)) if now >= expires_at => {
                    connection.execute(
                        "DELETE FROM search_response_cache WHERE cache_key = ?1 AND expires_at_unix <= ?2",
                        (key, now),
                    )?;
                    Ok(None)
                }
                Some((response_json, _)) => Ok(Some(response_json)),
                None => Ok(None),
            }
        })?;

        stored
            .map(|response_json| {
                serde_json::from_str(&response_json).map_err(|error| {
                    SearchError::storage("get", format!("cached response is not valid JSON: {error}"))
                })
            })
            .transpose()
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        let now = self.clock.now();
        let stored_at = to_unix_seconds(now);
        let expires_at = to_unix_seconds(expiry_after(now, ttl)?);
        let response_json = value.to_string();

        self.with_connection("set", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "
INSERT INTO search_response_cache (
    cache_key, response_json, stored_at_unix, expires_at_unix
) VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(cache_key) DO UPDATE SET
    response_json = excluded.response_json,
    stored_at_unix = excluded.stored_at_unix,
    expires_at_unix = excluded.expires_at_unix
",
                (key, response_json.as_str(), stored_at?, expires_at?),
            )?;
            Ok(())
        })
    }
}

fn open_connection(database_path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = database_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|error| {
            storage_error_sqlite(&format!(
                "failed to create database directory '{}': {error}",
                parent.display()
            ))
        })?;
    }
    Connection::open(database_path)
}

fn ensure_migrations_table(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(&format!(
        "
CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at_unix INTEGER NOT NULL
);
"
    ))?;
    Ok(())
}

fn ensure_schema_ready(connection: &Connection) -> rusqlite::Result<()> {
    ensure_migrations_table(connection)?;
    let version = read_current_version(connection)?;
    if version <= 0 {
        return Err(storage_error_sqlite(
            "database schema is not initialized; apply migrations before cache operations",
        ));
    }
    Ok(())
}

fn read_current_version(connection: &Connection) -> rusqlite::Result<i64> {
    connection.query_row(
        &format!("SELECT COALESCE(MAX(version), 0) FROM {MIGRATIONS_TABLE}"),
        [],
        |row| row.get(0),
    )
}

fn defined_migration(version: i64) -> rusqlite::Result<&'static SqliteMigration> {
    migration(version).ok_or_else(|| {
        storage_error_sqlite(&format!("migration version '{version}' is not defined"))
    })
}

fn apply_up_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.up_sql)?;
    transaction.execute(
        &format!(
            "INSERT INTO {MIGRATIONS_TABLE} (version, name, applied_at_unix)
             VALUES (?1, ?2, strftime('%s', 'now'))"
        ),
        (migration.version, migration.name),
    )?;
    transaction.commit()?;
    Ok(())
}

fn apply_down_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.down_sql)?;
    transaction.execute(
        &format!("DELETE FROM {MIGRATIONS_TABLE} WHERE version = ?1"),
        [migration.version],
    )?;
    transaction.commit()?;
    Ok(())
}

fn storage_error(operation: &str, error: rusqlite::Error) -> SearchError {
    SearchError::storage(operation, format!("sqlite: {error}"))
}

fn storage_error_sqlite(message: &str) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(message.to_string())))
}

fn to_unix_seconds(value: SystemTime) -> rusqlite::Result<i64> {
    let duration = value.duration_since(UNIX_EPOCH).map_err(|error| {
        storage_error_sqlite(&format!("time before unix epoch is not supported: {error}"))
    })?;
    i64::try_from(duration.as_secs())
        .map_err(|_| storage_error_sqlite("unix timestamp seconds exceed i64 range"))
}
