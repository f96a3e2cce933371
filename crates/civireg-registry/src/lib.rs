// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use civireg_core::RegistryError;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;

mod directory;
mod households;
mod schema;

pub use directory::{MIN_SEARCH_LEN, SEARCH_PAGE_SIZE};
pub use households::{
    HouseholdPage, HouseholdStatistics, HouseholdSummary, ListFilters, ListParams,
    DEFAULT_PER_PAGE, MAX_PER_PAGE,
};

pub const CRATE_NAME: &str = "civireg-registry";

/// SQLite-backed registry: the resident directory plus the household
/// membership engine. Every mutating operation runs read-validate-write
/// inside one immediate transaction, so invariant checks always see the
/// current head+member set and two racing writers serialize instead of
/// both passing validation against a stale snapshot.
pub struct Registry {
    conn: Mutex<Connection>,
}

impl Registry {
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self, RegistryError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, RegistryError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(storage_err)?;
        conn.execute_batch(schema::SCHEMA).map_err(storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RegistryError::storage("connection mutex poisoned"))?;
        f(&conn)
    }

    /// Runs `f` inside one immediate transaction; commits only on success.
    pub(crate) fn mutate<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| RegistryError::storage("connection mutex poisoned"))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_err)?;
        let out = f(&tx)?;
        tx.commit().map_err(storage_err)?;
        Ok(out)
    }
}

pub(crate) fn storage_err(err: rusqlite::Error) -> RegistryError {
    RegistryError::storage(err.to_string())
}

/// Allocates the next opaque id for `prefix` from the persisted counter.
/// Must run inside the caller's transaction so the increment commits (or
/// rolls back) with the row that consumes it.
pub(crate) fn next_id(
    tx: &rusqlite::Transaction<'_>,
    prefix: &str,
) -> Result<String, RegistryError> {
    let value: i64 = tx
        .query_row(
            "SELECT value FROM registry_meta WHERE key = 'next_id'",
            [],
            |row| row.get(0),
        )
        .map_err(storage_err)?;
    tx.execute(
        "UPDATE registry_meta SET value = value + 1 WHERE key = 'next_id'",
        [],
    )
    .map_err(storage_err)?;
    Ok(format!("{prefix}-{value:08x}"))
}

/// Escapes LIKE metacharacters and wraps the lowercased term in wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
