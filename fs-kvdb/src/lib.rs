use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use data_error::{QpatchError, Result};

/*
Qoder's `state.vscdb` is a plain SQLite database with a single
key-value table:

    CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)

Patching it is an upsert per entry: try UPDATE, fall back to INSERT
when no row matched. One bad entry never aborts the batch.
*/

/// Outcome of one `upsert` batch, key by key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub updated: Vec<String>,
    pub inserted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Apply `entries` to the store at `store_path` inside one transaction.
///
/// Entries are processed in order; per-entry driver errors are recorded
/// under `failed` and the batch continues. A store that is missing or
/// not openable as SQLite yields [`QpatchError::StoreUnavailable`]
/// without touching the file.
pub fn upsert(
    store_path: impl AsRef<Path>,
    entries: &[(String, String)],
) -> Result<PatchReport> {
    let store_path = store_path.as_ref();
    let mut conn = open_store(store_path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;

    let tx = conn.transaction()?;
    let mut report = PatchReport::default();

    for (key, value) in entries {
        let result = tx
            .execute(
                "UPDATE ItemTable SET value = ?1 WHERE key = ?2",
                params![value, key],
            )
            .and_then(|changed| {
                if changed == 0 {
                    tx.execute(
                        "INSERT OR REPLACE INTO ItemTable (key, value) \
                         VALUES (?1, ?2)",
                        params![key, value],
                    )
                    .map(|_| false)
                } else {
                    Ok(true)
                }
            });

        match result {
            Ok(true) => report.updated.push(key.clone()),
            Ok(false) => report.inserted.push(key.clone()),
            Err(err) => {
                log::warn!("failed to patch key {key}: {err}");
                report.failed.push((key.clone(), err.to_string()));
            }
        }
    }

    tx.commit()?;
    Ok(report)
}

/// Read a single value without mutating anything. An absent store,
/// absent key, or unreadable row is `None`, never an error.
pub fn read_value(store_path: impl AsRef<Path>, key: &str) -> Option<String> {
    let store_path = store_path.as_ref();
    let conn =
        open_store(store_path, OpenFlags::SQLITE_OPEN_READ_ONLY).ok()?;
    conn.query_row(
        "SELECT value FROM ItemTable WHERE key = ?1",
        params![key],
        |row| row.get::<_, SqlValue>(0),
    )
    .optional()
    .ok()
    .flatten()
    .and_then(|value| match value {
        SqlValue::Text(text) => Some(text),
        SqlValue::Blob(bytes) => {
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => None,
    })
}

fn open_store(store_path: &Path, flags: OpenFlags) -> Result<Connection> {
    // No CREATE flag: a missing store must stay missing.
    if !store_path.exists() {
        return Err(QpatchError::StoreUnavailable(format!(
            "{} does not exist",
            store_path.display()
        )));
    }

    let unavailable = |err: rusqlite::Error| {
        QpatchError::StoreUnavailable(format!(
            "{}: {err}",
            store_path.display()
        ))
    };

    let conn = Connection::open_with_flags(store_path, flags)
        .map_err(unavailable)?;
    // SQLite reads the file lazily; probe the header now so a file
    // that is not a database surfaces as unavailable, not as a string
    // of per-entry failures.
    conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
        .map_err(unavailable)?;

    Ok(conn)
}
